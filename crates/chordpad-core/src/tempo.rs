//! Tempo clock: step timing and the decorative tempo pulse

use std::time::{Duration, Instant};

use crate::tuning::TuningState;

/// How long the pulse highlight stays lit
pub const PULSE_DURATION: Duration = Duration::from_millis(50);

/// Arpeggio step length: two steps per beat
pub fn step_interval(bpm: u16) -> Duration {
    Duration::from_secs_f64(60.0 / (bpm.max(1) as f64 * 2.0))
}

/// One beat at the given tempo
pub fn beat_interval(bpm: u16) -> Duration {
    Duration::from_secs_f64(60.0 / bpm.max(1) as f64)
}

/// Indicator change requested by the pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseAction {
    /// Light the highlight colour
    Highlight,
    /// Return to the arp-mode colour
    Restore,
}

/// Beat pulse shown on the arp-mode indicator while an arp mode is active.
/// Purely visual; never touches note scheduling.
#[derive(Debug, Clone, Default)]
pub struct TempoPulse {
    last_pulse: Option<Instant>,
    lit: bool,
}

impl TempoPulse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn tick(&mut self, now: Instant, tuning: &TuningState) -> Option<PulseAction> {
        if !tuning.arp_mode().is_active() {
            self.lit = false;
            return None;
        }

        let elapsed = self.last_pulse.map(|at| now.saturating_duration_since(at));
        match elapsed {
            Some(elapsed) if elapsed < tuning.beat_interval() => {
                if self.lit && elapsed >= PULSE_DURATION {
                    self.lit = false;
                    Some(PulseAction::Restore)
                } else {
                    None
                }
            }
            _ => {
                self.last_pulse = Some(now);
                self.lit = true;
                Some(PulseAction::Highlight)
            }
        }
    }
}
