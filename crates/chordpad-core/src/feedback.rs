//! Indicator colours and display labels

use crate::io::Rgb;
use crate::tuning::{ArpMode, ChordQuality, TuningState};

pub const KEY_IDLE: Rgb = Rgb(255, 255, 0);
pub const KEY_SOUNDING: Rgb = Rgb(0, 255, 0);
pub const PULSE_HIGHLIGHT: Rgb = Rgb(255, 255, 255);

pub fn inversion_color(inversion: u8) -> Rgb {
    let brightness = [30, 100, 255][inversion.min(2) as usize];
    Rgb(brightness, 0, 0)
}

pub fn octave_color(shift: i8) -> Rgb {
    match shift {
        -1 => Rgb(0, 0, 50),
        0 => Rgb(0, 0, 150),
        _ => Rgb(0, 0, 255),
    }
}

pub fn arp_color(mode: ArpMode) -> Rgb {
    match mode {
        ArpMode::Off => Rgb(30, 10, 0),
        mode => {
            let brightness = [10, 50, 150, 255][mode.index()];
            Rgb(brightness, brightness / 2, 0)
        }
    }
}

pub fn latch_color(latch: bool) -> Rgb {
    if latch { Rgb(255, 0, 255) } else { Rgb(100, 0, 100) }
}

pub fn quality_color(quality: ChordQuality) -> Rgb {
    match quality {
        ChordQuality::Major => Rgb(0, 30, 0),
        ChordQuality::Minor => Rgb(0, 100, 0),
        ChordQuality::Diminished => Rgb(0, 255, 0),
    }
}

pub fn chord_label(notes: &[u8]) -> String {
    let notes: Vec<String> = notes.iter().map(|note| note.to_string()).collect();
    format!("Chord: {}", notes.join(" "))
}

pub fn status_label(tuning: &TuningState) -> String {
    format!("Key: +{} | Oct: {}", tuning.key_offset(), tuning.octave_shift())
}

pub fn inversion_label(tuning: &TuningState) -> String {
    format!(
        "Inv: {} | Lt: {} | {}",
        tuning.inversion(),
        u8::from(tuning.latch()),
        tuning.chord_quality().name()
    )
}

pub fn arp_label(tuning: &TuningState) -> String {
    format!("Arp: {} | BPM: {}", tuning.arp_mode().name(), tuning.bpm())
}
