//! Log-backed stand-ins for the keypad LEDs and the display

use std::collections::HashMap;

use chordpad_core::{KEY_COUNT, LabelRegion, Rgb, TextSink, VisualSink};
use tracing::{debug, info, warn};

/// Key indicators rendered to the log. Only changes are reported.
#[derive(Debug, Default)]
pub struct ConsoleLeds {
    colors: [Option<Rgb>; KEY_COUNT],
}

impl ConsoleLeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self, slot: usize) -> Option<Rgb> {
        self.colors.get(slot).copied().flatten()
    }
}

impl VisualSink for ConsoleLeds {
    fn set_indicator(&mut self, slot: usize, color: Rgb) {
        let Some(current) = self.colors.get_mut(slot) else {
            warn!(slot, "indicator slot out of range");
            return;
        };
        if *current == Some(color) {
            return;
        }
        *current = Some(color);
        let Rgb(r, g, b) = color;
        debug!(slot, "led #{r:02x}{g:02x}{b:02x}");
    }
}

/// Display regions rendered to the log. Only changes are reported.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    labels: HashMap<LabelRegion, String>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&self, region: LabelRegion) -> Option<&str> {
        self.labels.get(&region).map(String::as_str)
    }
}

impl TextSink for ConsoleDisplay {
    fn set_label(&mut self, region: LabelRegion, text: &str) {
        if self.label(region) == Some(text) {
            return;
        }
        info!(region = ?region, "{text}");
        self.labels.insert(region, text.to_string());
    }
}
