//! Boundary traits for the keypad, MIDI transport, LEDs and display

/// Velocity of every note-on
pub const VELOCITY_ON: u8 = 120;
/// Velocity of every note-off
pub const VELOCITY_OFF: u8 = 0;
/// Keys 0-6 play chords
pub const MUSICAL_KEYS: usize = 7;
/// Musical keys plus the five control keys
pub const KEY_COUNT: usize = 12;

/// A key press or release from the keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: usize,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn pressed(key: usize) -> Self {
        Self { key, pressed: true }
    }

    pub fn released(key: usize) -> Self {
        Self { key, pressed: false }
    }
}

/// Control keys, numbered by the indicator slot they own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Inversion = 7,
    Octave = 8,
    ArpMode = 9,
    Latch = 10,
    ChordQuality = 11,
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Inversion,
        Control::Octave,
        Control::ArpMode,
        Control::Latch,
        Control::ChordQuality,
    ];

    pub fn slot(self) -> usize {
        self as usize
    }
}

/// What a key index means on this keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Musical(usize),
    Control(Control),
}

impl Key {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0..MUSICAL_KEYS => Some(Self::Musical(index)),
            7 => Some(Self::Control(Control::Inversion)),
            8 => Some(Self::Control(Control::Octave)),
            9 => Some(Self::Control(Control::ArpMode)),
            10 => Some(Self::Control(Control::Latch)),
            11 => Some(Self::Control(Control::ChordQuality)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// The four text regions of the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LabelRegion {
    Chord,
    Status,
    Inversion,
    Arp,
}

impl LabelRegion {
    pub const ALL: [LabelRegion; 4] = [
        LabelRegion::Chord,
        LabelRegion::Status,
        LabelRegion::Inversion,
        LabelRegion::Arp,
    ];
}

/// Receives MIDI notes. Fire-and-forget: delivery failures belong to the transport.
pub trait NoteSink {
    fn note_on(&mut self, pitch: u8, velocity: u8);
    fn note_off(&mut self, pitch: u8, velocity: u8);
}

/// Per-key RGB indicators
pub trait VisualSink {
    fn set_indicator(&mut self, slot: usize, color: Rgb);
}

/// Text display
pub trait TextSink {
    fn set_label(&mut self, region: LabelRegion, text: &str);
}

/// Keypad and encoder, polled once per loop iteration
pub trait InputSource {
    /// Key events that arrived since the last poll, oldest first
    fn poll_keys(&mut self) -> Vec<KeyEvent>;
    /// Absolute encoder position
    fn encoder_position(&self) -> i32;
    fn encoder_pressed(&self) -> bool;
}

/// Output collaborators handed to every engine call
pub struct Outputs<'a> {
    pub notes: &'a mut dyn NoteSink,
    pub visual: &'a mut dyn VisualSink,
    pub text: &'a mut dyn TextSink,
}
