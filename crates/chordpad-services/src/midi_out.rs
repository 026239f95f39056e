//! MIDI note output through the host MIDI system

use chordpad_core::NoteSink;
use midir::{MidiOutput, MidiOutputConnection};
use thiserror::Error;
use tracing::{debug, info, warn};

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;

#[derive(Debug, Error)]
pub enum MidiOutError {
    #[error("Failed to initialise MIDI output: {0}")]
    Init(#[from] midir::InitError),
    #[error("No MIDI output ports found")]
    NoPorts,
    #[error("No MIDI output port matching {0:?}")]
    PortNotFound(String),
    #[error("Failed to connect to MIDI port: {0}")]
    Connect(String),
    #[error("Invalid MIDI channel: {0} (expected 0-15)")]
    InvalidChannel(u8),
}

/// Three-byte channel voice message
pub fn note_message(status: u8, channel: u8, pitch: u8, velocity: u8) -> [u8; 3] {
    [status | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F]
}

/// Note sink writing to one MIDI output port on a single channel
pub struct MidiNoteOut {
    connection: MidiOutputConnection,
    channel: u8,
    port_name: String,
}

impl MidiNoteOut {
    /// List available output port names
    pub fn list_ports(client_name: &str) -> Result<Vec<String>, MidiOutError> {
        let midi_out = MidiOutput::new(client_name)?;
        Ok(midi_out
            .ports()
            .iter()
            .filter_map(|port| midi_out.port_name(port).ok())
            .collect())
    }

    /// Connect to the first port whose name contains `port_filter`, or the
    /// first port when no filter is given.
    pub fn connect(
        client_name: &str,
        port_filter: Option<&str>,
        channel: u8,
    ) -> Result<Self, MidiOutError> {
        if channel > 15 {
            return Err(MidiOutError::InvalidChannel(channel));
        }

        let midi_out = MidiOutput::new(client_name)?;
        let ports = midi_out.ports();
        let port = match port_filter {
            Some(filter) => ports
                .iter()
                .find(|port| {
                    midi_out
                        .port_name(port)
                        .map(|name| name.contains(filter))
                        .unwrap_or(false)
                })
                .ok_or_else(|| MidiOutError::PortNotFound(filter.to_string()))?,
            None => ports.first().ok_or(MidiOutError::NoPorts)?,
        };
        let port_name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let connection = midi_out
            .connect(port, "chordpad-out")
            .map_err(|e| MidiOutError::Connect(e.to_string()))?;

        info!(port = %port_name, channel, "MIDI output connected");
        Ok(Self {
            connection,
            channel,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn close(self) {
        self.connection.close();
        info!("MIDI output closed");
    }

    fn send(&mut self, message: [u8; 3]) {
        if let Err(err) = self.connection.send(&message) {
            warn!(%err, ?message, "MIDI send failed");
        }
    }
}

impl NoteSink for MidiNoteOut {
    fn note_on(&mut self, pitch: u8, velocity: u8) {
        self.send(note_message(NOTE_ON, self.channel, pitch, velocity));
    }

    fn note_off(&mut self, pitch: u8, velocity: u8) {
        self.send(note_message(NOTE_OFF, self.channel, pitch, velocity));
    }
}

/// Dry-run sink: notes only go to the log
#[derive(Debug, Default)]
pub struct LogNoteSink {
    sounding: usize,
}

impl LogNoteSink {
    /// Note-ons not yet matched by a note-off
    pub fn sounding(&self) -> usize {
        self.sounding
    }
}

impl NoteSink for LogNoteSink {
    fn note_on(&mut self, pitch: u8, velocity: u8) {
        self.sounding += 1;
        debug!(pitch, velocity, sounding = self.sounding, "note on");
    }

    fn note_off(&mut self, pitch: u8, velocity: u8) {
        self.sounding = self.sounding.saturating_sub(1);
        debug!(pitch, velocity, sounding = self.sounding, "note off");
    }
}
