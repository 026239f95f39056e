//! chordpad: chord and arpeggiator keypad controller driven from the terminal

mod config;

use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result};
use chordpad_core::{Engine, NoteSink, Outputs};
use chordpad_services::{
    COMMAND_HELP, ChannelInput, ConsoleDisplay, ConsoleLeds, LogNoteSink, MidiNoteOut, run,
    spawn_line_reader,
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chordpad")]
#[command(about = "Chord and arpeggiator keypad controller", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/chordpad/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MIDI output port name substring
    #[arg(short, long)]
    port: Option<String>,

    /// Zero-based MIDI channel
    #[arg(long)]
    channel: Option<u8>,

    /// List MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Log notes instead of sending MIDI
    #[arg(long)]
    dry_run: bool,

    /// Seed for the random arpeggio order
    #[arg(long)]
    seed: Option<u64>,

    /// Initial tempo
    #[arg(long)]
    bpm: Option<u16>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("chordpad=debug".parse()?)
            .add_directive("chordpad_core=debug".parse()?)
            .add_directive("chordpad_services=debug".parse()?))
        .init();

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.midi.port = Some(port);
    }
    if let Some(channel) = cli.channel {
        config.midi.channel = channel;
    }
    if let Some(seed) = cli.seed {
        config.engine.seed = Some(seed);
    }
    if let Some(bpm) = cli.bpm {
        config.engine.bpm = bpm;
    }

    if cli.list_ports {
        let ports = MidiNoteOut::list_ports(&config.midi.client_name)?;
        if ports.is_empty() {
            println!("No MIDI output ports");
        }
        for (i, name) in ports.iter().enumerate() {
            println!("{i}: {name}");
        }
        return Ok(());
    }

    tracing::info!("Starting chordpad");

    let mut midi = if cli.dry_run {
        None
    } else {
        let out = MidiNoteOut::connect(
            &config.midi.client_name,
            config.midi.port.as_deref(),
            config.midi.channel,
        )
        .context("opening MIDI output (use --dry-run to run without one)")?;
        println!("MIDI out: {} (channel {})", out.port_name(), config.midi.channel + 1);
        Some(out)
    };
    let mut log_sink = LogNoteSink::default();
    let notes: &mut dyn NoteSink = match midi.as_mut() {
        Some(out) => out,
        None => &mut log_sink,
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let (mut input, tx) = ChannelInput::new(shutdown.clone());
    spawn_line_reader(BufReader::new(std::io::stdin()), tx).context("starting input reader")?;
    println!("{COMMAND_HELP}");

    let mut engine = Engine::new(&config.engine.engine_config());
    let mut leds = ConsoleLeds::new();
    let mut display = ConsoleDisplay::new();
    let mut out = Outputs {
        notes,
        visual: &mut leds,
        text: &mut display,
    };

    let tick = Duration::from_millis(config.engine.tick_ms.max(1));
    run(&mut engine, &mut input, &mut out, tick, &shutdown);

    if let Some(midi) = midi {
        midi.close();
    }
    Ok(())
}
