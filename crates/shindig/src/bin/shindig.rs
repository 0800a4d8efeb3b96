//! shindig binary
//!
//! Three modes: enumerate MIDI ports, listen for chords on an input, or
//! loop the notes of a folder of MIDI files as an arpeggio on an output.
//! Ctrl+C (or SIGTERM) stops either loop cleanly, releasing the port.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use midi_gate::{list_input_ports, list_output_ports, notes_from_folder, ActiveMidiOutput};
use shindig::{run_listener, Sequencer};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "shindig",
    version,
    about = "Live MIDI chord listening and arpeggio playback"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available MIDI input and output ports
    Ports,

    /// Track held notes on a MIDI input and report detected chords
    Listen {
        /// Input port name (substring match)
        #[arg(long, env = "SHINDIG_PORT")]
        port: String,
    },

    /// Loop the notes of a folder of MIDI files as an arpeggio
    Play {
        /// Output port name (substring match)
        #[arg(long, env = "SHINDIG_PORT")]
        port: String,

        /// Folder of .mid/.midi files to draw notes from
        #[arg(long, env = "SHINDIG_FOLDER")]
        folder: PathBuf,

        /// Tempo in beats per minute
        #[arg(long, env = "SHINDIG_BPM", default_value_t = 120.0)]
        bpm: f64,

        /// Output MIDI channel
        #[arg(long, env = "SHINDIG_CHANNEL", default_value_t = 3,
              value_parser = clap::value_parser!(u8).range(0..=15))]
        channel: u8,

        /// Note velocity
        #[arg(long, env = "SHINDIG_VELOCITY", default_value_t = 64,
              value_parser = clap::value_parser!(u8).range(0..=127))]
        velocity: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Command::Ports => ports(),
        Command::Listen { port } => listen(port).await,
        Command::Play {
            port,
            folder,
            bpm,
            channel,
            velocity,
        } => play(port, folder, bpm, channel, velocity).await,
    }
}

fn ports() -> Result<()> {
    println!("Available MIDI Input Ports:");
    let inputs = list_input_ports()?;
    if inputs.is_empty() {
        println!("  (none)");
    }
    for port in inputs {
        println!("  [{}] {}", port.index, port.name);
    }

    println!();
    println!("Available MIDI Output Ports:");
    let outputs = list_output_ports()?;
    if outputs.is_empty() {
        println!("  (none)");
    }
    for port in outputs {
        println!("  [{}] {}", port.index, port.name);
    }

    Ok(())
}

async fn listen(port: String) -> Result<()> {
    let cancel = shutdown_token();
    let loop_cancel = cancel.clone();

    println!("Press Ctrl+C to stop.");
    tokio::task::spawn_blocking(move || run_listener(&port, &loop_cancel))
        .await
        .context("listener task panicked")??;

    println!("\nExiting MIDI listener.");
    Ok(())
}

async fn play(port: String, folder: PathBuf, bpm: f64, channel: u8, velocity: u8) -> Result<()> {
    // Validate everything before touching the port.
    let notes = notes_from_folder(&folder)?;
    info!("Total extracted notes: {}", notes.len());
    let mut sequencer = Sequencer::new(notes, bpm, channel, velocity)?;

    let output = ActiveMidiOutput::open(&port)
        .context("failed to open MIDI output (`shindig ports` lists available ports)")?;

    println!(
        "Starting arpeggio loop on MIDI channel {} at {} BPM. Press Ctrl+C to stop.",
        channel, bpm
    );

    let cancel = shutdown_token();
    let loop_cancel = cancel.clone();

    tokio::task::spawn_blocking(move || sequencer.run(&output, &loop_cancel))
        .await
        .context("playback task panicked")??;

    println!("\nArpeggio loop stopped.");
    Ok(())
}

/// A token cancelled by SIGINT (Ctrl+C) or, on unix, SIGTERM.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let signal_token = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
            }
            _ = terminate_signal() => {
                info!("Received SIGTERM, shutting down");
            }
        }
        signal_token.cancel();
    });

    token
}

async fn terminate_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
        sigterm.recv().await;
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}
