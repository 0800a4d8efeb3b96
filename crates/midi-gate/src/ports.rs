//! MIDI port enumeration and connections via ALSA (through midir).
//!
//! Ports are selected by substring match on the enumerated name, so a
//! device can be addressed as "UM-ONE" without the ALSA client/port
//! qualifiers. Connections release their port on drop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::info;

use crate::message::{encode_midi_message, parse_midi_bytes, MidiMessage};

/// Error type for MIDI operations
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("Failed to initialize MIDI: {0}")]
    InitFailed(String),

    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Information about a discovered MIDI port
#[derive(Debug, Clone)]
pub struct MidiPortInfo {
    /// Port index (for midir connection)
    pub index: usize,
    /// Port name from ALSA
    pub name: String,
}

/// A timestamped note message received from hardware
#[derive(Debug, Clone)]
pub struct TimestampedMidiMessage {
    /// Timestamp in microseconds (from midir, relative to some epoch)
    pub timestamp_us: u64,
    /// The parsed message
    pub message: MidiMessage,
}

/// List available MIDI input ports
pub fn list_input_ports() -> Result<Vec<MidiPortInfo>, MidiError> {
    let midi_in =
        MidiInput::new("shindig-scan").map_err(|e| MidiError::InitFailed(e.to_string()))?;

    let ports: Vec<MidiPortInfo> = midi_in
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(i, port)| {
            midi_in
                .port_name(port)
                .ok()
                .map(|name| MidiPortInfo { index: i, name })
        })
        .collect();

    Ok(ports)
}

/// List available MIDI output ports
pub fn list_output_ports() -> Result<Vec<MidiPortInfo>, MidiError> {
    let midi_out =
        MidiOutput::new("shindig-scan").map_err(|e| MidiError::InitFailed(e.to_string()))?;

    let ports: Vec<MidiPortInfo> = midi_out
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(i, port)| {
            midi_out
                .port_name(port)
                .ok()
                .map(|name| MidiPortInfo { index: i, name })
        })
        .collect();

    Ok(ports)
}

/// Destination for outgoing note events.
///
/// `ActiveMidiOutput` sends to hardware; tests substitute a recording sink.
pub trait EventSink: Send + Sync {
    fn send(&self, msg: &MidiMessage) -> Result<(), MidiError>;
}

/// Callback type for receiving MIDI input.
/// Must be Send + Sync because it's called from the MIDI thread.
pub type MidiInputCallback = Box<dyn Fn(TimestampedMidiMessage) + Send + Sync + 'static>;

/// Active MIDI input connection
pub struct ActiveMidiInput {
    /// Connection (dropped to close)
    connection: Option<MidiInputConnection<()>>,
    /// Port name
    pub port_name: String,
    /// Note messages received
    pub messages_received: Arc<AtomicU64>,
}

impl ActiveMidiInput {
    /// Open a MIDI input port by name pattern
    pub fn open(port_pattern: &str, callback: MidiInputCallback) -> Result<Self, MidiError> {
        let midi_in =
            MidiInput::new("shindig-in").map_err(|e| MidiError::InitFailed(e.to_string()))?;

        let ports = midi_in.ports();
        let port = ports
            .iter()
            .find(|p| {
                midi_in
                    .port_name(p)
                    .map(|n| n.contains(port_pattern))
                    .unwrap_or(false)
            })
            .ok_or_else(|| MidiError::PortNotFound(port_pattern.to_string()))?;

        let port_name = midi_in
            .port_name(port)
            .map_err(|e| MidiError::ConnectionFailed(e.to_string()))?;

        let messages_received = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&messages_received);
        let callback = Arc::new(callback);

        let connection = midi_in
            .connect(
                port,
                "shindig-input",
                move |timestamp_us, data, _| {
                    if let Some(message) = parse_midi_bytes(data) {
                        counter.fetch_add(1, Ordering::Relaxed);
                        callback(TimestampedMidiMessage {
                            timestamp_us,
                            message,
                        });
                    }
                },
                (),
            )
            .map_err(|e| MidiError::ConnectionFailed(e.to_string()))?;

        info!("Opened MIDI input: {}", port_name);

        Ok(Self {
            connection: Some(connection),
            port_name,
            messages_received,
        })
    }

    /// Close the connection
    pub fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            info!(
                "Closed MIDI input: {} ({} messages received)",
                self.port_name,
                self.messages_received.load(Ordering::Relaxed)
            );
        }
    }
}

impl Drop for ActiveMidiInput {
    fn drop(&mut self) {
        self.close();
    }
}

/// Active MIDI output connection
pub struct ActiveMidiOutput {
    /// Connection (requires mutex for send)
    connection: Mutex<Option<MidiOutputConnection>>,
    /// Port name
    pub port_name: String,
    /// Note messages sent
    pub messages_sent: AtomicU64,
}

impl ActiveMidiOutput {
    /// Open a MIDI output port by name pattern
    pub fn open(port_pattern: &str) -> Result<Self, MidiError> {
        let midi_out =
            MidiOutput::new("shindig-out").map_err(|e| MidiError::InitFailed(e.to_string()))?;

        let ports = midi_out.ports();
        let port = ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .map(|n| n.contains(port_pattern))
                    .unwrap_or(false)
            })
            .ok_or_else(|| MidiError::PortNotFound(port_pattern.to_string()))?;

        let port_name = midi_out
            .port_name(port)
            .map_err(|e| MidiError::ConnectionFailed(e.to_string()))?;

        let connection = midi_out
            .connect(port, "shindig-output")
            .map_err(|e| MidiError::ConnectionFailed(e.to_string()))?;

        info!("Opened MIDI output: {}", port_name);

        Ok(Self {
            connection: Mutex::new(Some(connection)),
            port_name,
            messages_sent: AtomicU64::new(0),
        })
    }

    /// Send raw MIDI bytes
    pub fn send_raw(&self, data: &[u8]) -> Result<(), MidiError> {
        let mut guard = self.connection.lock().expect("midi output mutex poisoned");
        if let Some(ref mut conn) = *guard {
            conn.send(data)
                .map_err(|e| MidiError::SendFailed(e.to_string()))?;
            self.messages_sent.fetch_add(1, Ordering::Relaxed);
            Ok(())
        } else {
            Err(MidiError::SendFailed("Connection closed".to_string()))
        }
    }

    /// Close the connection
    pub fn close(&self) {
        let mut guard = self.connection.lock().expect("midi output mutex poisoned");
        if let Some(conn) = guard.take() {
            conn.close();
            info!(
                "Closed MIDI output: {} ({} messages sent)",
                self.port_name,
                self.messages_sent.load(Ordering::Relaxed)
            );
        }
    }
}

impl EventSink for ActiveMidiOutput {
    fn send(&self, msg: &MidiMessage) -> Result<(), MidiError> {
        self.send_raw(&encode_midi_message(msg))
    }
}

impl Drop for ActiveMidiOutput {
    fn drop(&mut self) {
        self.close();
    }
}
