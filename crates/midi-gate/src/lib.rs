pub mod message;
pub mod ports;
pub mod sequence_file;

pub use message::{encode_midi_message, parse_midi_bytes, MidiMessage};
pub use ports::{
    list_input_ports, list_output_ports, ActiveMidiInput, ActiveMidiOutput, EventSink,
    MidiError, MidiInputCallback, MidiPortInfo, TimestampedMidiMessage,
};
pub use sequence_file::{notes_from_file, notes_from_folder};
