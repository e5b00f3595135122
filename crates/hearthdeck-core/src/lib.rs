pub mod chords;
pub mod config;
pub mod entities;
pub mod wire;

pub use chords::{ChordError, ChordGrammar, ChordState};
pub use config::{Config, ConfigError, EntityConfig};
pub use entities::{EntityTree, NodeId};
pub use wire::{Command, CommandKind, Event};
