//! Decoder library for Compact-format LiDAR telegrams.
//!
//! Multi-layer scanning sensors stream their measurements as "Compact"
//! telegrams, usually one per UDP datagram. This crate turns one such buffer
//! into a [`CompactSegment`]: a fixed header followed by a chain of modules,
//! each holding per-layer metadata and the beam/echo measurements.
//!
//! The decoder is pure: it performs no I/O and keeps no state between calls.
//!
//! # Example
//!
//! ```no_run
//! use compact_core::decode_segment;
//!
//! let telegram: Vec<u8> = std::fs::read("segment.bin").unwrap();
//! let segment = decode_segment(&telegram).unwrap();
//!
//! let module = &segment.modules[0];
//! println!("Frame {}", module.meta_data.frame_number);
//! println!("{} beams x {} layers", module.beams.len(), module.meta_data.number_of_layers_in_module);
//! ```
//!
//! # Features
//!
//! - CRC-32 verification of the whole telegram before decoding
//! - Module chains with exact size checks between modules
//! - Per-module echo/beam layouts driven by the content flags
//! - CSV export of decoded echoes

pub mod checksum;
pub mod decoder;
pub mod error;
pub mod output;
pub mod reader;
pub mod types;

// Re-export commonly used types
pub use decoder::decode_segment;
pub use error::DecodeError;
pub use output::OutputError;
pub use types::{
    Beam, BeamAllLayers, BeamContent, CompactSegment, Echo, EchoContent, Header, ModuleData,
    ModuleMetaData,
};
