//! Errors produced while decoding a telegram.

use thiserror::Error;

/// Errors that can occur while decoding a Compact telegram.
///
/// Every variant aborts the decode; no partial segment is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("read of {needed} bytes at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("telegram of {len} bytes is too short to contain a checksum and data")]
    TooShort { len: usize },

    #[error("checksum mismatch: computed {computed:#010X}, telegram carries {declared:#010X}")]
    ChecksumMismatch { computed: u32, declared: u32 },

    #[error("start of frame missing: got {found:#010X}")]
    InvalidMagic { found: u32 },

    #[error("invalid command id: expected 1, got {found}")]
    InvalidCommand { found: u32 },

    #[error("unsupported telegram version: expected 4, got {found}")]
    UnsupportedVersion { found: u32 },

    #[error("telegram contains no module data")]
    EmptyPayload,

    #[error("module {module_index}: declared size {declared} bytes, consumed {consumed} bytes")]
    SizeMismatch {
        module_index: usize,
        declared: u32,
        consumed: usize,
    },

    #[error("module shape too large: {beams} beams x {layers} layers x {echoes} echoes")]
    ShapeTooLarge { beams: u32, layers: u32, echoes: u32 },
}
