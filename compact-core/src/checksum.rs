//! CRC-32 trailer validation.

use crate::error::DecodeError;
use crate::types::CHECKSUM_LEN;
use byteorder::{ByteOrder, LittleEndian};

/// Verifies the trailing CRC-32 of a whole telegram.
///
/// The checksum covers every byte before the last four, which hold the
/// expected value as a little-endian `u32`.
pub fn ensure_checksum_is_valid(buffer: &[u8]) -> Result<(), DecodeError> {
    if buffer.len() < CHECKSUM_LEN + 1 {
        return Err(DecodeError::TooShort { len: buffer.len() });
    }

    let (payload, trailer) = buffer.split_at(buffer.len() - CHECKSUM_LEN);
    let computed = crc32fast::hash(payload);
    let declared = LittleEndian::read_u32(trailer);
    if computed != declared {
        return Err(DecodeError::ChecksumMismatch { computed, declared });
    }
    Ok(())
}
