//! Bounds-checked cursor over a telegram buffer.
//!
//! All multi-byte values on the wire are little-endian. A failed read leaves
//! the cursor where it was.

use crate::error::DecodeError;
use byteorder::{ByteOrder, LittleEndian};

/// A fixed-width value that can be read from the wire.
pub trait Primitive: Sized + Copy {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Decodes the value from exactly [`Self::SIZE`] bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

impl Primitive for u8 {
    const SIZE: usize = 1;

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl Primitive for i8 {
    const SIZE: usize = 1;

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }
}

macro_rules! impl_primitive {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    LittleEndian::$read(bytes)
                }
            }
        )*
    };
}

impl_primitive! {
    u16 => read_u16,
    i16 => read_i16,
    u32 => read_u32,
    i32 => read_i32,
    u64 => read_u64,
    i64 => read_i64,
    f32 => read_f32,
    f64 => read_f64,
}

/// Read cursor over an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct CursorReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> CursorReader<'a> {
    /// Creates a cursor positioned at the start of `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current read offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the current offset.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Borrows the next `needed` bytes without advancing.
    fn peek(&self, needed: usize) -> Result<&'a [u8], DecodeError> {
        let out_of_bounds = || DecodeError::OutOfBounds {
            offset: self.position,
            needed,
            len: self.buffer.len(),
        };
        let end = self.position.checked_add(needed).ok_or_else(out_of_bounds)?;
        self.buffer.get(self.position..end).ok_or_else(out_of_bounds)
    }

    /// Reads one primitive and advances past it.
    #[inline]
    pub fn read<T: Primitive>(&mut self) -> Result<T, DecodeError> {
        let bytes = self.peek(T::SIZE)?;
        self.position += T::SIZE;
        Ok(T::read_le(bytes))
    }

    /// Reads `count` consecutive primitives.
    ///
    /// Either all elements are read or none are.
    pub fn read_vec<T: Primitive>(&mut self, count: u32) -> Result<Vec<T>, DecodeError> {
        let needed = (count as usize)
            .checked_mul(T::SIZE)
            .ok_or(DecodeError::OutOfBounds {
                offset: self.position,
                needed: usize::MAX,
                len: self.buffer.len(),
            })?;
        let bytes = self.peek(needed)?;
        self.position += needed;
        Ok(bytes.chunks_exact(T::SIZE).map(T::read_le).collect())
    }
}
