//! Program image loading.

use std::path::Path;

use crate::fault::{ImageLoadError, IoErrorKind};
use crate::memory::MEMORY_CAPACITY;

/// A raw program image of exactly [`MEMORY_CAPACITY`] bytes.
///
/// Bytes are copied verbatim into memory starting at address zero; the image
/// carries code and initial data with no header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Box<[u8; MEMORY_CAPACITY]>,
}

impl Image {
    /// Validates and wraps raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ImageLoadError::SizeMismatch`] unless `bytes` is exactly
    /// [`MEMORY_CAPACITY`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageLoadError> {
        let array: &[u8; MEMORY_CAPACITY] =
            bytes.try_into().map_err(|_| ImageLoadError::SizeMismatch {
                expected: MEMORY_CAPACITY,
                actual: bytes.len(),
            })?;
        Ok(Self {
            bytes: Box::new(*array),
        })
    }

    /// Builds an image from instruction words placed from address zero,
    /// zero-filling the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`ImageLoadError::SizeMismatch`] when the words do not fit.
    pub fn from_program(words: &[u32]) -> Result<Self, ImageLoadError> {
        let needed = words.len() * 4;
        if needed > MEMORY_CAPACITY {
            return Err(ImageLoadError::SizeMismatch {
                expected: MEMORY_CAPACITY,
                actual: needed,
            });
        }
        let mut bytes = Box::new([0_u8; MEMORY_CAPACITY]);
        for (slot, word) in bytes.chunks_exact_mut(4).zip(words) {
            slot.copy_from_slice(&word.to_le_bytes());
        }
        Ok(Self { bytes })
    }

    /// Image contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; MEMORY_CAPACITY] {
        &self.bytes
    }
}

/// Reads and validates an image file.
///
/// # Errors
///
/// Returns [`ImageLoadError::Open`] when the file cannot be read and
/// [`ImageLoadError::SizeMismatch`] when its size is wrong.
pub fn load_image(path: impl AsRef<Path>) -> Result<Image, ImageLoadError> {
    let bytes = std::fs::read(path).map_err(|error| ImageLoadError::Open {
        kind: IoErrorKind::from(error.kind()),
    })?;
    Image::from_bytes(&bytes)
}
