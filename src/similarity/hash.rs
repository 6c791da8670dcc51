//! Perceptual hashing of image files.

use std::path::Path;

use image_hasher::{HashAlg, HasherConfig};

use crate::error::{Error, Result};

/// Hash grid side; 8 x 8 bits fill a `u64`.
const HASH_SIZE: u32 = 8;

/// Computes a 64-bit perceptual hash for a local file.
pub trait ImageHasher: Send + Sync {
    /// Hash the image at `path`. Fails with [`Error::Decode`] when the file is not
    /// a readable image.
    fn hash_file(&self, path: &Path) -> Result<u64>;
}

/// DCT-based perceptual hasher.
///
/// The image is reduced to luminance, a 2D DCT is taken over a 16 x 16 downscale,
/// the 8 x 8 low-frequency block is thresholded against its median and the
/// resulting bits are packed big-endian.
#[derive(Debug, Default, Clone, Copy)]
pub struct PerceptualHasher;

impl PerceptualHasher {
    pub fn new() -> Self {
        Self
    }
}

impl ImageHasher for PerceptualHasher {
    fn hash_file(&self, path: &Path) -> Result<u64> {
        let image = image::open(path)
            .map_err(|e| Error::Decode(format!("{}: {}", path.display(), e)))?;

        let hasher = HasherConfig::new()
            .hash_size(HASH_SIZE, HASH_SIZE)
            .hash_alg(HashAlg::Median)
            .preproc_dct()
            .to_hasher();

        let hash = hasher.hash_image(&image);
        pack_bits(hash.as_bytes())
            .ok_or_else(|| Error::Decode(format!("{}: unexpected hash width", path.display())))
    }
}

/// Pack exactly eight hash bytes into a `u64`.
fn pack_bits(bytes: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Format a hash as 16 hex digits.
pub fn hash_to_hex(hash: u64) -> String {
    format!("{:016x}", hash)
}

/// Parse a hash from hex digits (an optional `0x` prefix is accepted).
pub fn hash_from_hex(input: &str) -> Option<u64> {
    let digits = input.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    if digits.is_empty() || digits.len() > 16 {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
