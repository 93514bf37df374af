//! 12-bit image sample unpacking
//!
//! Every 6-byte chunk carries four 12-bit samples:
//!
//! ```text
//! s0 = (b0 & 0x0f) << 8 | b1
//! s1 = b3 << 4          | b0 >> 4
//! s2 = (b5 & 0x0f) << 8 | b2
//! s3 = b4 << 4          | b5 >> 4
//! ```

use crate::error::{Error, Result};

/// Bytes per packed chunk
pub const CHUNK_SIZE: usize = 6;

/// Samples per packed chunk
pub const SAMPLES_PER_CHUNK: usize = 4;

/// Unpack one 6-byte chunk
pub fn decode_chunk(chunk: &[u8; CHUNK_SIZE]) -> [u16; SAMPLES_PER_CHUNK] {
    let b = chunk.map(u16::from);

    [
        (b[0] & 0xf) << 8 | b[1],
        b[3] << 4 | b[0] >> 4,
        (b[5] & 0xf) << 8 | b[2],
        b[4] << 4 | b[5] >> 4,
    ]
}

/// Unpack a block of 12-bit samples, preserving order
///
/// # Errors
///
/// Returns [`Error::InvalidImageLength`] if the block is not made of whole
/// 6-byte chunks.
///
/// # Examples
///
/// ```
/// use goodix_core::image;
///
/// let samples = image::decode(&[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc]).unwrap();
/// assert_eq!(samples, vec![0x234, 0x781, 0xc56, 0x9ab]);
/// ```
pub fn decode(payload: &[u8]) -> Result<Vec<u16>> {
    if payload.len() % CHUNK_SIZE != 0 {
        return Err(Error::InvalidImageLength(payload.len()));
    }

    let mut image = Vec::with_capacity(payload.len() / CHUNK_SIZE * SAMPLES_PER_CHUNK);
    for chunk in payload.chunks_exact(CHUNK_SIZE) {
        let mut packed = [0u8; CHUNK_SIZE];
        packed.copy_from_slice(chunk);
        image.extend_from_slice(&decode_chunk(&packed));
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_chunk() {
        let samples = decode_chunk(&[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc]);
        assert_eq!(samples, [0x234, 0x781, 0xc56, 0x9ab]);
    }

    #[test]
    fn test_order_preserved() {
        let payload = [
            0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, // first chunk
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // second chunk
        ];

        assert_eq!(
            decode(&payload).unwrap(),
            vec![0x234, 0x781, 0xc56, 0x9ab, 0xfff, 0xfff, 0xfff, 0xfff]
        );
    }

    #[test]
    fn test_samples_fit_twelve_bits() {
        let payload: Vec<u8> = (0..=255).cycle().take(600).collect();

        assert!(decode(&payload).unwrap().iter().all(|s| *s <= 0xfff));
    }

    #[test]
    fn test_empty() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_partial_chunk() {
        assert!(matches!(decode(&[0; 7]), Err(Error::InvalidImageLength(7))));
    }
}
