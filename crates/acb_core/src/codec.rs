//! Seam to the LZSS codec and block-header builder.
//!
//! The core never compresses or frames blocks itself; it calls into a
//! [`BlockCodec`] supplied by the caller. Only the checksum has a fixed
//! implementation (Adler-32).

use serde::{Deserialize, Serialize};

use crate::container::BlockKind;
use crate::error::Result;

/// Size in bytes of the header that precedes blocks 1 and 2.
pub const BLOCK_HEADER_LEN: usize = 44;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompressionStats {
    pub match_count: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub stats: CompressionStats,
}

pub trait BlockCodec {
    /// Expands an LZSS payload. Malformed input must surface as
    /// [`SaveError::CorruptStream`](crate::error::SaveError::CorruptStream).
    fn decompress(&self, block: BlockKind, compressed: &[u8]) -> Result<Vec<u8>>;

    /// Compresses a payload. Identical input must give identical output.
    fn compress(&self, block: BlockKind, payload: &[u8]) -> Result<Compressed>;

    /// Builds the 44-byte header for block 1 or 2. `running_total` is only
    /// given for block 2 and counts every byte from its header to end of file.
    fn build_header(
        &self,
        block: BlockKind,
        compressed: &[u8],
        decompressed_len: usize,
        running_total: Option<usize>,
    ) -> Result<[u8; BLOCK_HEADER_LEN]>;

    fn checksum(&self, bytes: &[u8]) -> u32 {
        checksum(bytes)
    }
}

/// Adler-32 of `bytes`, the checksum stored in region 4's trailer.
pub fn checksum(bytes: &[u8]) -> u32 {
    adler::adler32_slice(bytes)
}
