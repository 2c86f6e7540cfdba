#![allow(dead_code)]

use acb_core::codec::{BLOCK_HEADER_LEN, BlockCodec, CompressionStats, Compressed, checksum};
use acb_core::container::BlockKind;
use acb_core::error::{Result, SaveError};

/// Run-length codec standing in for LZSS: `[count][byte]` pairs, runs of
/// 1..=255. Its headers carry the compressed size at 0x20, the
/// decompressed size at 0x24 and the running total at 0x28.
#[derive(Debug, Default, Clone, Copy)]
pub struct RleCodec;

pub const HEADER_MAGIC: [u8; 4] = *b"TST1";

impl BlockCodec for RleCodec {
    fn decompress(&self, block: BlockKind, compressed: &[u8]) -> Result<Vec<u8>> {
        if compressed.len() % 2 != 0 {
            return Err(SaveError::CorruptStream {
                block,
                reason: format!("odd run-length stream of {} bytes", compressed.len()),
            });
        }
        let mut out = Vec::new();
        for pair in compressed.chunks_exact(2) {
            if pair[0] == 0 {
                return Err(SaveError::CorruptStream {
                    block,
                    reason: "zero-length run".to_string(),
                });
            }
            out.extend(std::iter::repeat_n(pair[1], usize::from(pair[0])));
        }
        Ok(out)
    }

    fn compress(&self, _block: BlockKind, payload: &[u8]) -> Result<Compressed> {
        let bytes = rle(payload);
        let match_count = bytes.chunks_exact(2).filter(|pair| pair[0] > 1).count();
        let ratio = if payload.is_empty() {
            1.0
        } else {
            bytes.len() as f64 / payload.len() as f64
        };
        Ok(Compressed {
            bytes,
            stats: CompressionStats { match_count, ratio },
        })
    }

    fn build_header(
        &self,
        block: BlockKind,
        compressed: &[u8],
        decompressed_len: usize,
        running_total: Option<usize>,
    ) -> Result<[u8; BLOCK_HEADER_LEN]> {
        Ok(header(block, compressed.len(), decompressed_len, running_total))
    }
}

pub fn rle(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut iter = payload.iter().peekable();
    while let Some(&byte) = iter.next() {
        let mut run = 1u8;
        while run < u8::MAX && iter.peek() == Some(&&byte) {
            iter.next();
            run += 1;
        }
        out.push(run);
        out.push(byte);
    }
    out
}

pub fn header(
    block: BlockKind,
    compressed_len: usize,
    decompressed_len: usize,
    running_total: Option<usize>,
) -> [u8; BLOCK_HEADER_LEN] {
    let mut out = [0u8; BLOCK_HEADER_LEN];
    out[..4].copy_from_slice(&HEADER_MAGIC);
    out[4] = block.number();
    out[0x20..0x24].copy_from_slice(&(compressed_len as u32).to_le_bytes());
    out[0x24..0x28].copy_from_slice(&(decompressed_len as u32).to_le_bytes());
    out[0x28..0x2C].copy_from_slice(&(running_total.unwrap_or(0) as u32).to_le_bytes());
    out
}

/// `[0x01][size:u24][00 00 80 00][00][checksum:u32]`.
pub fn region_header(size: usize, checksum: u32) -> Vec<u8> {
    let mut out = vec![0x01];
    out.extend_from_slice(&(size as u32).to_le_bytes()[..3]);
    out.extend_from_slice(&[0x00, 0x00, 0x80, 0x00, 0x00]);
    out.extend_from_slice(&checksum.to_le_bytes());
    out
}

/// Builds a five-block save from decompressed block contents.
#[derive(Debug, Clone)]
pub struct SaveBuilder {
    pub block1: Vec<u8>,
    pub block2: Vec<u8>,
    /// Payloads of regions 1-3.
    pub regions: [Vec<u8>; 3],
    /// Filler placed before each of the four region headers.
    pub fillers: [Vec<u8>; 4],
    pub block4: Vec<u8>,
    pub block5: Vec<u8>,
}

impl Default for SaveBuilder {
    fn default() -> Self {
        Self {
            block1: b"profile:Ezio".repeat(8),
            block2: vec![0x11; 300],
            regions: [
                vec![0x08, 0x03, 0x16, 0x01, 0x6D, 0x15, 0x00, 0x2A, 0x00, 0x00, 0x00],
                vec![0x17, 0x3C, 0x08, 0x01, 0x17, 0x3C, 0x00, 0x10, 0x00, 0x00, 0x00],
                vec![0x1C, 0x04, 0x0A, 0x34, 0x12, 0xDB],
            ],
            fillers: Default::default(),
            block4: vec![0x00; 0x5100],
            block5: vec![
                0x01, 0x0B, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x08, 0x03, 0x16, 0x02, 0x12,
                0x00, 0x07, 0x00, 0x00, 0x00, 0xCD,
            ],
        }
    }
}

impl SaveBuilder {
    pub fn block3(&self) -> Vec<u8> {
        let block4 = rle(&self.block4);
        let mut out = Vec::new();
        for (filler, payload) in self.fillers.iter().zip(&self.regions) {
            out.extend_from_slice(filler);
            out.extend_from_slice(&region_header(payload.len(), checksum(payload)));
            out.extend_from_slice(payload);
        }
        out.extend_from_slice(&self.fillers[3]);
        out.extend_from_slice(&region_header(block4.len(), checksum(&block4)));
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let block1 = rle(&self.block1);
        let block2 = rle(&self.block2);
        let block3 = self.block3();
        let block4 = rle(&self.block4);
        let running_total =
            BLOCK_HEADER_LEN + block2.len() + block3.len() + block4.len() + self.block5.len();

        let mut out = Vec::new();
        out.extend_from_slice(&header(
            BlockKind::Block1,
            block1.len(),
            self.block1.len(),
            None,
        ));
        out.extend_from_slice(&block1);
        out.extend_from_slice(&header(
            BlockKind::Block2,
            block2.len(),
            self.block2.len(),
            Some(running_total),
        ));
        out.extend_from_slice(&block2);
        out.extend_from_slice(&block3);
        out.extend_from_slice(&block4);
        out.extend_from_slice(&self.block5);
        out
    }
}
