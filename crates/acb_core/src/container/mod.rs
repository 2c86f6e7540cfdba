pub mod region;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec::{BLOCK_HEADER_LEN, checksum};
use crate::cursor::{read_u32_at, slice_at};
use crate::error::Result;
use crate::layout::{BlockLayout, ByteRange, FileLayout};
use region::{REGION_COUNT, REGION_HEADER_LEN, REGION_TRAILER_LEN, RegionHeader, scan_regions};

/// Offset of the compressed-size field inside a 44-byte block header.
pub const HEADER_SIZE_FIELD_OFFSET: usize = 0x20;
pub const BLOCK1_PAYLOAD_OFFSET: usize = BLOCK_HEADER_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Block1,
    Block2,
    Block3,
    Block4,
    Block5,
}

impl BlockKind {
    pub const ALL: [BlockKind; 5] = [
        Self::Block1,
        Self::Block2,
        Self::Block3,
        Self::Block4,
        Self::Block5,
    ];

    pub fn number(self) -> u8 {
        match self {
            Self::Block1 => 1,
            Self::Block2 => 2,
            Self::Block3 => 3,
            Self::Block4 => 4,
            Self::Block5 => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn index(self) -> usize {
        usize::from(self.number() - 1)
    }

    /// Blocks 1, 2 and 4 hold LZSS payloads.
    pub fn is_compressed(self) -> bool {
        matches!(self, Self::Block1 | Self::Block2 | Self::Block4)
    }

    /// Blocks 1 and 2 are preceded by a 44-byte header.
    pub fn has_header(self) -> bool {
        matches!(self, Self::Block1 | Self::Block2)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {}", self.number())
    }
}

/// A view of one block. Borrows the container's buffer.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    kind: BlockKind,
    range: ByteRange,
    header_range: Option<ByteRange>,
    file: &'a [u8],
}

impl<'a> Block<'a> {
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn is_compressed(&self) -> bool {
        self.kind.is_compressed()
    }

    /// Full byte range, header included.
    pub fn range(&self) -> ByteRange {
        self.range
    }

    pub fn header_range(&self) -> Option<ByteRange> {
        self.header_range
    }

    pub fn payload_range(&self) -> ByteRange {
        match self.header_range {
            Some(header) => ByteRange::new(header.end, self.range.end),
            None => self.range,
        }
    }

    pub fn raw(&self) -> &'a [u8] {
        self.range.slice(self.file)
    }

    pub fn header(&self) -> Option<&'a [u8]> {
        self.header_range.map(|r| r.slice(self.file))
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload_range().slice(self.file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumCheck {
    pub stored: Option<u32>,
    pub computed: u32,
}

impl ChecksumCheck {
    pub fn is_valid(&self) -> bool {
        self.stored == Some(self.computed)
    }
}

/// A save file split into its five blocks.
#[derive(Debug, Clone)]
pub struct Container<'a> {
    bytes: &'a [u8],
    layout: FileLayout,
    header_ranges: [ByteRange; 2],
    regions: Vec<RegionHeader>,
}

impl<'a> Container<'a> {
    pub fn split(bytes: &'a [u8]) -> Result<Self> {
        let file_len = bytes.len();

        let block1_size = read_u32_at(bytes, HEADER_SIZE_FIELD_OFFSET, "block 1 size field")?;
        let block1_header = ByteRange::new(0, BLOCK_HEADER_LEN);
        let block1_end = checked_end(
            bytes,
            BLOCK1_PAYLOAD_OFFSET,
            block1_size as usize,
            "block 1 payload",
        )?;
        debug!(block1_size, block1_end, "located block 1");

        let block2_start = block1_end;
        let block2_size = read_u32_at(
            bytes,
            block2_start + HEADER_SIZE_FIELD_OFFSET,
            "block 2 size field",
        )?;
        let block2_header = ByteRange::new(block2_start, block2_start + BLOCK_HEADER_LEN);
        let block2_end = checked_end(
            bytes,
            block2_header.end,
            block2_size as usize,
            "block 2 payload",
        )?;
        debug!(block2_size, block2_end, "located block 2");

        let block3_start = block2_end;
        let regions = scan_regions(bytes, block3_start, REGION_COUNT)?;
        let region4 = regions[REGION_COUNT - 1];
        let block3_end = checked_end(
            bytes,
            region4.offset,
            REGION_HEADER_LEN + REGION_TRAILER_LEN,
            "region 4 header",
        )?;

        let block4_start = block3_end;
        let block4_end = checked_end(
            bytes,
            block4_start,
            region4.declared_size as usize,
            "block 4 payload",
        )?;
        debug!(
            block3_len = block3_end - block3_start,
            block4_len = region4.declared_size,
            block5_len = file_len - block4_end,
            "located blocks 3-5"
        );

        let ranges = [
            ByteRange::new(0, block1_end),
            ByteRange::new(block2_start, block2_end),
            ByteRange::new(block3_start, block3_end),
            ByteRange::new(block4_start, block4_end),
            ByteRange::new(block4_end, file_len),
        ];
        let layout = FileLayout {
            file_len,
            blocks: BlockKind::ALL
                .iter()
                .zip(ranges)
                .map(|(&kind, range)| BlockLayout { kind, range })
                .collect(),
        };
        layout.validate()?;

        let container = Self {
            bytes,
            layout,
            header_ranges: [block1_header, block2_header],
            regions,
        };

        let check = container.verify_block4_checksum();
        if !check.is_valid() {
            warn!(
                stored = ?check.stored,
                computed = check.computed,
                "region 4 checksum does not match block 4"
            );
        }

        Ok(container)
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn block(&self, kind: BlockKind) -> Block<'a> {
        let header_range = match kind {
            BlockKind::Block1 => Some(self.header_ranges[0]),
            BlockKind::Block2 => Some(self.header_ranges[1]),
            _ => None,
        };
        Block {
            kind,
            range: self.layout.blocks[kind.index()].range,
            header_range,
            file: self.bytes,
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block<'a>> + '_ {
        BlockKind::ALL.into_iter().map(|kind| self.block(kind))
    }

    /// The four region headers, offsets relative to the start of the file.
    pub fn regions(&self) -> &[RegionHeader] {
        &self.regions
    }

    pub fn region4(&self) -> &RegionHeader {
        &self.regions[REGION_COUNT - 1]
    }

    /// Region 4's header offset relative to the start of block 3.
    pub fn region4_offset_in_block3(&self) -> usize {
        self.region4().offset - self.block(BlockKind::Block3).range().start
    }

    pub fn verify_block4_checksum(&self) -> ChecksumCheck {
        ChecksumCheck {
            stored: self.region4().checksum,
            computed: checksum(self.block(BlockKind::Block4).raw()),
        }
    }

    /// Concatenates the five blocks in file order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.layout.file_len);
        for block in self.blocks() {
            out.extend_from_slice(block.raw());
        }
        out
    }
}

fn checked_end(bytes: &[u8], start: usize, len: usize, context: &'static str) -> Result<usize> {
    slice_at(bytes, start, len, context).map(|_| start + len)
}
