use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cursor::{ByteCursor, read_u32_at};
use crate::error::{Result, SaveError};

pub const REGION_COUNT: usize = 4;
pub const REGION_HEADER_LEN: usize = 8;
pub const REGION_TRAILER_LEN: usize = 5;
pub const REGION_MARKER: u8 = 0x01;
pub const REGION_SIGNATURE_SUFFIX: [u8; 4] = [0x00, 0x00, 0x80, 0x00];
/// Exclusive upper bound on a believable region size. Larger values are
/// incidental byte patterns, not headers.
pub const MAX_REGION_SIZE: u32 = 50_000;
pub const SIZE_FIELD_OFFSET: usize = 1;
/// Region trailer layout is `[0x00][checksum:u32]`, so the checksum sits one
/// byte past the 8-byte header.
pub const CHECKSUM_FIELD_OFFSET: usize = REGION_HEADER_LEN + 1;

/// One `[0x01][size:u24][00 00 80 00]` header found inside block 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionHeader {
    /// Offset of the `0x01` marker within the scanned buffer.
    pub offset: usize,
    pub declared_size: u32,
    pub signature_suffix: [u8; 4],
    /// Checksum from the trailer, when the trailer lies inside the buffer.
    pub checksum: Option<u32>,
}

impl RegionHeader {
    pub fn size_field_offset(&self) -> usize {
        self.offset + SIZE_FIELD_OFFSET
    }

    pub fn checksum_field_offset(&self) -> usize {
        self.offset + CHECKSUM_FIELD_OFFSET
    }

    /// Where scanning resumes: past header, payload and trailer.
    pub fn next_scan_offset(&self) -> usize {
        self.offset + REGION_HEADER_LEN + self.declared_size as usize + REGION_TRAILER_LEN
    }
}

pub fn is_plausible_size(size: u32) -> bool {
    size > 0 && size < MAX_REGION_SIZE
}

/// Tests whether a region header starts at `pos`.
pub fn match_region_header(buffer: &[u8], pos: usize) -> Option<RegionHeader> {
    let mut cursor = ByteCursor::at(buffer, pos);
    let header: [u8; REGION_HEADER_LEN] = cursor.read_array("region header").ok()?;
    if header[0] != REGION_MARKER || header[4..8] != REGION_SIGNATURE_SUFFIX {
        return None;
    }

    let declared_size = u32::from_le_bytes([header[1], header[2], header[3], 0]);
    if !is_plausible_size(declared_size) {
        trace!(offset = pos, declared_size, "rejecting region signature with implausible size");
        return None;
    }

    Some(RegionHeader {
        offset: pos,
        declared_size,
        signature_suffix: REGION_SIGNATURE_SUFFIX,
        checksum: read_u32_at(buffer, pos + CHECKSUM_FIELD_OFFSET, "region checksum").ok(),
    })
}

/// Finds `count` region headers at or after `start`, jumping over each
/// matched region's payload before resuming the byte-by-byte search.
pub fn scan_regions(buffer: &[u8], start: usize, count: usize) -> Result<Vec<RegionHeader>> {
    let mut regions = Vec::with_capacity(count);
    let mut pos = start;

    while regions.len() < count && pos.saturating_add(REGION_HEADER_LEN) <= buffer.len() {
        match match_region_header(buffer, pos) {
            Some(region) => {
                debug!(
                    index = regions.len() + 1,
                    offset = region.offset,
                    declared_size = region.declared_size,
                    "found region header"
                );
                pos = region.next_scan_offset();
                regions.push(region);
            }
            None => pos += 1,
        }
    }

    if regions.len() < count {
        return Err(SaveError::MissingRegions {
            found: regions.len(),
            required: count,
        });
    }

    Ok(regions)
}
