use serde::{Deserialize, Serialize};

use crate::capes::CapeFlag;
use crate::container::{BlockKind, ChecksumCheck, Container};
use crate::patch::{AppliedEdit, BlockResize, FieldRewrite, PatchOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockSummary {
    pub block: u8,
    pub compressed: bool,
    pub start: usize,
    pub end: usize,
    pub header_len: usize,
    pub payload_len: usize,
}

impl BlockSummary {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionSummary {
    pub index: usize,
    pub offset: usize,
    /// Offset relative to the start of block 3.
    pub offset_in_block3: usize,
    pub declared_size: u32,
    pub checksum: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub file_len: usize,
    pub blocks: Vec<BlockSummary>,
    pub regions: Vec<RegionSummary>,
    pub block4_checksum: ChecksumCheck,
}

impl Snapshot {
    pub fn from_container(container: &Container<'_>) -> Self {
        let blocks = container
            .blocks()
            .map(|block| BlockSummary {
                block: block.kind().number(),
                compressed: block.is_compressed(),
                start: block.range().start,
                end: block.range().end,
                header_len: block.header_range().map_or(0, |r| r.len()),
                payload_len: block.payload_range().len(),
            })
            .collect();

        let block3_start = container.block(BlockKind::Block3).range().start;
        let regions = container
            .regions()
            .iter()
            .enumerate()
            .map(|(i, region)| RegionSummary {
                index: i + 1,
                offset: region.offset,
                offset_in_block3: region.offset - block3_start,
                declared_size: region.declared_size,
                checksum: region.checksum,
            })
            .collect();

        Self {
            file_len: container.layout().file_len,
            blocks,
            regions,
            block4_checksum: container.verify_block4_checksum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchReport {
    pub input_len: usize,
    pub output_len: usize,
    pub edits: Vec<AppliedEdit>,
    pub recompressed: Vec<BlockResize>,
    pub region4_size: Option<FieldRewrite>,
    pub region4_checksum: Option<FieldRewrite>,
    pub rebuilt_headers: Vec<u8>,
    pub already_applied: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capes: Vec<CapeFlag>,
}

impl PatchReport {
    pub fn from_outcome(input_len: usize, outcome: &PatchOutcome) -> Self {
        Self {
            input_len,
            output_len: outcome.bytes.len(),
            edits: outcome.edits.clone(),
            recompressed: outcome.recompressed.clone(),
            region4_size: outcome.region4_size,
            region4_checksum: outcome.region4_checksum,
            rebuilt_headers: outcome
                .rebuilt_headers
                .iter()
                .map(|kind| kind.number())
                .collect(),
            already_applied: outcome.already_applied,
            capes: Vec::new(),
        }
    }

    pub fn changed_edits(&self) -> usize {
        self.edits.iter().filter(|edit| edit.changed()).count()
    }
}
