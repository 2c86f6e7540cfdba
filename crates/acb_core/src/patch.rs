//! Single-byte edits against decompressed block payloads, and the rebuild
//! that keeps the container readable afterwards.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codec::{BLOCK_HEADER_LEN, BlockCodec};
use crate::container::region::{
    CHECKSUM_FIELD_OFFSET, REGION_HEADER_LEN, REGION_MARKER, REGION_SIGNATURE_SUFFIX,
    SIZE_FIELD_OFFSET, is_plausible_size,
};
use crate::container::{BlockKind, Container, HEADER_SIZE_FIELD_OFFSET};
use crate::cursor::{read_u24_at, read_u32_at, slice_at, write_u24_at, write_u32_at};
use crate::error::{Result, SaveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEdit {
    pub block: BlockKind,
    /// Offset into the block's decompressed payload.
    pub offset: usize,
    pub value: u8,
}

impl FieldEdit {
    pub fn new(block: BlockKind, offset: usize, value: u8) -> Self {
        Self {
            block,
            offset,
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEdit {
    pub edit: FieldEdit,
    pub previous: u8,
}

impl AppliedEdit {
    pub fn changed(&self) -> bool {
        self.previous != self.edit.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResize {
    pub block: BlockKind,
    pub old_len: usize,
    pub new_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRewrite {
    pub old: u32,
    pub new: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub bytes: Vec<u8>,
    pub edits: Vec<AppliedEdit>,
    pub recompressed: Vec<BlockResize>,
    pub region4_size: Option<FieldRewrite>,
    pub region4_checksum: Option<FieldRewrite>,
    pub rebuilt_headers: Vec<BlockKind>,
    /// Every edit already held its target value; `bytes` is the input.
    pub already_applied: bool,
}

/// Decompressed payloads for the blocks an edit touched.
struct Touched {
    payload: Vec<u8>,
    changed: bool,
}

pub fn apply_patch<C: BlockCodec + ?Sized>(
    container: &Container<'_>,
    edits: &[FieldEdit],
    codec: &C,
) -> Result<PatchOutcome> {
    let mut touched: BTreeMap<BlockKind, Touched> = BTreeMap::new();
    let mut applied = Vec::with_capacity(edits.len());

    for edit in edits {
        if !edit.block.is_compressed() {
            return Err(SaveError::mismatch(format!(
                "{} is stored raw and cannot take payload edits",
                edit.block
            )));
        }

        let entry = match touched.entry(edit.block) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let compressed = container.block(edit.block).payload();
                let payload = codec.decompress(edit.block, compressed)?;
                debug!(
                    block = %edit.block,
                    compressed_len = compressed.len(),
                    decompressed_len = payload.len(),
                    "decompressed block for editing"
                );
                e.insert(Touched {
                    payload,
                    changed: false,
                })
            }
        };

        let len = entry.payload.len();
        let slot = entry.payload.get_mut(edit.offset).ok_or_else(|| {
            SaveError::mismatch(format!(
                "edit offset {:#x} is outside {} (decompressed length {len})",
                edit.offset, edit.block
            ))
        })?;
        let previous = *slot;
        *slot = edit.value;
        entry.changed |= previous != edit.value;
        applied.push(AppliedEdit {
            edit: *edit,
            previous,
        });
    }

    if touched.values().all(|t| !t.changed) {
        info!("all edits already applied; leaving file unchanged");
        return Ok(PatchOutcome {
            bytes: container.bytes().to_vec(),
            edits: applied,
            recompressed: Vec::new(),
            region4_size: None,
            region4_checksum: None,
            rebuilt_headers: Vec::new(),
            already_applied: true,
        });
    }

    let mut rebuilt = Rebuild::new(container);
    for (&kind, block) in touched.iter().filter(|(_, t)| t.changed) {
        let compressed = codec.compress(kind, &block.payload)?;
        debug!(
            block = %kind,
            old_len = container.block(kind).payload().len(),
            new_len = compressed.bytes.len(),
            match_count = compressed.stats.match_count,
            ratio = compressed.stats.ratio,
            "recompressed block"
        );
        rebuilt.replace_payload(kind, compressed.bytes, block.payload.len());
    }

    let mut region4_size = None;
    let mut region4_checksum = None;
    if let Some(block4) = rebuilt.payloads[BlockKind::Block4.index()].as_deref() {
        let offset = container.region4_offset_in_block3();
        let old_len = container.block(BlockKind::Block4).payload().len();
        check_region4_target(&rebuilt.block3, offset, old_len)?;

        let new_size = u32::try_from(block4.len())
            .ok()
            .filter(|&size| is_plausible_size(size))
            .ok_or_else(|| {
                SaveError::mismatch(format!(
                    "recompressed block 4 is {} bytes, outside what region 4 can declare",
                    block4.len()
                ))
            })?;
        let size_offset = offset + SIZE_FIELD_OFFSET;
        let old_size = read_u24_at(&rebuilt.block3, size_offset, "region 4 size")?;
        if old_size != new_size {
            info!(old_size, new_size, "patching region 4 size");
            write_u24_at(&mut rebuilt.block3, size_offset, new_size, "region 4 size")?;
            region4_size = Some(FieldRewrite {
                old: old_size,
                new: new_size,
            });
        }

        let checksum_offset = offset + CHECKSUM_FIELD_OFFSET;
        let old_checksum = read_u32_at(&rebuilt.block3, checksum_offset, "region 4 checksum")?;
        let new_checksum = codec.checksum(block4);
        if old_checksum != new_checksum {
            info!(old_checksum, new_checksum, "patching block 4 checksum");
            write_u32_at(
                &mut rebuilt.block3,
                checksum_offset,
                new_checksum,
                "region 4 checksum",
            )?;
            region4_checksum = Some(FieldRewrite {
                old: old_checksum,
                new: new_checksum,
            });
        }
    }

    let mut rebuilt_headers = Vec::new();
    if rebuilt.payloads[BlockKind::Block1.index()].is_some() {
        rebuilt.rebuild_header(BlockKind::Block1, None, codec)?;
        rebuilt_headers.push(BlockKind::Block1);
    }

    let block2_needs_header = rebuilt.payloads[BlockKind::Block2.index()].is_some()
        || rebuilt.len_changed(BlockKind::Block1)
        || rebuilt.len_changed(BlockKind::Block4);
    if block2_needs_header {
        let running_total = BLOCK_HEADER_LEN
            + rebuilt.payload_len(BlockKind::Block2)
            + rebuilt.block3.len()
            + rebuilt.payload_len(BlockKind::Block4)
            + container.block(BlockKind::Block5).raw().len();
        rebuilt.rebuild_header(BlockKind::Block2, Some(running_total), codec)?;
        rebuilt_headers.push(BlockKind::Block2);
    }

    let recompressed = touched
        .iter()
        .filter(|(_, t)| t.changed)
        .map(|(&block, _)| BlockResize {
            block,
            old_len: container.block(block).payload().len(),
            new_len: rebuilt.payload_len(block),
        })
        .collect();

    let bytes = rebuilt.assemble();
    Container::split(&bytes)?;

    Ok(PatchOutcome {
        bytes,
        edits: applied,
        recompressed,
        region4_size,
        region4_checksum,
        rebuilt_headers,
        already_applied: false,
    })
}

/// Region 4's header must still read as a header for block 4's current
/// length before its fields are rewritten.
fn check_region4_target(block3: &[u8], offset: usize, block4_len: usize) -> Result<()> {
    let header = slice_at(block3, offset, REGION_HEADER_LEN, "region 4 header")?;
    if header[0] != REGION_MARKER || header[4..8] != REGION_SIGNATURE_SUFFIX {
        return Err(SaveError::mismatch(format!(
            "bytes at block 3 offset {offset:#x} are not a region header: {header:02x?}"
        )));
    }
    let declared = read_u24_at(block3, offset + SIZE_FIELD_OFFSET, "region 4 size")?;
    if !is_plausible_size(declared) || declared as usize != block4_len {
        return Err(SaveError::mismatch(format!(
            "region 4 declares {declared} bytes but block 4 holds {block4_len}"
        )));
    }
    slice_at(block3, offset + CHECKSUM_FIELD_OFFSET, 4, "region 4 checksum")?;
    Ok(())
}

/// Output under construction. `None` entries keep the original bytes.
struct Rebuild<'c, 'a> {
    container: &'c Container<'a>,
    headers: [Option<[u8; BLOCK_HEADER_LEN]>; 2],
    payloads: [Option<Vec<u8>>; 5],
    decompressed_lens: [Option<usize>; 5],
    block3: Vec<u8>,
}

impl<'c, 'a> Rebuild<'c, 'a> {
    fn new(container: &'c Container<'a>) -> Self {
        Self {
            container,
            headers: [None, None],
            payloads: Default::default(),
            decompressed_lens: [None; 5],
            block3: container.block(BlockKind::Block3).raw().to_vec(),
        }
    }

    fn replace_payload(&mut self, kind: BlockKind, compressed: Vec<u8>, decompressed_len: usize) {
        self.payloads[kind.index()] = Some(compressed);
        self.decompressed_lens[kind.index()] = Some(decompressed_len);
    }

    fn payload(&self, kind: BlockKind) -> &[u8] {
        match &self.payloads[kind.index()] {
            Some(bytes) => bytes,
            None => self.container.block(kind).payload(),
        }
    }

    fn payload_len(&self, kind: BlockKind) -> usize {
        self.payload(kind).len()
    }

    fn len_changed(&self, kind: BlockKind) -> bool {
        self.payload_len(kind) != self.container.block(kind).payload().len()
    }

    fn rebuild_header<C: BlockCodec + ?Sized>(
        &mut self,
        kind: BlockKind,
        running_total: Option<usize>,
        codec: &C,
    ) -> Result<()> {
        let decompressed_len = match self.decompressed_lens[kind.index()] {
            Some(len) => len,
            None => {
                let len = codec
                    .decompress(kind, self.container.block(kind).payload())?
                    .len();
                self.decompressed_lens[kind.index()] = Some(len);
                len
            }
        };

        let compressed = self.payload(kind);
        let header = codec.build_header(kind, compressed, decompressed_len, running_total)?;
        let declared = read_u32_at(&header, HEADER_SIZE_FIELD_OFFSET, "rebuilt header size")?;
        if declared as usize != compressed.len() {
            return Err(SaveError::mismatch(format!(
                "rebuilt {kind} header declares {declared} bytes, payload is {}",
                compressed.len()
            )));
        }

        info!(
            block = %kind,
            compressed_len = compressed.len(),
            decompressed_len,
            ?running_total,
            "rebuilt block header"
        );
        self.headers[kind.index()] = Some(header);
        Ok(())
    }

    fn header(&self, kind: BlockKind) -> &[u8] {
        match &self.headers[kind.index()] {
            Some(header) => header,
            None => self.container.block(kind).header().unwrap_or_default(),
        }
    }

    fn assemble(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.container.layout().file_len);
        out.extend_from_slice(self.header(BlockKind::Block1));
        out.extend_from_slice(self.payload(BlockKind::Block1));
        out.extend_from_slice(self.header(BlockKind::Block2));
        out.extend_from_slice(self.payload(BlockKind::Block2));
        out.extend_from_slice(&self.block3);
        out.extend_from_slice(self.payload(BlockKind::Block4));
        out.extend_from_slice(self.container.block(BlockKind::Block5).raw());
        out
    }
}
