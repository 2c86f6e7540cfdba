//! The two bonus capes: ownership flags in block 4 that the game leaves at
//! `0x00` until unlocked.

use serde::{Deserialize, Serialize};

use crate::codec::BlockCodec;
use crate::container::{BlockKind, Container};
use crate::error::Result;
use crate::patch::{FieldEdit, PatchOutcome, apply_patch};

pub const CAPE1_OFFSET: usize = 0x50E0;
pub const CAPE2_OFFSET: usize = 0x50F2;
pub const CAPE_UNLOCKED: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapeUnlock {
    pub offsets: [usize; 2],
    pub value: u8,
}

impl Default for CapeUnlock {
    fn default() -> Self {
        Self {
            offsets: [CAPE1_OFFSET, CAPE2_OFFSET],
            value: CAPE_UNLOCKED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapeFlag {
    pub index: usize,
    pub offset: usize,
    pub previous: u8,
    pub value: u8,
}

impl CapeUnlock {
    pub fn edits(&self) -> Vec<FieldEdit> {
        self.offsets
            .iter()
            .map(|&offset| FieldEdit::new(BlockKind::Block4, offset, self.value))
            .collect()
    }

    pub fn apply<C: BlockCodec + ?Sized>(
        &self,
        container: &Container<'_>,
        codec: &C,
    ) -> Result<PatchOutcome> {
        apply_patch(container, &self.edits(), codec)
    }

    /// Pairs each cape with the flag value it held before the patch.
    pub fn flags(&self, outcome: &PatchOutcome) -> Vec<CapeFlag> {
        outcome
            .edits
            .iter()
            .filter(|applied| applied.edit.block == BlockKind::Block4)
            .filter_map(|applied| {
                let index = self
                    .offsets
                    .iter()
                    .position(|&offset| offset == applied.edit.offset)?;
                Some(CapeFlag {
                    index: index + 1,
                    offset: applied.edit.offset,
                    previous: applied.previous,
                    value: applied.edit.value,
                })
            })
            .collect()
    }
}
