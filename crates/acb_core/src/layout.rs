use serde::{Deserialize, Serialize};

use crate::container::BlockKind;
use crate::error::{Result, SaveError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.start..self.end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayout {
    pub kind: BlockKind,
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLayout {
    pub file_len: usize,
    pub blocks: Vec<BlockLayout>,
}

impl FileLayout {
    /// Checks that the blocks tile the file from byte 0 to `file_len` with no
    /// gaps or overlaps.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.blocks.first() else {
            return Err(SaveError::MalformedContainer(
                "file layout must contain at least one block".to_string(),
            ));
        };

        if first.range.start != 0 {
            return Err(SaveError::MalformedContainer(
                "layout does not start at byte 0".to_string(),
            ));
        }

        let mut expected = 0usize;
        for block in &self.blocks {
            if block.range.start != expected {
                return Err(SaveError::MalformedContainer(format!(
                    "layout gap/overlap around {}: expected start {}, got {}",
                    block.kind, expected, block.range.start
                )));
            }
            if block.range.end < block.range.start {
                return Err(SaveError::MalformedContainer(format!(
                    "invalid range for {}: {}..{}",
                    block.kind, block.range.start, block.range.end
                )));
            }
            expected = block.range.end;
        }

        if expected != self.file_len {
            return Err(SaveError::MalformedContainer(format!(
                "layout does not cover file: ended at {}, file length {}",
                expected, self.file_len
            )));
        }

        Ok(())
    }
}
