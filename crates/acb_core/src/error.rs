use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::BlockKind;

pub type Result<T> = std::result::Result<T, SaveError>;

/// Coarse error classes a caller reports on: which phase of a parse or patch
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveErrorKind {
    MalformedContainer,
    CorruptStream,
    StructuralMismatch,
    Io,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("malformed container: found {found} of {required} region headers in block 3")]
    MissingRegions { found: usize, required: usize },

    #[error(
        "malformed container: {context} needs {needed} bytes at offset {offset:#x}, buffer holds {len}"
    )]
    OutOfBounds {
        context: &'static str,
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("malformed container: {0}")]
    MalformedContainer(String),

    #[error("corrupt stream in {block}: {reason}")]
    CorruptStream { block: BlockKind, reason: String },

    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SaveError {
    pub fn kind(&self) -> SaveErrorKind {
        match self {
            Self::MissingRegions { .. } | Self::OutOfBounds { .. } | Self::MalformedContainer(_) => {
                SaveErrorKind::MalformedContainer
            }
            Self::CorruptStream { .. } => SaveErrorKind::CorruptStream,
            Self::StructuralMismatch(_) => SaveErrorKind::StructuralMismatch,
            Self::Io(_) => SaveErrorKind::Io,
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        Self::StructuralMismatch(message.into())
    }
}
