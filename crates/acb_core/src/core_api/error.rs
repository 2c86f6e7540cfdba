use std::error::Error;
use std::fmt;

use crate::error::{SaveError, SaveErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    MalformedContainer,
    CorruptStream,
    StructuralMismatch,
    UnsupportedOperation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}

impl From<SaveError> for CoreError {
    fn from(err: SaveError) -> Self {
        let code = match err.kind() {
            SaveErrorKind::MalformedContainer => CoreErrorCode::MalformedContainer,
            SaveErrorKind::CorruptStream => CoreErrorCode::CorruptStream,
            SaveErrorKind::StructuralMismatch => CoreErrorCode::StructuralMismatch,
            SaveErrorKind::Io => CoreErrorCode::Io,
        };
        Self::new(code, err.to_string())
    }
}
