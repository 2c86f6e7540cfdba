use std::fs;
use std::path::Path;

use crate::capes::CapeUnlock;
use crate::codec::BlockCodec;
use crate::compact::{self, DecodedStream};
use crate::container::{BlockKind, Container};
use crate::patch::{FieldEdit, apply_patch};

use super::error::{CoreError, CoreErrorCode};
use super::types::{PatchReport, Snapshot};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

/// An opened save. Owns the file bytes; [`Container`] views are re-derived
/// on demand.
#[derive(Debug)]
pub struct Session {
    bytes: Vec<u8>,
    snapshot: Snapshot,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub fn open_bytes<B: Into<Vec<u8>>>(&self, bytes: B) -> Result<Session, CoreError> {
        let bytes = bytes.into();
        let snapshot = Snapshot::from_container(&Container::split(&bytes)?);
        Ok(Session { bytes, snapshot })
    }

    pub fn open_path<P: AsRef<Path>>(&self, path: P) -> Result<Session, CoreError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        self.open_bytes(bytes)
    }
}

impl Session {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn container(&self) -> Result<Container<'_>, CoreError> {
        Container::split(&self.bytes).map_err(CoreError::from)
    }

    /// Stored bytes of one block, header included for blocks 1 and 2.
    pub fn block_bytes(&self, kind: BlockKind) -> &[u8] {
        let summary = &self.snapshot.blocks[kind.index()];
        &self.bytes[summary.start..summary.end]
    }

    pub fn decompress_block<C: BlockCodec + ?Sized>(
        &self,
        kind: BlockKind,
        codec: &C,
    ) -> Result<Vec<u8>, CoreError> {
        if !kind.is_compressed() {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                format!("{kind} is stored raw"),
            ));
        }
        let container = self.container()?;
        codec
            .decompress(kind, container.block(kind).payload())
            .map_err(CoreError::from)
    }

    /// Runs the compact decoder over raw block 3 or block 5.
    pub fn decode_block(&self, kind: BlockKind) -> Result<DecodedStream, CoreError> {
        if kind.is_compressed() {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                format!("{kind} is compressed; decompress it before decoding"),
            ));
        }
        compact::decode(self.block_bytes(kind)).map_err(CoreError::from)
    }

    pub fn apply_edits<C: BlockCodec + ?Sized>(
        &self,
        edits: &[FieldEdit],
        codec: &C,
    ) -> Result<(Vec<u8>, PatchReport), CoreError> {
        let container = self.container()?;
        let outcome = apply_patch(&container, edits, codec)?;
        let report = PatchReport::from_outcome(self.bytes.len(), &outcome);
        Ok((outcome.bytes, report))
    }

    pub fn unlock_capes<C: BlockCodec + ?Sized>(
        &self,
        unlock: &CapeUnlock,
        codec: &C,
    ) -> Result<(Vec<u8>, PatchReport), CoreError> {
        let container = self.container()?;
        let outcome = unlock.apply(&container, codec)?;
        let mut report = PatchReport::from_outcome(self.bytes.len(), &outcome);
        report.capes = unlock.flags(&outcome);
        Ok((outcome.bytes, report))
    }
}
