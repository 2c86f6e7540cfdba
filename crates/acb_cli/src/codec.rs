use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;

use acb_core::codec::{BLOCK_HEADER_LEN, BlockCodec, CompressionStats, Compressed};
use acb_core::container::BlockKind;
use acb_core::error::{Result, SaveError};
use tracing::debug;

/// [`BlockCodec`] backed by a helper program.
///
/// `PROGRAM decompress` and `PROGRAM compress` filter stdin to stdout.
/// `PROGRAM header <block> <decompressed-size> [<running-total>]` reads the
/// compressed payload on stdin and writes the 44-byte header.
#[derive(Debug, Clone)]
pub struct ExternalCodec {
    program: PathBuf,
}

impl ExternalCodec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[String], input: &[u8]) -> io::Result<Output> {
        debug!(program = %self.program.display(), ?args, input_len = input.len(), "running codec");
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("failed to start codec {}: {e}", self.program.display()),
                )
            })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("codec stdin was not captured"))?;

        // Feed stdin from a second thread so a codec that writes before it
        // finishes reading cannot deadlock on a full pipe.
        thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(input));
            let output = child.wait_with_output()?;
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("codec stdin writer panicked")));
            if output.status.success() {
                written?;
            }
            Ok(output)
        })
    }

    fn failure(&self, action: &str, output: &Output) -> String {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            format!("codec {action} exited with {}", output.status)
        } else {
            format!("codec {action} exited with {}: {stderr}", output.status)
        }
    }
}

impl BlockCodec for ExternalCodec {
    fn decompress(&self, block: BlockKind, compressed: &[u8]) -> Result<Vec<u8>> {
        let output = self.run(&["decompress".to_string()], compressed)?;
        if !output.status.success() {
            return Err(SaveError::CorruptStream {
                block,
                reason: self.failure("decompress", &output),
            });
        }
        Ok(output.stdout)
    }

    fn compress(&self, _block: BlockKind, payload: &[u8]) -> Result<Compressed> {
        let output = self.run(&["compress".to_string()], payload)?;
        if !output.status.success() {
            return Err(io::Error::other(self.failure("compress", &output)).into());
        }
        let ratio = if payload.is_empty() {
            1.0
        } else {
            output.stdout.len() as f64 / payload.len() as f64
        };
        Ok(Compressed {
            bytes: output.stdout,
            stats: CompressionStats {
                match_count: 0,
                ratio,
            },
        })
    }

    fn build_header(
        &self,
        block: BlockKind,
        compressed: &[u8],
        decompressed_len: usize,
        running_total: Option<usize>,
    ) -> Result<[u8; BLOCK_HEADER_LEN]> {
        let mut args = vec![
            "header".to_string(),
            block.number().to_string(),
            decompressed_len.to_string(),
        ];
        if let Some(total) = running_total {
            args.push(total.to_string());
        }

        let output = self.run(&args, compressed)?;
        if !output.status.success() {
            return Err(io::Error::other(self.failure("header", &output)).into());
        }
        <[u8; BLOCK_HEADER_LEN]>::try_from(output.stdout.as_slice()).map_err(|_| {
            SaveError::StructuralMismatch(format!(
                "codec header for {block} is {} bytes, expected {BLOCK_HEADER_LEN}",
                output.stdout.len()
            ))
        })
    }
}
