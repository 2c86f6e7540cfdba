mod codec;

use std::ffi::OsString;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use acb_core::capes::CapeUnlock;
use acb_core::compact::{self, DecodedStream};
use acb_core::container::BlockKind;
use acb_core::core_api::{Engine, PatchReport, Session};
use acb_core::patch::FieldEdit;
use acb_render::{
    DecodeRenderOptions, render_decode_json, render_decode_text, render_layout_json,
    render_layout_text, render_patch_json, render_patch_text,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use codec::ExternalCodec;
use serde_json::Value as JsonValue;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "acb-save",
    author,
    version,
    about = "Inspect and patch Assassin's Creed Brotherhood SAV files"
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show block boundaries, region headers and the block 4 checksum
    Info {
        #[arg(value_name = "SAV")]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write each block's stored bytes to DIR/block1.bin .. block5.bin
    Extract {
        #[arg(value_name = "SAV")]
        path: PathBuf,
        #[arg(long, value_name = "DIR")]
        out_dir: PathBuf,
    },
    /// Decode compact-format records from a raw block file, or from block 3
    /// or 5 of a SAV
    Decode {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long, value_name = "3|5", value_parser = parse_raw_block)]
        block: Option<BlockKind>,
        /// List every decoded entry
        #[arg(long)]
        entries: bool,
        /// Group table references, extended values and array clusters
        #[arg(long)]
        analyze: bool,
        #[arg(long)]
        json: bool,
    },
    /// Set bytes in decompressed block payloads and rebuild the file
    Patch {
        #[arg(value_name = "SAV")]
        path: PathBuf,
        #[arg(
            long = "set",
            value_name = "BLOCK:OFFSET=BYTE",
            value_parser = parse_edit,
            required = true
        )]
        edits: Vec<FieldEdit>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Set both bonus cape flags in block 4
    UnlockCapes {
        #[arg(value_name = "SAV")]
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Output path; defaults to the input name with a suffix before the
    /// extension
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Program providing LZSS decompress, compress and header building
    #[arg(long, env = "ACB_CODEC", value_name = "PROGRAM")]
    codec: PathBuf,
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info { path, json } => run_info(&path, json),
        Commands::Extract { path, out_dir } => run_extract(&path, &out_dir),
        Commands::Decode {
            path,
            block,
            entries,
            analyze,
            json,
        } => run_decode(
            &path,
            block,
            DecodeRenderOptions {
                entries,
                analysis: analyze,
            },
            json,
        ),
        Commands::Patch {
            path,
            edits,
            output,
        } => {
            let session = open_session(&path);
            let codec = ExternalCodec::new(&output.codec);
            let (bytes, report) = session
                .apply_edits(&edits, &codec)
                .unwrap_or_else(|e| fail("Error patching save", e));
            finish_patch(&path, &output, "patched", &bytes, &report);
        }
        Commands::UnlockCapes { path, output } => {
            let session = open_session(&path);
            let codec = ExternalCodec::new(&output.codec);
            let (bytes, report) = session
                .unlock_capes(&CapeUnlock::default(), &codec)
                .unwrap_or_else(|e| fail("Error unlocking capes", e));
            finish_patch(&path, &output, "unlocked", &bytes, &report);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(context: &str, err: impl Display) -> ! {
    eprintln!("{context}: {err}");
    process::exit(1);
}

fn open_session(path: &Path) -> Session {
    Engine::new()
        .open_path(path)
        .unwrap_or_else(|e| fail(&format!("Error parsing {}", path.display()), e))
}

fn run_info(path: &Path, json: bool) {
    let session = open_session(path);
    if json {
        print_json(&render_layout_json(session.snapshot()));
    } else {
        print!("{}", render_layout_text(session.snapshot()));
    }
}

fn run_extract(path: &Path, out_dir: &Path) {
    let session = open_session(path);
    fs::create_dir_all(out_dir)
        .unwrap_or_else(|e| fail(&format!("Error creating {}", out_dir.display()), e));

    for kind in BlockKind::ALL {
        let bytes = session.block_bytes(kind);
        let out_path = out_dir.join(format!("block{}.bin", kind.number()));
        fs::write(&out_path, bytes)
            .unwrap_or_else(|e| fail(&format!("Error writing {}", out_path.display()), e));
        println!("{} ({} bytes)", out_path.display(), bytes.len());
    }
}

fn run_decode(path: &Path, block: Option<BlockKind>, options: DecodeRenderOptions, json: bool) {
    let decoded: DecodedStream = match block {
        Some(kind) => open_session(path)
            .decode_block(kind)
            .unwrap_or_else(|e| fail(&format!("Error decoding {kind}"), e)),
        None => {
            let bytes = fs::read(path)
                .unwrap_or_else(|e| fail(&format!("Error reading {}", path.display()), e));
            compact::decode(&bytes)
                .unwrap_or_else(|e| fail(&format!("Error decoding {}", path.display()), e))
        }
    };

    if json {
        let value = render_decode_json(&decoded, options)
            .unwrap_or_else(|e| fail("Error rendering JSON output", e));
        print_json(&value);
    } else {
        print!("{}", render_decode_text(&decoded, options));
    }
}

fn finish_patch(
    input: &Path,
    args: &OutputArgs,
    suffix: &str,
    bytes: &[u8],
    report: &PatchReport,
) {
    if !report.already_applied {
        let out_path = args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(input, suffix));
        fs::write(&out_path, bytes)
            .unwrap_or_else(|e| fail(&format!("Error writing {}", out_path.display()), e));
        info!(path = %out_path.display(), len = bytes.len(), "wrote patched save");
        if !args.json {
            println!("Wrote {}", out_path.display());
        }
    }

    if args.json {
        let value =
            render_patch_json(report).unwrap_or_else(|e| fail("Error rendering JSON output", e));
        print_json(&value);
    } else {
        print!("{}", render_patch_text(report));
    }
}

fn print_json(value: &JsonValue) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => fail("Error rendering JSON output", e),
    }
}

/// `save.sav` becomes `save.<suffix>.sav`; a name without an extension
/// gets `.<suffix>` appended.
fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let mut name = OsString::from(stem);
    name.push(".");
    name.push(suffix);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

fn parse_raw_block(value: &str) -> Result<BlockKind, String> {
    match value {
        "3" => Ok(BlockKind::Block3),
        "5" => Ok(BlockKind::Block5),
        _ => Err(format!(
            "'{value}' is not a raw block; expected 3 or 5 (blocks 1, 2 and 4 are compressed)"
        )),
    }
}

fn parse_number(value: &str) -> Result<usize, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{value}': {e}"))
}

/// Parses `BLOCK:OFFSET=BYTE`, e.g. `4:0x50E0=0x01`.
fn parse_edit(value: &str) -> Result<FieldEdit, String> {
    let (target, byte) = value
        .split_once('=')
        .ok_or_else(|| format!("expected BLOCK:OFFSET=BYTE, got '{value}'"))?;
    let (block, offset) = target
        .split_once(':')
        .ok_or_else(|| format!("expected BLOCK:OFFSET=BYTE, got '{value}'"))?;

    let kind = block
        .parse::<u8>()
        .ok()
        .and_then(BlockKind::from_number)
        .filter(|kind| kind.is_compressed())
        .ok_or_else(|| format!("block '{block}' cannot be patched; expected 1, 2 or 4"))?;
    let offset = parse_number(offset)?;
    let byte = u8::try_from(parse_number(byte)?)
        .map_err(|_| format!("value '{byte}' does not fit in one byte"))?;

    Ok(FieldEdit::new(kind, offset, byte))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use acb_core::container::BlockKind;

    use super::{default_output_path, parse_edit, parse_raw_block};

    #[test]
    fn output_suffix_goes_before_extension() {
        assert_eq!(
            default_output_path(Path::new("/saves/OPTIONS.sav"), "unlocked"),
            PathBuf::from("/saves/OPTIONS.unlocked.sav")
        );
        assert_eq!(
            default_output_path(Path::new("slot1"), "patched"),
            PathBuf::from("slot1.patched")
        );
    }

    #[test]
    fn parses_hex_and_decimal_edits() {
        let edit = parse_edit("4:0x50E0=0x01").unwrap();
        assert_eq!(edit.block, BlockKind::Block4);
        assert_eq!(edit.offset, 0x50E0);
        assert_eq!(edit.value, 1);

        let edit = parse_edit("2:16=255").unwrap();
        assert_eq!(edit.block, BlockKind::Block2);
        assert_eq!(edit.offset, 16);
        assert_eq!(edit.value, 0xFF);
    }

    #[test]
    fn rejects_raw_blocks_and_wide_values() {
        assert!(parse_edit("3:0=1").is_err());
        assert!(parse_edit("4:0=256").is_err());
        assert!(parse_edit("4:0").is_err());
        assert!(parse_raw_block("4").is_err());
        assert_eq!(parse_raw_block("5"), Ok(BlockKind::Block5));
    }
}
