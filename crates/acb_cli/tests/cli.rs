use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use acb_core::codec::checksum;
use serde_json::Value;

const CAPE1: usize = 0x50E0;
const CAPE2: usize = 0x50F2;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_acb-save"))
        .args(args)
        .env_remove("ACB_CODEC")
        .output()
        .expect("failed to run acb-save CLI")
}

fn temp_path(prefix: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.{ext}", std::process::id(), nanos))
}

fn block_header(payload_len: usize) -> Vec<u8> {
    let mut header = vec![0u8; 44];
    header[0x20..0x24].copy_from_slice(&(payload_len as u32).to_le_bytes());
    header
}

fn region(size: usize, checksum: u32) -> Vec<u8> {
    let mut out = vec![0x01];
    out.extend_from_slice(&(size as u32).to_le_bytes()[..3]);
    out.extend_from_slice(&[0x00, 0x00, 0x80, 0x00, 0x00]);
    out.extend_from_slice(&checksum.to_le_bytes());
    out
}

const BLOCK5: [u8; 18] = [
    0x01, 0x0B, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x08, 0x03, 0x16, 0x02, 0x1C, 0x04, 0x0A,
    0x34, 0x12, 0xCD,
];

/// Save whose "compressed" blocks are stored verbatim, to pair with a
/// pass-through codec.
fn synthetic_save() -> Vec<u8> {
    let block4 = vec![0u8; 0x5100];
    let region_payload = [0x08, 0x03, 0x16, 0x01, 0x6D];

    let mut out = block_header(16);
    out.extend_from_slice(&[0xA1; 16]);
    out.extend_from_slice(&block_header(24));
    out.extend_from_slice(&[0xB2; 24]);
    for _ in 0..3 {
        out.extend_from_slice(&region(region_payload.len(), checksum(&region_payload)));
        out.extend_from_slice(&region_payload);
    }
    out.extend_from_slice(&region(block4.len(), checksum(&block4)));
    out.extend_from_slice(&block4);
    out.extend_from_slice(&BLOCK5);
    out
}

fn write_save(prefix: &str) -> PathBuf {
    let path = temp_path(prefix, "sav");
    fs::write(&path, synthetic_save()).expect("failed to write synthetic save");
    path
}

#[test]
fn info_json_reports_five_blocks_and_valid_checksum() {
    let path = write_save("acb_info");
    let output = run_cli(&["info", "--json", path.to_str().unwrap()]);
    let _ = fs::remove_file(&path);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["blocks"].as_array().map(Vec::len), Some(5));
    assert_eq!(json["regions"][3]["declared_size"], 0x5100);
    assert_eq!(json["block4_checksum"]["valid"], true);
}

#[test]
fn info_text_prints_tables() {
    let path = write_save("acb_info_text");
    let output = run_cli(&["info", path.to_str().unwrap()]);
    let _ = fs::remove_file(&path);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Block"));
    assert!(stdout.contains("Region"));
    assert!(stdout.contains("[OK]"));
}

#[test]
fn extract_writes_each_block() {
    let path = write_save("acb_extract");
    let dir = temp_path("acb_extract_dir", "d");
    let output = run_cli(&[
        "extract",
        path.to_str().unwrap(),
        "--out-dir",
        dir.to_str().unwrap(),
    ]);
    let _ = fs::remove_file(&path);
    assert!(output.status.success());

    let block1 = fs::read(dir.join("block1.bin")).expect("block1.bin");
    assert_eq!(block1.len(), 44 + 16);
    let block5 = fs::read(dir.join("block5.bin")).expect("block5.bin");
    assert_eq!(block5, BLOCK5);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn decode_block5_of_a_save() {
    let path = write_save("acb_decode");
    let output = run_cli(&[
        "decode",
        path.to_str().unwrap(),
        "--block",
        "5",
        "--entries",
        "--json",
    ]);
    let _ = fs::remove_file(&path);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["entry_count"], 3);
    assert_eq!(json["entries"][0]["type_name"], "PlayerOptionsElement");
}

#[test]
fn decode_standalone_block_file_with_analysis() {
    let path = temp_path("acb_block", "bin");
    fs::write(
        &path,
        [
            0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x80, 0x00, 0x08, 0x03, 0x05, 0x02, 0x15, 0x00,
            0xAA, 0xBB, 0xCC, 0xDD, 0x6D,
        ],
    )
    .unwrap();
    let output = run_cli(&["decode", path.to_str().unwrap(), "--analyze"]);
    let _ = fs::remove_file(&path);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Entries: 3 (1 markers, 0 unclassified bytes)"));
    assert!(stdout.contains("VALUE_15"));
    assert!(stdout.contains("Table references:"));
}

#[test]
fn decode_rejects_compressed_block_choice() {
    let output = run_cli(&["decode", "whatever.sav", "--block", "4"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn malformed_save_exits_with_error() {
    let path = temp_path("acb_bad", "sav");
    fs::write(&path, vec![0u8; 200]).unwrap();
    let output = run_cli(&["info", path.to_str().unwrap()]);
    let _ = fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("malformed container"));
}

#[test]
fn missing_file_exits_with_error() {
    let output = run_cli(&["info", "/nonexistent/acb/save.sav"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn patch_requires_valid_edit_syntax_and_codec() {
    let path = write_save("acb_patch_args");
    let p = path.to_str().unwrap();

    let bad_edit = run_cli(&["patch", p, "--set", "3:0=1", "--codec", "cat"]);
    assert_eq!(bad_edit.status.code(), Some(2));

    let no_codec = run_cli(&["patch", p, "--set", "4:0=1"]);
    assert_eq!(no_codec.status.code(), Some(2));

    let missing_codec = run_cli(&[
        "patch",
        p,
        "--set",
        "4:0=1",
        "--codec",
        "/nonexistent/acb-codec",
    ]);
    let _ = fs::remove_file(&path);
    assert_eq!(missing_codec.status.code(), Some(1));
}

#[cfg(unix)]
fn pass_through_codec() -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    // Identity "compression"; headers carry the payload size at 0x20.
    let script = r#"#!/bin/sh
case "$1" in
  decompress|compress) exec cat ;;
  header)
    n=$(wc -c | tr -d ' ')
    head -c 32 /dev/zero
    printf "$(printf '\\%03o\\%03o\\%03o\\%03o' $((n & 255)) $((n >> 8 & 255)) $((n >> 16 & 255)) $((n >> 24 & 255)))"
    head -c 8 /dev/zero
    ;;
  *) exit 64 ;;
esac
"#;
    let path = temp_path("acb_codec", "sh");
    fs::write(&path, script).expect("failed to write codec script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
fn read_block4(save: &Path) -> Vec<u8> {
    let bytes = fs::read(save).unwrap();
    let start = bytes.len() - BLOCK5.len() - 0x5100;
    bytes[start..start + 0x5100].to_vec()
}

#[cfg(unix)]
#[test]
fn unlock_capes_and_patch_with_external_codec() {
    let codec = pass_through_codec();
    let codec_arg = codec.to_str().unwrap();
    let path = write_save("acb_unlock");
    let unlocked = path.with_file_name(format!(
        "{}.unlocked.sav",
        path.file_stem().unwrap().to_string_lossy()
    ));

    let output = run_cli(&["unlock-capes", path.to_str().unwrap(), "--codec", codec_arg]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cape 1 (0x50E0): 00 -> 01"));
    assert!(stdout.contains("Cape 2 (0x50F2): 00 -> 01"));

    let block4 = read_block4(&unlocked);
    assert_eq!(block4[CAPE1], 0x01);
    assert_eq!(block4[CAPE2], 0x01);

    let again = run_cli(&[
        "unlock-capes",
        unlocked.to_str().unwrap(),
        "--codec",
        codec_arg,
    ]);
    assert!(again.status.success());
    assert!(String::from_utf8_lossy(&again.stdout).contains("already unlocked"));

    let patched = temp_path("acb_patched", "sav");
    let output = run_cli(&[
        "patch",
        path.to_str().unwrap(),
        "--set",
        "2:0x03=0x7F",
        "-o",
        patched.to_str().unwrap(),
        "--codec",
        codec_arg,
        "--json",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["rebuilt_headers"], serde_json::json!([2]));
    let bytes = fs::read(&patched).unwrap();
    assert_eq!(bytes[44 + 16 + 44 + 3], 0x7F);

    for p in [&codec, &path, &unlocked, &patched] {
        let _ = fs::remove_file(p);
    }
}
