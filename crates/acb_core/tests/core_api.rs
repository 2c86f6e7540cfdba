mod common;

use acb_core::capes::CapeUnlock;
use acb_core::container::BlockKind;
use acb_core::core_api::{CoreErrorCode, Engine};
use acb_core::patch::FieldEdit;
use common::{RleCodec, SaveBuilder};

#[test]
fn engine_reports_blocks_and_regions() {
    let bytes = SaveBuilder::default().build();
    let session = Engine::new().open_bytes(bytes.clone()).expect("open save");
    let snapshot = session.snapshot();

    assert_eq!(snapshot.file_len, bytes.len());
    assert_eq!(snapshot.blocks.len(), 5);
    assert_eq!(snapshot.blocks[0].start, 0);
    assert_eq!(snapshot.blocks[4].end, bytes.len());
    assert_eq!(snapshot.blocks[0].header_len, 44);
    assert_eq!(snapshot.blocks[2].header_len, 0);
    assert!(snapshot.blocks[3].compressed);
    assert_eq!(snapshot.regions.len(), 4);
    assert_eq!(snapshot.regions[0].offset_in_block3, 0);
    assert_eq!(
        snapshot.regions[3].declared_size as usize,
        snapshot.blocks[3].len()
    );
    assert!(snapshot.block4_checksum.is_valid());
}

#[test]
fn engine_rejects_truncated_input() {
    let err = Engine::new().open_bytes(vec![0u8; 16]).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::MalformedContainer);
}

#[test]
fn session_decodes_raw_blocks_only() {
    let session = Engine::new()
        .open_bytes(SaveBuilder::default().build())
        .unwrap();
    let decoded = session.decode_block(BlockKind::Block5).unwrap();
    assert_eq!(decoded.entries.len(), 3);

    let err = session.decode_block(BlockKind::Block4).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);

    let block4 = session
        .decompress_block(BlockKind::Block4, &RleCodec)
        .unwrap();
    assert_eq!(block4.len(), 0x5100);
}

#[test]
fn session_patch_reports_changes() {
    let session = Engine::new()
        .open_bytes(SaveBuilder::default().build())
        .unwrap();
    let edits = [FieldEdit::new(BlockKind::Block4, 0x40, 0x05)];
    let (bytes, report) = session.apply_edits(&edits, &RleCodec).unwrap();

    assert_eq!(report.output_len, bytes.len());
    assert_eq!(report.changed_edits(), 1);
    assert!(report.region4_size.is_some());
    assert_eq!(report.rebuilt_headers, vec![2]);
    assert!(report.capes.is_empty());

    let reopened = Engine::new().open_bytes(bytes).unwrap();
    assert!(reopened.snapshot().block4_checksum.is_valid());
}

#[test]
fn session_unlocks_capes() {
    let session = Engine::new()
        .open_bytes(SaveBuilder::default().build())
        .unwrap();
    let (_, report) = session
        .unlock_capes(&CapeUnlock::default(), &RleCodec)
        .unwrap();
    assert_eq!(report.capes.len(), 2);
    assert!(!report.already_applied);
}
