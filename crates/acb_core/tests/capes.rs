mod common;

use acb_core::capes::{CAPE1_OFFSET, CAPE2_OFFSET, CapeUnlock};
use acb_core::codec::BlockCodec;
use acb_core::container::{BlockKind, Container};
use common::{RleCodec, SaveBuilder};

#[test]
fn unlock_flips_both_flags_and_reports_previous_values() {
    let bytes = SaveBuilder::default().build();
    let container = Container::split(&bytes).unwrap();
    let unlock = CapeUnlock::default();

    let outcome = unlock.apply(&container, &RleCodec).unwrap();
    let flags = unlock.flags(&outcome);
    assert_eq!(flags.len(), 2);
    assert_eq!(flags[0].index, 1);
    assert_eq!(flags[0].offset, CAPE1_OFFSET);
    assert_eq!(flags[1].offset, CAPE2_OFFSET);
    assert!(flags.iter().all(|f| f.previous == 0x00 && f.value == 0x01));

    let patched = Container::split(&outcome.bytes).unwrap();
    let block4 = RleCodec
        .decompress(BlockKind::Block4, patched.block(BlockKind::Block4).raw())
        .unwrap();
    assert_eq!(block4[CAPE1_OFFSET], 0x01);
    assert_eq!(block4[CAPE2_OFFSET], 0x01);
    assert!(patched.verify_block4_checksum().is_valid());
}

#[test]
fn unlocking_an_unlocked_save_changes_nothing() {
    let mut builder = SaveBuilder::default();
    builder.block4[CAPE1_OFFSET] = 0x01;
    builder.block4[CAPE2_OFFSET] = 0x01;
    let bytes = builder.build();

    let outcome = CapeUnlock::default()
        .apply(&Container::split(&bytes).unwrap(), &RleCodec)
        .unwrap();
    assert!(outcome.already_applied);
    assert_eq!(outcome.bytes, bytes);
}

#[test]
fn offsets_are_configurable() {
    let bytes = SaveBuilder::default().build();
    let unlock = CapeUnlock {
        offsets: [0x10, 0x20],
        value: 0x02,
    };
    let edits = unlock.edits();
    assert_eq!(edits[1].offset, 0x20);
    assert!(edits.iter().all(|e| e.block == BlockKind::Block4 && e.value == 0x02));

    let outcome = unlock
        .apply(&Container::split(&bytes).unwrap(), &RleCodec)
        .unwrap();
    assert_eq!(unlock.flags(&outcome)[1].offset, 0x20);
}
