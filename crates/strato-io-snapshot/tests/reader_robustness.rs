use proptest::prelude::*;
use strato_io_snapshot::io::state::{
    SnapshotError, SnapshotReader, SnapshotVersion, SnapshotWriter, SNAPSHOT_MAGIC,
};

const ID: [u8; 4] = *b"DEVX";

#[test]
fn reader_rejects_bad_magic() {
    let mut bytes = SnapshotWriter::new(ID, SnapshotVersion::new(1, 0)).finish();
    bytes[0] ^= 0xFF;
    assert_eq!(
        SnapshotReader::parse(&bytes, ID).unwrap_err(),
        SnapshotError::InvalidMagic
    );
}

#[test]
fn reader_rejects_unknown_format_major() {
    let mut bytes = SnapshotWriter::new(ID, SnapshotVersion::new(1, 0)).finish();
    bytes[4] = 9;
    assert_eq!(
        SnapshotReader::parse(&bytes, ID).unwrap_err(),
        SnapshotError::UnsupportedFormatVersion { major: 9, minor: 0 }
    );
}

#[test]
fn reader_rejects_duplicate_tags() {
    let mut bytes = SnapshotWriter::new(ID, SnapshotVersion::new(1, 0)).finish();
    for _ in 0..2 {
        bytes.extend_from_slice(&5u16.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.push(0);
    }
    assert_eq!(
        SnapshotReader::parse(&bytes, ID).unwrap_err(),
        SnapshotError::DuplicateFieldTag(5)
    );
}

#[test]
fn reader_skips_unknown_tags() {
    let mut w = SnapshotWriter::new(ID, SnapshotVersion::new(1, 2));
    w.field_u32(1, 0xDEAD_BEEF);
    w.field_bytes(0x7FFF, vec![1, 2, 3, 4, 5]);
    let bytes = w.finish();

    let r = SnapshotReader::parse(&bytes, ID).expect("snapshot should parse");
    assert_eq!(&bytes[0..4], &SNAPSHOT_MAGIC);
    assert_eq!(r.u32(1).unwrap(), Some(0xDEAD_BEEF));
    r.ensure_device_major(1).expect("minor bumps are compatible");
}

proptest! {
    #[test]
    fn parse_never_panics_on_arbitrary_input(tail in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut bytes = SnapshotWriter::new(ID, SnapshotVersion::new(1, 0)).finish();
        bytes.extend_from_slice(&tail);
        if let Ok(r) = SnapshotReader::parse(&bytes, ID) {
            for tag in 0..8u16 {
                let _ = r.u8(tag);
                let _ = r.u32(tag);
                let _ = r.bool(tag);
            }
        }
    }

    #[test]
    fn parse_never_panics_on_raw_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = SnapshotReader::parse(&bytes, ID);
    }
}
