use std::sync::Arc;

use crate::dict::{BufferFile, DictError, Dictionaries, RecordDictionary};
use crate::testutil::{build_test_dictionaries, test_dictionaries};
use crate::TokenizerBuilder;

const SUMOMO: &str = "すもももももももものうち";

fn assert_same_analysis(a: Arc<Dictionaries>, b: Arc<Dictionaries>) {
    let ta = TokenizerBuilder::new().dictionaries(a).build().unwrap();
    let tb = TokenizerBuilder::new().dictionaries(b).build().unwrap();
    for text in [SUMOMO, "となりのトトロ", "𠮷野屋、ABC123。"] {
        assert_eq!(ta.tokenize(text), tb.tokenize(text));
    }
}

#[test]
fn test_buffers_roundtrip() {
    let dict = test_dictionaries();
    let buffers = dict.to_buffers();
    let loaded = Dictionaries::from_buffers(&buffers).unwrap();
    assert_eq!(loaded.to_buffers(), buffers);
    assert!(!loaded.connection().is_mapped());
    assert_same_analysis(dict, Arc::new(loaded));
}

#[test]
fn test_save_and_open_dir() {
    let dir = tempfile::tempdir().unwrap();
    let dict = test_dictionaries();
    dict.save_dir(dir.path()).unwrap();
    for f in BufferFile::ALL {
        assert!(dir.path().join(f.file_name()).is_file(), "{}", f.file_name());
    }

    let loaded = Dictionaries::open_dir(dir.path()).unwrap();
    assert!(loaded.connection().is_mapped());
    assert_eq!(loaded.to_buffers(), dict.to_buffers());
    assert_eq!(
        loaded.connection().cost(2, 3),
        dict.connection().cost(2, 3)
    );
    assert_same_analysis(dict, Arc::new(loaded));
}

#[test]
fn test_open_dir_rejects_bad_connection_header() {
    let dir = tempfile::tempdir().unwrap();
    build_test_dictionaries().save_dir(dir.path()).unwrap();
    std::fs::write(dir.path().join(BufferFile::ConnectionCosts.file_name()), [1u8]).unwrap();
    assert!(matches!(
        Dictionaries::open_dir(dir.path()),
        Err(DictError::InvalidHeader)
    ));
}

#[test]
fn test_open_dir_missing_buffer() {
    let dir = tempfile::tempdir().unwrap();
    build_test_dictionaries().save_dir(dir.path()).unwrap();
    std::fs::remove_file(dir.path().join(BufferFile::UnknownMap.file_name())).unwrap();
    match Dictionaries::open_dir(dir.path()) {
        Err(DictError::MissingBuffer(name)) => assert!(name.ends_with("unk_map.dat")),
        other => panic!("expected MissingBuffer, got {other:?}"),
    }
}

#[test]
fn test_bundle_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ipadic.ktdx");
    let dict = test_dictionaries();
    dict.save(&path).unwrap();

    let loaded = Dictionaries::open(&path).unwrap();
    assert_eq!(loaded.to_buffers(), dict.to_buffers());

    let via_path = Dictionaries::open_path(&path).unwrap();
    assert_same_analysis(dict, Arc::new(via_path));
}

#[test]
fn test_open_path_dispatches_on_directory() {
    let dir = tempfile::tempdir().unwrap();
    test_dictionaries().save_dir(dir.path()).unwrap();
    let loaded = Dictionaries::open_path(dir.path()).unwrap();
    let trie_id = loaded.trie().lookup("すもも").unwrap();
    assert_eq!(loaded.token_info().token_info_ids(trie_id).len(), 1);
}

#[test]
fn test_bundle_rejects_bad_header() {
    let bytes = test_dictionaries().to_bytes().unwrap();

    assert!(matches!(
        Dictionaries::from_bytes(&bytes[..6]),
        Err(DictError::InvalidHeader)
    ));

    let mut bad_magic = bytes.clone();
    bad_magic[0] = b'X';
    assert!(matches!(
        Dictionaries::from_bytes(&bad_magic),
        Err(DictError::InvalidMagic)
    ));

    let mut bad_version = bytes.clone();
    bad_version[4] = 9;
    assert!(matches!(
        Dictionaries::from_bytes(&bad_version),
        Err(DictError::UnsupportedVersion(9))
    ));
}

#[test]
fn test_bundle_rejects_truncation_and_corruption() {
    let bytes = test_dictionaries().to_bytes().unwrap();

    let truncated = &bytes[..bytes.len() - 1];
    assert!(matches!(
        Dictionaries::from_bytes(truncated),
        Err(DictError::Truncated { .. })
    ));

    // Flip a byte in the middle of the payload.
    let mut corrupt = bytes.clone();
    let mid = corrupt.len() / 2;
    corrupt[mid] ^= 0xFF;
    assert!(matches!(
        Dictionaries::from_bytes(&corrupt),
        Err(DictError::Checksum { .. })
    ));
}

#[test]
fn test_from_buffers_rejects_bad_trie() {
    let mut buffers = test_dictionaries().to_buffers();
    buffers[0].pop();
    assert!(matches!(
        Dictionaries::from_buffers(&buffers),
        Err(DictError::Trie(_))
    ));
}
