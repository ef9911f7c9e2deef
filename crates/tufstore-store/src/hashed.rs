//! Hash-prefixed file names for consistent snapshots.
//!
//! A hashed copy of `targets/foo.txt` with sha256 value `H` lives next to the
//! original as `targets/H.foo.txt`. [`encode_name`] and [`decode_name`] are
//! inverses: `decode_name(&encode_name(n, h)) == Some((h, n))` for every
//! non-empty hash `h` and non-empty name `n`.
//!
//! Decoding requires the segment before the first `.` to be a non-empty,
//! even-length run of hex digits and the rest to be non-empty. A name that
//! fails this (`README`, `foo.txt`, `.hidden`) carries no hash prefix.

use tufstore_types::HexBytes;

use crate::paths::{join, split_file_name};

/// Separator between the hash value and the original file name.
pub const DELIMITER: char = '.';

/// Physical file name for `file_name` hashed to `hash`.
pub fn encode_name(file_name: &str, hash: &HexBytes) -> String {
    format!("{}{DELIMITER}{file_name}", hash.to_hex())
}

/// Recover `(hash, original file name)` from a physical file name.
pub fn decode_name(file_name: &str) -> Option<(HexBytes, String)> {
    let (prefix, rest) = file_name.split_once(DELIMITER)?;
    if prefix.is_empty()
        || rest.is_empty()
        || prefix.len() % 2 != 0
        || !prefix.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }
    let hash = HexBytes::from_hex(prefix).ok()?;
    Some((hash, rest.to_string()))
}

/// Sibling path of `path` hashed to `hash`.
pub fn hashed_path(path: &str, hash: &HexBytes) -> String {
    let (dir, name) = split_file_name(path);
    join(dir, &encode_name(name, hash))
}

/// Recover `(hash, logical path)` from a hashed repository path.
pub fn logical_path(path: &str) -> Option<(HexBytes, String)> {
    let (dir, name) = split_file_name(path);
    let (hash, original) = decode_name(name)?;
    Some((hash, join(dir, &original)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn h(bytes: &[u8]) -> HexBytes {
        HexBytes::new(bytes.to_vec())
    }

    #[test]
    fn encode_prefixes_hex_value() {
        assert_eq!(encode_name("foo.txt", &h(&[0xab, 0xcd])), "abcd.foo.txt");
    }

    #[test]
    fn decode_splits_at_first_delimiter() {
        let (hash, name) = decode_name("abcd.foo.tar.gz").unwrap();
        assert_eq!(hash, h(&[0xab, 0xcd]));
        assert_eq!(name, "foo.tar.gz");
    }

    #[test]
    fn decode_extensionless_hashed_name() {
        let (hash, name) = decode_name("0102.README").unwrap();
        assert_eq!(hash, h(&[1, 2]));
        assert_eq!(name, "README");
    }

    #[test]
    fn names_without_prefix_do_not_decode() {
        assert!(decode_name("README").is_none());
        assert!(decode_name("foo.txt").is_none());
        assert!(decode_name(".hidden").is_none());
        assert!(decode_name("abcd.").is_none());
        assert!(decode_name("abc.foo").is_none()); // odd-length prefix
        assert!(decode_name("").is_none());
    }

    #[test]
    fn hashed_path_stays_in_directory() {
        assert_eq!(
            hashed_path("targets/a/foo.txt", &h(&[0xff])),
            "targets/a/ff.foo.txt"
        );
        assert_eq!(hashed_path("snapshot.json", &h(&[0x01])), "01.snapshot.json");
    }

    #[test]
    fn logical_path_strips_prefix() {
        let (hash, logical) = logical_path("targets/a/ff.foo.txt").unwrap();
        assert_eq!(hash, h(&[0xff]));
        assert_eq!(logical, "targets/a/foo.txt");
        assert!(logical_path("targets/a/foo.txt").is_none());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            name in "[A-Za-z0-9_.-]{1,40}",
            hash in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            let hash = HexBytes::new(hash);
            let encoded = encode_name(&name, &hash);
            prop_assert_eq!(decode_name(&encoded), Some((hash, name)));
        }

        #[test]
        fn logical_path_inverts_hashed_path(
            dir in "(targets(/[a-z0-9]{1,8}){0,3})?",
            name in "[A-Za-z0-9_.-]{1,24}",
            hash in proptest::collection::vec(any::<u8>(), 1..48),
        ) {
            let hash = HexBytes::new(hash);
            let path = join(&dir, &name);
            let hashed = hashed_path(&path, &hash);
            prop_assert_eq!(logical_path(&hashed), Some((hash, path)));
        }
    }
}
