use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hex_bytes::HexBytes;

/// Metadata documents keyed by manifest name. Values are raw signed bytes.
pub type MetaMap = BTreeMap<String, Vec<u8>>;

/// The commit-time hash set: repository-relative `/`-separated path to the
/// hashes of that file.
///
/// Keys cover target files (`targets/foo.txt`) as well as metadata documents
/// other than the timestamp (`snapshot.json`, `targets.json`, ...).
pub type TargetHashes = BTreeMap<String, Hashes>;

/// Hash values of one file, keyed by algorithm name (`"sha256"`, `"sha512"`).
///
/// Ordered by algorithm so that every derived list of file names comes out in
/// the same order from run to run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hashes(BTreeMap<String, HexBytes>);

impl Hashes {
    /// Create an empty hash set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a hash value for `algorithm`, replacing any previous value.
    pub fn insert(&mut self, algorithm: impl Into<String>, value: HexBytes) -> Option<HexBytes> {
        self.0.insert(algorithm.into(), value)
    }

    /// Builder-style insert.
    pub fn with(mut self, algorithm: impl Into<String>, value: HexBytes) -> Self {
        self.insert(algorithm, value);
        self
    }

    /// Look up the value for one algorithm.
    pub fn get(&self, algorithm: &str) -> Option<&HexBytes> {
        self.0.get(algorithm)
    }

    /// Iterate `(algorithm, value)` pairs in algorithm order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HexBytes)> {
        self.0.iter().map(|(alg, value)| (alg.as_str(), value))
    }

    /// Iterate hash values in algorithm order.
    pub fn values(&self) -> impl Iterator<Item = &HexBytes> {
        self.0.values()
    }

    /// Returns `true` if some algorithm maps to `value`.
    pub fn contains_value(&self, value: &HexBytes) -> bool {
        self.0.values().any(|v| v == value)
    }

    /// Number of algorithms present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no hash is recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, HexBytes)> for Hashes {
    fn from_iter<I: IntoIterator<Item = (String, HexBytes)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_is_ordered_by_algorithm() {
        let hashes = Hashes::new()
            .with("sha512", HexBytes::new(vec![2]))
            .with("sha256", HexBytes::new(vec![1]));
        let algs: Vec<&str> = hashes.iter().map(|(alg, _)| alg).collect();
        assert_eq!(algs, vec!["sha256", "sha512"]);
    }

    #[test]
    fn insert_replaces_value() {
        let mut hashes = Hashes::new();
        assert!(hashes.insert("sha256", HexBytes::new(vec![1])).is_none());
        let old = hashes.insert("sha256", HexBytes::new(vec![2]));
        assert_eq!(old, Some(HexBytes::new(vec![1])));
        assert_eq!(hashes.len(), 1);
        assert!(hashes.contains_value(&HexBytes::new(vec![2])));
        assert!(!hashes.contains_value(&HexBytes::new(vec![1])));
    }

    #[test]
    fn target_hashes_json_shape() {
        let json = r#"{
            "targets/foo.txt": {"sha256": "abcd", "sha512": "ef01"},
            "snapshot.json": {"sha256": "0102"}
        }"#;
        let hashes: TargetHashes = serde_json::from_str(json).unwrap();
        assert_eq!(hashes.len(), 2);
        let foo = &hashes["targets/foo.txt"];
        assert_eq!(foo.get("sha256").unwrap().to_hex(), "abcd");
        assert_eq!(foo.get("sha512").unwrap().as_bytes(), &[0xef, 0x01]);
    }

    #[test]
    fn empty_hashes_serialize_as_empty_object() {
        let json = serde_json::to_string(&Hashes::new()).unwrap();
        assert_eq!(json, "{}");
    }
}
