//! In-memory blob storage adapter.
//!
//! Backs host builds and tests with a plain map. Namespacing matches the
//! on-device layout so level blobs land under the same composite keys.

use std::collections::HashMap;

use crate::app::ports::{StorageError, StoragePort};

/// Volatile [`StoragePort`] backend.
#[derive(Debug, Default)]
pub struct MemStorage {
    store: HashMap<String, Vec<u8>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{namespace}::{key}")
    }
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.store
            .get(&Self::composite_key(namespace, key))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.store
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store
            .contains_key(&Self::composite_key(namespace, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_round_trip() {
        let mut mem = MemStorage::new();
        mem.write("conf", "level8", b"payload").unwrap();
        assert!(mem.exists("conf", "level8"));
        assert_eq!(mem.read("conf", "level8").unwrap(), b"payload");

        mem.delete("conf", "level8").unwrap();
        assert!(!mem.exists("conf", "level8"));
    }

    #[test]
    fn missing_key_is_not_found() {
        let mem = MemStorage::new();
        assert_eq!(mem.read("conf", "nope"), Err(StorageError::NotFound));
    }

    #[test]
    fn delete_missing_key_is_ok() {
        let mut mem = MemStorage::new();
        assert_eq!(mem.delete("conf", "nope"), Ok(()));
    }

    #[test]
    fn namespace_isolation() {
        let mut mem = MemStorage::new();
        mem.write("ns_a", "key", b"alpha").unwrap();
        mem.write("ns_b", "key", b"bravo").unwrap();
        assert_eq!(mem.read("ns_a", "key").unwrap(), b"alpha");
        assert_eq!(mem.read("ns_b", "key").unwrap(), b"bravo");
    }
}
