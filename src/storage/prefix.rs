use super::Store;

/// A key-value store that prefixes all keys with the given prefix.
pub struct PrefixStore<S: Store, P: AsRef<[u8]>> {
    parent: S,
    prefix: P,
}

impl<S: Store, P: AsRef<[u8]>> PrefixStore<S, P> {
    /// Create a new prefix store with the given prefix.
    pub fn new(parent: S, prefix: P) -> Self {
        Self { parent, prefix }
    }
}

impl<S: Store, P: AsRef<[u8]>> Store for PrefixStore<S, P> {
    fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<Vec<u8>> {
        self.parent.get([self.prefix.as_ref(), key.as_ref()].concat())
    }

    fn insert<K: AsRef<[u8]>>(&mut self, key: K, value: &[u8]) {
        self.parent
            .insert([self.prefix.as_ref(), key.as_ref()].concat(), value);
    }

    fn remove<K: AsRef<[u8]>>(&mut self, key: K) {
        self.parent
            .remove([self.prefix.as_ref(), key.as_ref()].concat());
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_> {
        let prefix = self.prefix.as_ref();
        Box::new(
            self.parent
                .iter()
                .filter(move |(key, _)| key.starts_with(prefix))
                .map(move |(key, value)| (key[prefix.len()..].to_vec(), value)),
        )
    }
}

#[cfg(test)]
mod test {
    use crate::{storage::MemStore, testing::mock};

    use super::*;

    #[test]
    fn test_prefix_isolation() {
        let mut store = mock::empty_store();

        PrefixStore::new(&mut store, "a").insert(b"key", b"under a");
        PrefixStore::new(&mut store, "b").insert(b"key", b"under b");

        assert_eq!(
            PrefixStore::new(&mut store, "a").get(b"key"),
            Some(b"under a".to_vec()),
        );
        assert_eq!(
            PrefixStore::new(&mut store, "b").get(b"key"),
            Some(b"under b".to_vec()),
        );
        assert_eq!(PrefixStore::new(&mut store, "c").get(b"key"), None);
    }

    #[test]
    fn test_iter_strips_prefix() {
        let mut store = MemStore::new();
        store.insert(b"outside", b"x");

        let mut prefixed = PrefixStore::new(&mut store, "pre/");
        prefixed.insert(b"one", b"1");
        prefixed.insert(b"two", b"2");

        let entries: Vec<_> = prefixed.iter().collect();
        assert_eq!(
            entries,
            vec![
                (b"one".to_vec(), b"1".to_vec()),
                (b"two".to_vec(), b"2".to_vec()),
            ],
        );
    }

    #[test]
    fn test_nested_prefixes() {
        let mut store = MemStore::new();

        let outer = PrefixStore::new(&mut store, "outer/");
        let mut inner = PrefixStore::new(outer, "inner/");
        inner.insert(b"key", b"value");

        assert_eq!(store.get(b"outer/inner/key"), Some(b"value".to_vec()));
    }
}
