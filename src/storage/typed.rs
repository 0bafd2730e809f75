use super::Store;

/// A key-value store that transparently handles serialization/deserialization.
///
/// Stored values are system-written, so a value that fails to decode is
/// corrupted state and decoding panics rather than returning an error.
pub struct TypedStore<S: Store> {
    parent: S,
}

impl<S: Store> TypedStore<S> {
    /// Create a new typed store.
    pub fn new(parent: S) -> Self {
        Self { parent }
    }

    /// Fetch entry with given key.
    pub fn get<K: AsRef<[u8]>, T: cbor::Decode>(&self, key: K) -> Option<T> {
        self.parent
            .get(key.as_ref())
            .map(|data| cbor::from_slice(&data).unwrap())
    }

    /// Update entry with given key to the given value.
    pub fn insert<K: AsRef<[u8]>, T: cbor::Encode>(&mut self, key: K, value: T) {
        self.parent.insert(key.as_ref(), &cbor::to_vec(value))
    }

    /// Remove entry with given key.
    pub fn remove<K: AsRef<[u8]>>(&mut self, key: K) {
        self.parent.remove(key.as_ref())
    }
}
