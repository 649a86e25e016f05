//! Utility types.

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Insertion-ordered hash map, so iteration never depends on hash values.
pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;

/// Insertion-ordered hash set.
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;
