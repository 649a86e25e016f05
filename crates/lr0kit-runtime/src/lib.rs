//! Runtime implementation for the `lr0kit` parse tables.

pub mod definition;
pub mod parser;
pub mod table;

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;
type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
