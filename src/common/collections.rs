//! Hashing collections used throughout the engine. FxHash is plenty for
//! short column-id keys and keeps iteration cheap in the hot drop path.

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;
