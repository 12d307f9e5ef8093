//! Persistence primitives: atomic TOML documents and key/value stores.

mod atomic_toml;
mod memory_key_value_store;
mod toml_key_value_store;

pub use atomic_toml::AtomicTomlFile;
pub use memory_key_value_store::MemoryKeyValueStore;
pub use toml_key_value_store::TomlKeyValueStore;
