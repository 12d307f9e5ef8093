//! Capabilities the subsystem consumes: persisted key/value entries, the
//! file system and a clock.

mod clock;
mod file_system;
mod key_value;

pub use clock::{Clock, SystemClock};
pub use file_system::{DirEntry, FileSystem};
pub use key_value::KeyValueStore;
