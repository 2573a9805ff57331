pub mod common;
pub mod conflicts;
pub mod daemon;
pub mod log;
pub mod mappings;
pub mod settings;
pub mod sync;
