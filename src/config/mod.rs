//! Configuration module for vaayu
//!
//! CLI argument parsing and the runtime configuration structs built
//! from it (`SessionConfig`, `TransferOptions`).

mod settings;

pub use settings::*;
