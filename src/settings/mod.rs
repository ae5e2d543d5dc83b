//! Settings are read from a TOML file plus `ROTOR_*` environment overrides.
//! See `bin/settings_demo.rs` for loading from the command line.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
