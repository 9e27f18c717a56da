//! Configuration loading and merging
//!
//! Handles loading layered YAML/TOML sources (package default, user-home
//! file, working-directory file, explicit path) and merging them with
//! right-biased precedence into a single tree.

pub mod loader;
pub mod merge;

pub use loader::ConfigSources;
pub use merge::merge_values;
