//! syncli - command-line tooling for Synapse Matrix homeservers

pub mod config;
pub mod printer;
pub mod spaces;
pub mod synapse;

/// Version injected at compile time via SYNCLI_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("SYNCLI_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
