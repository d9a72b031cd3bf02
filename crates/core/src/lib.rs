//! Input normalisation and key derivation for BoringCache restores.
//!
//! This crate turns action inputs into the arguments of a `boringcache
//! restore` call:
//! - Validation of the two accepted input shapes ([`validate`])
//! - Workspace resolution ([`resolve_workspace`])
//! - Entry parsing and path resolution ([`derive_entries`])
//! - Platform key suffixes ([`platform_suffix`])
//!
//! Nothing here performs I/O beyond reading the environment through an
//! [`EnvProvider`].

mod error;

pub mod entries;
pub mod env;
pub mod inputs;
pub mod platform;

pub use error::{CACHE_MISS_MESSAGE, Error, Result};

pub use entries::{
    CacheEntry, PathResolver, derive_entries, entries_to_string, legacy_entries,
    legacy_entries_string, parse_entries, primary_key,
};
pub use env::{EnvProvider, MapEnv, SystemEnv};
pub use inputs::{
    CONFLICTING_SHAPES_WARNING, DEFAULT_CLI_VERSION, DEFAULT_WORKSPACE, InputShape, Inputs,
    ShapeResolution, resolve_workspace, validate,
};
pub use platform::{Arch, Os, Platform, platform_suffix};
