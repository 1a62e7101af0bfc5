//! koship-lib: build Go artifacts into container images with ko.
//!
//! This crate provides the orchestration around an external image toolchain:
//! - `ArtifactBuilder`: builds one artifact and publishes or sideloads it
//! - `reference`: image reference parsing and identity extraction
//! - `build` / `publish`: option derivation and the toolchain capability traits
//! - `identity`: resolving the final image identifier after publishing
//! - `config`: explicit configuration and capability wiring

pub mod artifact;
pub mod build;
pub mod builder;
pub mod config;
pub mod consts;
pub mod daemon;
pub mod identity;
pub mod platform;
pub mod publish;
pub mod reference;
pub mod toolchain;
pub mod util;

pub use builder::{ArtifactBuildError, ArtifactBuilder, BuildPhase};
