/// Scheme prefix marking a declared image name as a fully-qualified import path.
pub const KO_SCHEME_PREFIX: &str = "ko://";

/// Client identification passed along with build and publish options.
pub const USER_AGENT: &str = concat!("koship/", env!("CARGO_PKG_VERSION"));

/// Tag assumed when a reference carries neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

// Environment variables read by `BuilderConfig::from_env`.
pub const ENV_PUSH: &str = "KOSHIP_PUSH";
pub const ENV_KO: &str = "KOSHIP_KO";
pub const ENV_GO: &str = "KOSHIP_GO";
pub const ENV_DOCKER: &str = "KOSHIP_DOCKER";
