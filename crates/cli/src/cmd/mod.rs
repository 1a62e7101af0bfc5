mod build;
mod inspect;
mod resolve;

pub use build::{BuildArgs, cmd_build};
pub use inspect::cmd_inspect;
pub use resolve::{ResolveArgs, cmd_resolve};
