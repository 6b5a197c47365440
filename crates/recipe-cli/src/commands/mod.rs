//! Command implementations for recipe-cli

pub mod check;
pub mod deps;
pub mod info;
pub mod list;
pub mod resolve;
pub mod versions;

pub use check::run_check;
pub use deps::run_deps;
pub use info::run_info;
pub use list::run_list;
pub use resolve::{ResolveOptions, run_resolve};
pub use versions::run_versions;
