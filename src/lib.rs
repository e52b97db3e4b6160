//! # meshbench core
//!
//! Root crate that re-exports all meshbench components.
//!
//! ## Crates
//!
//! - [`meshbench_sampler`]: draws per-peer network profiles from a technology mixture
//! - [`meshbench_topology`]: builds the peer catalog, selects an overlay, allocates bandwidth
//! - [`meshbench_fabric`]: translates a plan into a declarative fabric description
//! - [`meshbench_transfer`]: drives the origin/super-peer/leaf transfer and the tracker barrier
//! - [`meshbench_validator`]: measures shaped edges and verifies artifact integrity

pub use meshbench_fabric as fabric;
pub use meshbench_sampler as sampler;
pub use meshbench_topology as topology;
pub use meshbench_transfer as transfer;
pub use meshbench_validator as validator;

/// meshbench version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
