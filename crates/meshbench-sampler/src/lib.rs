//! # meshbench-sampler
//!
//! Draws synthetic peer network profiles from a categorical mixture of
//! three consumer access technologies (ADSL, Cable, FTTC), each
//! parameterizing truncated-to-positive normal distributions for upload,
//! download, latency, and packet loss.
//!
//! This is the only intentionally non-deterministic component of the
//! harness; callers always provide an explicit seed so a population can be
//! replayed from its `testId`.

pub mod distribution;
pub mod error;
pub mod peer;
pub mod sampler;
pub mod technology;

pub use error::{SamplerError, SamplerResult};
pub use peer::{Peer, ORIGIN_NAME};
pub use sampler::Sampler;
pub use technology::{Technology, TechnologyParams};
