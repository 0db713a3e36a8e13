pub mod error;
pub mod report;
pub mod sampler;
pub mod spectrum;

pub use error::{Result, SpectrumError};
pub use sampler::Sampler;
pub use spectrum::{bucket_width, build_spectrum, BoundaryMode, Bucket, Spectrum, SpectrumParams};
