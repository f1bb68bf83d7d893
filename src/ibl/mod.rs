//! Image-based lighting: probes, their convolution and the BRDF lookup table.

pub mod brdf;
pub mod convolve;
pub mod probe;
pub mod sampling;

pub use brdf::Brdf;
pub use convolve::{ColorGrade, ConvolveRequest, CpuConvolver, ProbeConvolver};
pub use probe::{ConvolvedTargets, IblProbe, PingPong};
