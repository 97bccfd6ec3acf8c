// ikrig-core: Joint topology, transform helpers, parameters, errors for the ikrig retargeter.

pub mod error;
pub mod joints;
pub mod params;
pub mod transform;
