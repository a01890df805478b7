// Classification layer — capability traits, providers, and the stages
// built on top of them.

pub mod hf;
pub mod onnx;
pub mod registry;
pub mod stages;
pub mod traits;
