pub mod rng;
pub mod runtime;
pub mod shape;
pub mod tensor;
