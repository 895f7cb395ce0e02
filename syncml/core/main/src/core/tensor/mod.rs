mod ops;
#[allow(clippy::module_inception)]
mod tensor;
mod views;

pub use tensor::Tensor;
