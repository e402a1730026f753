mod shape;
mod tensor_i8;

pub use shape::Shape;
pub use tensor_i8::TensorI8;
