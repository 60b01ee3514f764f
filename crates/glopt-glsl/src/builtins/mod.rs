//! Builtin variables and functions known to the front end.

mod math;
mod texture;
mod variables;

pub use math::{math_function, CallResult, MathFunction};
pub use texture::{texture_function, TextureFunction, TextureKind};
pub use variables::builtin_variable;
