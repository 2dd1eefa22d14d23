pub mod common;
pub mod image;
pub mod style;

pub use common::*;
pub use image::*;
pub use style::*;
