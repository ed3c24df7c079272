//! Request handlers.

pub mod health;
pub mod image;
pub mod index;
pub mod upload;

pub use health::*;
pub use image::*;
pub use index::*;
pub use upload::*;
