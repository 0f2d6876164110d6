pub mod context;
pub mod edit;
pub mod generation;
pub mod image;

pub use context::*;
pub use edit::*;
pub use generation::*;
pub use image::*;
