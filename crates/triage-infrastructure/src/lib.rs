pub mod image_loader;
pub mod paths;
pub mod storage;

pub use crate::image_loader::load_image;
pub use crate::paths::{PathError, TriagePaths};
pub use crate::storage::ConfigStorage;
