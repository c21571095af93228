pub mod local;
pub mod registry;
pub mod remote;
pub mod resolver;
pub mod source;

pub use crate::domain::model::{ImageRequest, ImageSourceType, RequestKey};
pub use crate::domain::ports::ImageSource;
pub use crate::utils::error::Result;
