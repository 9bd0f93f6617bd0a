//! Data models

pub mod cradle;
pub mod sample;
pub mod notification;

pub use cradle::*;
pub use sample::*;
pub use notification::*;
