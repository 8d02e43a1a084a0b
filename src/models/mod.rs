pub mod caller;
pub mod entity;
pub mod registration;

pub use caller::*;
pub use entity::*;
pub use registration::*;
