//! Data models

mod audit;
mod comment;
mod complaint;
mod tag;
mod user;

pub use audit::*;
pub use comment::*;
pub use complaint::*;
pub use tag::*;
pub use user::*;
