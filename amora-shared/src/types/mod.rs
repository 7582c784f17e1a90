pub mod api;
pub mod chat;
pub mod pagination;

pub use api::*;
pub use chat::*;
pub use pagination::*;
