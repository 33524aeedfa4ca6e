pub mod auth;
pub mod entity;
pub mod source;
pub mod store;

pub use auth::{AuthProvider, AuthUser};
pub use entity::{decode_document, Entity};
pub use source::{ChangeFeed, ChangeSource};
pub use store::DocumentStore;
