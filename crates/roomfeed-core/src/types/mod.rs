pub mod change;
pub mod document;
pub mod query;

pub use change::{ChangeBatch, ChangeEvent, ChangeKind, RawChange, Record};
pub use document::{Document, Fields};
pub use query::{CollectionPath, Direction, OrderBy, Query};
