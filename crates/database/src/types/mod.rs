//! Shared types for the database layer

pub mod errors;
pub mod paging;
pub mod scope;

pub use errors::DatabaseError;
pub use paging::{Page, PageRequest};
pub use scope::RecordScope;

pub type DatabaseResult<T> = Result<T, DatabaseError>;
