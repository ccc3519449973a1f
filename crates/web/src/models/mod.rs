//! Domain models.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod session;
pub mod snippet;
pub mod user;

pub use snippet::Snippet;
pub use user::User;
