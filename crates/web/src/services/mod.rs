//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Account registration, password login, and password changes
pub mod auth;
