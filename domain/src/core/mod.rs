//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: hosted Claude models a conversation can be sent to
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
