//! Request payload construction.
//!
//! - [`payload::build_payload`]: turns a conversation into ordered message blocks
//! - [`payload::ContextWindow`]: how much history accompanies a request

pub mod payload;
