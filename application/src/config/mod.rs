//! Application-level configuration.
//!
//! - [`ChatParams`]: model, history window, reasoning delimiters, retry budgets
//! - [`RetryPolicy`]: attempt budget and backoff schedule

pub mod chat_params;
pub mod retry_policy;

pub use chat_params::{ChatParams, DEFAULT_DEGRADED_THRESHOLD};
pub use retry_policy::RetryPolicy;
