//! Extension seams: rate limiting for verifiers and token attachment for outbound requests.
//!
//! Both are traits so hosts can bring a shared limiter (for example one backed by a cache
//! cluster) or their own HTTP client. In-process defaults ship alongside them.

pub mod rate_limit;
pub mod request_signer;

pub use rate_limit::*;
pub use request_signer::*;
