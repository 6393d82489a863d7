//! Token material issued by the security service and the claims it carries.

pub mod claims;
pub mod material;
pub mod secret;
