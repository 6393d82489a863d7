//! Credentials, identifiers, signatures, and token models.

pub mod credentials;
pub mod id;
pub mod signature;
pub mod token;

pub use credentials::*;
pub use id::*;
pub use signature::*;
pub use token::{claims::*, material::*, secret::*};
