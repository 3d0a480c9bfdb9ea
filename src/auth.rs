//! Service-account credentials, signed assertions, identifiers, and token models.

pub mod assertion;
pub mod credential;
pub mod id;
pub mod token;

pub use assertion::*;
pub use credential::*;
pub use id::*;
pub use token::{record::*, secret::*};
