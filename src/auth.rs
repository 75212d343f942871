//! Auth-domain identifiers, advertised authentication services, and access tokens.

pub mod realm;
pub mod service;
pub mod token;

pub use realm::*;
pub use service::*;
pub use token::*;
