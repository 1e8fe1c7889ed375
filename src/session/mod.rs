pub mod registry;
pub mod token;

pub use registry::SessionRegistry;
pub use token::{SessionToken, TokenIssuer};
