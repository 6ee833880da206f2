pub mod config;
pub mod errors;
pub mod validation;

// Re-export the types most callers need
pub use config::{ClientConfig, ContractConfig, NetworkDescriptor};
pub use errors::{ClientError, ClientResult};
