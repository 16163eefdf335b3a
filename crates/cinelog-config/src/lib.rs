pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{ApiConfig, CatalogOptions, Config, LoggingConfig};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
