pub mod loader;
pub mod schema;
pub mod variables;

pub use loader::{load_config, load_config_from_str, load_config_with, DEFAULT_CONFIG_FILE};
pub use schema::{AuditConfig, ConfigFile, RawAuditConfig, RawFlag};
pub use variables::substitute_env_vars;
