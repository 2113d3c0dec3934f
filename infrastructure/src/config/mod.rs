//! Configuration: raw TOML types, multi-source loading, and mutation

mod env;
mod file_config;
mod loader;
mod manager;

pub use env::{
    create_example_env_file, env_file_candidates, load_env_files, mask_key, resolve_api_key,
};
pub use file_config::{FileConfig, FileModelConfig, FileRoundTableConfig, FileUiConfig};
pub use loader::ConfigLoader;
pub use manager::{ConfigError, ConfigManager, ModelUpdate, RoundTableUpdate};
