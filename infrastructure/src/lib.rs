//! Infrastructure layer: configuration store and provider adapters

pub mod config;
pub mod providers;

pub use config::{
    ConfigError, ConfigLoader, ConfigManager, FileConfig, FileModelConfig, FileRoundTableConfig,
    FileUiConfig, ModelUpdate, RoundTableUpdate, create_example_env_file, env_file_candidates,
    load_env_files, mask_key,
};
pub use providers::ProviderFactory;
