//! Configuration manager
//!
//! Owns the loaded [`FileConfig`] and applies every mutation the CLI
//! exposes. Updates arrive as typed patch structs; there is no
//! free-form key-path setter, so an unknown field is a compile error in
//! the CLI rather than a silent no-op in a user's file.

use super::file_config::{FileConfig, FileModelConfig};
use super::loader::ConfigLoader;
use roundtable_domain::{DiscussionRole, DomainError, ModelSpec, Provider, RoundTableSettings};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("no model named '{0}' is configured")]
    UnknownModel(String),

    #[error("model '{0}' already exists")]
    DuplicateModel(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("could not write config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Partial update for one model's entry.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ModelUpdate {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub context_window: Option<u32>,
    pub api_key: Option<String>,
}

/// Partial update for the `[round_table]` section
#[derive(Debug, Clone, Default)]
pub struct RoundTableUpdate {
    pub discussion_rounds: Option<usize>,
    pub critique_mode: Option<bool>,
    pub parallel_responses: Option<bool>,
    pub timeout_seconds: Option<u64>,
    pub use_role_based_prompting: Option<bool>,
    pub role_rotation: Option<bool>,
}

/// Loaded configuration plus the path it persists to
pub struct ConfigManager {
    config: FileConfig,
    path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load from the standard source chain. Mutations persist to the
    /// explicit path when one was given, else to the global config.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        let config = ConfigLoader::load(config_path)?;
        let path = config_path
            .cloned()
            .or_else(ConfigLoader::global_config_path);
        Ok(Self { config, path })
    }

    /// Defaults only, never persisted (for --no-config)
    pub fn ephemeral() -> Self {
        Self {
            config: ConfigLoader::load_defaults(),
            path: None,
        }
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Domain settings for the round-table
    pub fn roundtable_settings(&self) -> Result<RoundTableSettings, ConfigError> {
        self.config.round_table.to_settings()
    }

    /// All configured models as domain specs
    pub fn model_specs(&self) -> Result<HashMap<String, ModelSpec>, ConfigError> {
        self.config.model_specs()
    }

    /// One configured model as a domain spec
    pub fn model_spec(&self, name: &str) -> Result<ModelSpec, ConfigError> {
        self.config.model_spec(name)
    }

    /// The model plain chat uses when none is named on the command line
    pub fn default_model_spec(&self) -> Result<ModelSpec, ConfigError> {
        self.model_spec(&self.config.ui.default_model)
    }

    pub fn set_default_model(&mut self, name: &str) -> Result<(), ConfigError> {
        self.require_model(name)?;
        self.config.ui.default_model = name.to_string();
        Ok(())
    }

    /// Register a new model. The provider string is validated here so a
    /// typo never reaches the file.
    pub fn add_model(
        &mut self,
        name: &str,
        provider: &str,
        model: &str,
        endpoint: Option<String>,
        api_key: Option<String>,
    ) -> Result<(), ConfigError> {
        if self.config.models.contains_key(name) {
            return Err(ConfigError::DuplicateModel(name.to_string()));
        }
        let provider: Provider = provider.parse()?;

        // Key-less cloud providers get their conventional env reference
        let api_key = api_key.or_else(|| {
            provider
                .api_key_env()
                .map(|var| format!("env:{var}"))
        });

        self.config.models.insert(
            name.to_string(),
            FileModelConfig {
                provider: provider.as_str().to_string(),
                model: model.to_string(),
                endpoint,
                api_key,
                ..FileModelConfig::default()
            },
        );
        info!(model = name, "added model");
        Ok(())
    }

    /// Remove a model and unseat it from the round-table
    pub fn remove_model(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.config.models.remove(name).is_none() {
            return Err(ConfigError::UnknownModel(name.to_string()));
        }
        self.config
            .round_table
            .enabled_models
            .retain(|m| m != name);
        self.config.round_table.role_assignments.remove(name);
        Ok(())
    }

    /// Apply a typed patch to one model's entry
    pub fn update_model(&mut self, name: &str, update: ModelUpdate) -> Result<(), ConfigError> {
        if let Some(t) = update.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::InvalidValue(format!(
                    "temperature must be between 0.0 and 2.0 (got {t})"
                )));
            }
        }
        let entry = self
            .config
            .models
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownModel(name.to_string()))?;

        if let Some(model) = update.model {
            entry.model = model;
        }
        if let Some(endpoint) = update.endpoint {
            entry.endpoint = Some(endpoint);
        }
        if let Some(temperature) = update.temperature {
            entry.temperature = temperature;
        }
        if let Some(max_tokens) = update.max_tokens {
            entry.max_tokens = max_tokens;
        }
        if let Some(context_window) = update.context_window {
            entry.context_window = context_window;
        }
        if let Some(api_key) = update.api_key {
            entry.api_key = Some(api_key);
        }
        Ok(())
    }

    /// Seat a model at the round-table
    pub fn enable_model(&mut self, name: &str) -> Result<(), ConfigError> {
        self.require_model(name)?;
        let enabled = &mut self.config.round_table.enabled_models;
        if !enabled.iter().any(|m| m == name) {
            enabled.push(name.to_string());
        }
        Ok(())
    }

    /// Unseat a model from the round-table (its config entry stays)
    pub fn disable_model(&mut self, name: &str) -> Result<(), ConfigError> {
        let enabled = &mut self.config.round_table.enabled_models;
        let before = enabled.len();
        enabled.retain(|m| m != name);
        if enabled.len() == before {
            return Err(ConfigError::UnknownModel(name.to_string()));
        }
        Ok(())
    }

    pub fn update_roundtable(&mut self, update: RoundTableUpdate) -> Result<(), ConfigError> {
        if update.discussion_rounds == Some(0) {
            return Err(ConfigError::InvalidValue(
                "discussion_rounds must be at least 1".to_string(),
            ));
        }
        if update.timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        let rt = &mut self.config.round_table;
        if let Some(v) = update.discussion_rounds {
            rt.discussion_rounds = v;
        }
        if let Some(v) = update.critique_mode {
            rt.critique_mode = v;
        }
        if let Some(v) = update.parallel_responses {
            rt.parallel_responses = v;
        }
        if let Some(v) = update.timeout_seconds {
            rt.timeout_seconds = v;
        }
        if let Some(v) = update.use_role_based_prompting {
            rt.use_role_based_prompting = v;
        }
        if let Some(v) = update.role_rotation {
            rt.role_rotation = v;
        }
        Ok(())
    }

    /// Set a model's rotation sequence. Role names are validated before
    /// anything is written.
    pub fn assign_roles(&mut self, name: &str, roles: &[String]) -> Result<(), ConfigError> {
        self.require_model(name)?;
        if roles.is_empty() {
            return Err(ConfigError::InvalidValue(
                "at least one role is required".to_string(),
            ));
        }
        for role in roles {
            role.parse::<DiscussionRole>()?;
        }
        self.config
            .round_table
            .role_assignments
            .insert(name.to_string(), roles.to_vec());
        Ok(())
    }

    /// Drop a model's assignment, returning it to the canonical cycle
    pub fn clear_roles(&mut self, name: &str) -> Result<(), ConfigError> {
        if self
            .config
            .round_table
            .role_assignments
            .remove(name)
            .is_none()
        {
            return Err(ConfigError::UnknownModel(name.to_string()));
        }
        Ok(())
    }

    pub fn set_role_template(&mut self, role: &str, template: &str) -> Result<(), ConfigError> {
        let role: DiscussionRole = role.parse()?;
        self.config
            .round_table
            .custom_role_templates
            .insert(role.as_str().to_string(), template.to_string());
        Ok(())
    }

    /// Persist the current config as TOML.
    ///
    /// A no-op for ephemeral managers.
    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(&self.config)?;
        std::fs::write(path, rendered)?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }

    fn require_model(&self, name: &str) -> Result<(), ConfigError> {
        if self.config.models.contains_key(name) {
            Ok(())
        } else {
            Err(ConfigError::UnknownModel(name.to_string()))
        }
    }

    #[cfg(test)]
    fn with_config(config: FileConfig, path: Option<PathBuf>) -> Self {
        Self { config, path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        ConfigManager::with_config(FileConfig::default(), None)
    }

    #[test]
    fn test_add_model_fills_conventional_key_reference() {
        let mut mgr = manager();
        mgr.add_model("gemini/flash", "gemini", "gemini-1.5-flash", None, None)
            .unwrap();

        let entry = &mgr.config().models["gemini/flash"];
        assert_eq!(entry.api_key.as_deref(), Some("env:GOOGLE_API_KEY"));
    }

    #[test]
    fn test_add_model_rejects_duplicate_and_bad_provider() {
        let mut mgr = manager();
        assert!(matches!(
            mgr.add_model("openai/gpt-4", "openai", "gpt-4", None, None),
            Err(ConfigError::DuplicateModel(_))
        ));
        assert!(
            mgr.add_model("x/y", "bedrock", "titan", None, None)
                .is_err()
        );
    }

    #[test]
    fn test_remove_model_unseats_it() {
        let mut mgr = manager();
        mgr.remove_model("openai/gpt-4").unwrap();
        assert!(!mgr.config().models.contains_key("openai/gpt-4"));
        assert!(
            !mgr.config()
                .round_table
                .enabled_models
                .contains(&"openai/gpt-4".to_string())
        );
    }

    #[test]
    fn test_update_model_patches_only_given_fields() {
        let mut mgr = manager();
        mgr.update_model(
            "openai/gpt-4",
            ModelUpdate {
                temperature: Some(0.2),
                ..ModelUpdate::default()
            },
        )
        .unwrap();

        let entry = &mgr.config().models["openai/gpt-4"];
        assert_eq!(entry.temperature, 0.2);
        assert_eq!(entry.max_tokens, 4000);
        assert_eq!(entry.model, "gpt-4");
    }

    #[test]
    fn test_update_model_rejects_out_of_range_temperature() {
        let mut mgr = manager();
        let err = mgr
            .update_model(
                "openai/gpt-4",
                ModelUpdate {
                    temperature: Some(3.5),
                    ..ModelUpdate::default()
                },
            )
            .unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_enable_is_idempotent() {
        let mut mgr = manager();
        mgr.enable_model("ollama/llama2").unwrap();
        mgr.enable_model("ollama/llama2").unwrap();
        let enabled = &mgr.config().round_table.enabled_models;
        assert_eq!(enabled.iter().filter(|m| *m == "ollama/llama2").count(), 1);
    }

    #[test]
    fn test_roundtable_update_rejects_zero_rounds() {
        let mut mgr = manager();
        let err = mgr
            .update_roundtable(RoundTableUpdate {
                discussion_rounds: Some(0),
                ..RoundTableUpdate::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("discussion_rounds"));
    }

    #[test]
    fn test_assign_roles_validates_names() {
        let mut mgr = manager();
        mgr.assign_roles(
            "openai/gpt-4",
            &["generator".to_string(), "critic".to_string()],
        )
        .unwrap();
        assert!(
            mgr.assign_roles("openai/gpt-4", &["moderator".to_string()])
                .is_err()
        );
        // The bad call must not have clobbered the good assignment
        let settings = mgr.roundtable_settings().unwrap();
        assert_eq!(settings.role_assignments["openai/gpt-4"].len(), 2);
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut mgr = ConfigManager::with_config(FileConfig::default(), Some(path.clone()));
        mgr.update_roundtable(RoundTableUpdate {
            discussion_rounds: Some(3),
            parallel_responses: Some(true),
            ..RoundTableUpdate::default()
        })
        .unwrap();
        mgr.save().unwrap();

        let reloaded = ConfigLoader::load(Some(&path)).unwrap();
        assert_eq!(reloaded.round_table.discussion_rounds, 3);
        assert!(reloaded.round_table.parallel_responses);
        assert_eq!(reloaded.models.len(), 3);
    }
}
