//! Raw TOML configuration data types
//!
//! These structs mirror the exact structure of the config file. Role
//! and provider names stay as strings here; conversion into domain
//! types happens in the fallible `to_*` methods so a typo in the file
//! surfaces as a named error, not a deserialization panic.

use roundtable_domain::{DiscussionRole, ModelSpec, Provider, RoundTableSettings};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::manager::ConfigError;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Configured models, keyed by name (e.g. "openai/gpt-4")
    pub models: BTreeMap<String, FileModelConfig>,
    /// Round-table discussion settings
    pub round_table: FileRoundTableConfig,
    /// Terminal UI settings
    pub ui: FileUiConfig,
}

impl Default for FileConfig {
    /// Out-of-the-box config: three well-known models with `env:` key
    /// references, two of them seated at the round-table.
    fn default() -> Self {
        Self::empty().with_seed_models()
    }
}

impl FileConfig {
    /// Section defaults only, no models. This is the merge base for the
    /// loader: seeding the models here instead would make them
    /// undeletable, since map merging unions keys with the user's file.
    pub fn empty() -> Self {
        Self {
            models: BTreeMap::new(),
            round_table: FileRoundTableConfig::default(),
            ui: FileUiConfig::default(),
        }
    }

    /// Seed the three well-known models if the table is empty
    pub fn with_seed_models(mut self) -> Self {
        if !self.models.is_empty() {
            return self;
        }
        let models = &mut self.models;
        models.insert(
            "openai/gpt-4".to_string(),
            FileModelConfig {
                provider: "openai".to_string(),
                model: "gpt-4".to_string(),
                api_key: Some("env:OPENAI_API_KEY".to_string()),
                ..FileModelConfig::bare()
            },
        );
        models.insert(
            "anthropic/claude-3-sonnet".to_string(),
            FileModelConfig {
                provider: "anthropic".to_string(),
                model: "claude-3-sonnet-20240229".to_string(),
                api_key: Some("env:ANTHROPIC_API_KEY".to_string()),
                ..FileModelConfig::bare()
            },
        );
        models.insert(
            "ollama/llama2".to_string(),
            FileModelConfig {
                provider: "ollama".to_string(),
                model: "llama2".to_string(),
                endpoint: Some("http://localhost:11434".to_string()),
                ..FileModelConfig::bare()
            },
        );
        self
    }
}

impl FileConfig {
    /// Convert one configured model into its domain spec
    pub fn model_spec(&self, name: &str) -> Result<ModelSpec, ConfigError> {
        let file_model = self
            .models
            .get(name)
            .ok_or_else(|| ConfigError::UnknownModel(name.to_string()))?;
        file_model.to_spec(name)
    }

    /// Convert all configured models into domain specs
    pub fn model_specs(&self) -> Result<HashMap<String, ModelSpec>, ConfigError> {
        self.models
            .iter()
            .map(|(name, m)| Ok((name.clone(), m.to_spec(name)?)))
            .collect()
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_context_window() -> u32 {
    4000
}

/// One model's entry in the config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileModelConfig {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub context_window: u32,
    /// Literal secret or an `env:VAR` reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self::bare()
    }
}

impl FileModelConfig {
    fn bare() -> Self {
        Self {
            provider: String::new(),
            model: String::new(),
            endpoint: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            context_window: default_context_window(),
            api_key: None,
        }
    }

    pub fn from_spec(spec: &ModelSpec) -> Self {
        Self {
            provider: spec.provider.as_str().to_string(),
            model: spec.model.clone(),
            endpoint: spec.endpoint.clone(),
            temperature: spec.temperature,
            max_tokens: spec.max_tokens,
            context_window: spec.context_window,
            api_key: spec.api_key.clone(),
        }
    }

    pub fn to_spec(&self, name: &str) -> Result<ModelSpec, ConfigError> {
        let provider: Provider = self.provider.parse()?;
        Ok(ModelSpec {
            name: name.to_string(),
            provider,
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            context_window: self.context_window,
            api_key: self.api_key.clone(),
        })
    }
}

fn default_rounds() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

fn default_enabled_models() -> Vec<String> {
    vec![
        "openai/gpt-4".to_string(),
        "anthropic/claude-3-sonnet".to_string(),
    ]
}

/// `[round_table]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileRoundTableConfig {
    pub enabled_models: Vec<String>,
    pub discussion_rounds: usize,
    pub critique_mode: bool,
    pub parallel_responses: bool,
    pub timeout_seconds: u64,
    pub use_role_based_prompting: bool,
    pub role_rotation: bool,
    /// Per-model rotation sequences, role names as strings
    pub role_assignments: BTreeMap<String, Vec<String>>,
    /// Per-role template overrides, keyed by role name
    pub custom_role_templates: BTreeMap<String, String>,
}

impl Default for FileRoundTableConfig {
    fn default() -> Self {
        Self {
            enabled_models: default_enabled_models(),
            discussion_rounds: default_rounds(),
            critique_mode: default_true(),
            parallel_responses: false,
            timeout_seconds: default_timeout(),
            use_role_based_prompting: false,
            role_rotation: false,
            role_assignments: BTreeMap::new(),
            custom_role_templates: BTreeMap::new(),
        }
    }
}

impl FileRoundTableConfig {
    /// Convert into domain settings, rejecting unknown role names
    pub fn to_settings(&self) -> Result<RoundTableSettings, ConfigError> {
        let mut role_assignments = HashMap::new();
        for (model, roles) in &self.role_assignments {
            let parsed: Result<Vec<DiscussionRole>, _> =
                roles.iter().map(|r| r.parse()).collect();
            role_assignments.insert(model.clone(), parsed?);
        }

        let mut custom_role_templates = HashMap::new();
        for (role, template) in &self.custom_role_templates {
            custom_role_templates.insert(role.parse::<DiscussionRole>()?, template.clone());
        }

        Ok(RoundTableSettings {
            enabled_models: self.enabled_models.clone(),
            discussion_rounds: self.discussion_rounds,
            critique_mode: self.critique_mode,
            parallel_responses: self.parallel_responses,
            timeout_seconds: self.timeout_seconds,
            use_role_based_prompting: self.use_role_based_prompting,
            role_rotation: self.role_rotation,
            role_assignments,
            custom_role_templates,
        })
    }
}

/// `[ui]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileUiConfig {
    /// Model used by plain (non-round-table) chat
    pub default_model: String,
    /// Stream chat replies chunk by chunk
    pub streaming: bool,
}

impl Default for FileUiConfig {
    fn default() -> Self {
        Self {
            default_model: "openai/gpt-4".to_string(),
            streaming: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_seeds_known_models() {
        let config = FileConfig::default();
        assert_eq!(config.models.len(), 3);
        assert!(config.models.contains_key("ollama/llama2"));
        assert_eq!(
            config.round_table.enabled_models,
            vec!["openai/gpt-4", "anthropic/claude-3-sonnet"]
        );
        assert_eq!(config.round_table.discussion_rounds, 2);
        assert!(config.round_table.critique_mode);
        assert!(!config.round_table.parallel_responses);
        assert_eq!(config.round_table.timeout_seconds, 30);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[round_table]
discussion_rounds = 4
parallel_responses = true

[models."local/mistral"]
provider = "ollama"
model = "mistral"
endpoint = "http://localhost:11434"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.round_table.discussion_rounds, 4);
        assert!(config.round_table.parallel_responses);
        // Unspecified fields keep their defaults
        assert!(config.round_table.critique_mode);
        let mistral = &config.models["local/mistral"];
        assert_eq!(mistral.temperature, 0.7);
        assert_eq!(mistral.max_tokens, 4000);
    }

    #[test]
    fn test_to_settings_parses_role_assignments() {
        let mut file = FileRoundTableConfig::default();
        file.role_assignments.insert(
            "openai/gpt-4".to_string(),
            vec!["generator".to_string(), "critic".to_string()],
        );
        file.custom_role_templates
            .insert("critic".to_string(), "Poke holes.".to_string());

        let settings = file.to_settings().unwrap();
        assert_eq!(
            settings.role_assignments["openai/gpt-4"],
            vec![DiscussionRole::Generator, DiscussionRole::Critic]
        );
        assert_eq!(
            settings.custom_role_templates[&DiscussionRole::Critic],
            "Poke holes."
        );
    }

    #[test]
    fn test_to_settings_rejects_unknown_role() {
        let mut file = FileRoundTableConfig::default();
        file.role_assignments
            .insert("m".to_string(), vec!["devil_advocate".to_string()]);

        let err = file.to_settings().unwrap_err();
        assert!(err.to_string().contains("devil_advocate"));
    }

    #[test]
    fn test_to_spec_rejects_unknown_provider() {
        let file = FileModelConfig {
            provider: "bedrock".to_string(),
            model: "titan".to_string(),
            ..FileModelConfig::bare()
        };
        let err = file.to_spec("aws/titan").unwrap_err();
        assert!(err.to_string().contains("bedrock"));
    }

    #[test]
    fn test_spec_roundtrip_through_file_model() {
        let spec = ModelSpec::new("gemini/flash", Provider::Gemini, "gemini-1.5-flash")
            .with_api_key("env:GOOGLE_API_KEY");
        let file = FileModelConfig::from_spec(&spec);
        assert_eq!(file.to_spec("gemini/flash").unwrap(), spec);
    }
}
