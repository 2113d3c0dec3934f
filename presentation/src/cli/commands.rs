//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the `ai` binary
#[derive(Parser, Debug)]
#[command(name = "ai")]
#[command(author, version, about = "Multi-model AI CLI with round-table discussions")]
#[command(long_about = r#"
Chat with a single model, or seat several models at a round-table where
they discuss a topic over multiple rounds, optionally critiquing each
other's responses and playing rotating discussion roles.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./roundtable.toml   Project-level config
3. ~/.config/roundtable/config.toml   Global config

Example:
  ai chat "What's the best way to handle errors in Rust?"
  ai chat --roundtable --parallel "Compare async runtimes"
  ai interactive
  ai config roundtable --add ollama/llama2
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators and banners
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a prompt to a model or to the round-table
    Chat {
        /// The prompt to send
        prompt: String,

        /// Model to use (defaults to the configured default model)
        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,

        /// Run a round-table discussion instead of a single chat
        #[arg(short = 'r', long)]
        roundtable: bool,

        /// Round-table only: invoke all models concurrently each round
        #[arg(short, long)]
        parallel: bool,
    },

    /// Start an interactive chat session
    Interactive,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// List all configured models
    List,

    /// Show configuration file locations
    Path,

    /// Set the default chat model
    SetDefault {
        /// Model name, e.g. "openai/gpt-4"
        name: String,
    },

    /// Update settings of a configured model
    SetModel {
        /// Model name, e.g. "openai/gpt-4"
        name: String,
        #[command(flatten)]
        update: ModelUpdateArgs,
    },

    /// Add a new model configuration
    AddModel {
        /// Model name, e.g. "my-custom/gpt-4"
        name: String,

        /// Provider (openai, anthropic, ollama, gemini)
        #[arg(short, long)]
        provider: String,

        /// Provider-side model identifier
        #[arg(short, long)]
        model: String,

        /// API key or env:VAR_NAME reference
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Custom endpoint URL
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Remove a model configuration
    RemoveModel {
        name: String,
    },

    /// Manage environment variables and .env files
    Env {
        /// Create an example .env file
        #[arg(long)]
        init: bool,

        /// Show loaded .env files and API key status
        #[arg(long)]
        show: bool,

        /// Custom path for the .env file (with --init)
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
    },

    /// Manage round-table membership and settings
    Roundtable {
        /// Add a model to the round-table
        #[arg(short, long, value_name = "MODEL")]
        add: Option<String>,

        /// Remove a model from the round-table
        #[arg(short, long, value_name = "MODEL")]
        remove: Option<String>,

        /// List round-table models and settings
        #[arg(short, long)]
        list: bool,

        /// Number of discussion rounds
        #[arg(long)]
        rounds: Option<usize>,

        /// Let models critique earlier responses in the same round
        #[arg(long)]
        critique: Option<bool>,

        /// Invoke all models concurrently each round
        #[arg(long)]
        parallel: Option<bool>,

        /// Per-model response timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Manage discussion roles
    Roles {
        /// List available roles and current assignments
        #[arg(short, long)]
        list: bool,

        /// Enable or disable role-based prompting
        #[arg(long)]
        enabled: Option<bool>,

        /// Enable or disable role rotation between rounds
        #[arg(long)]
        rotation: Option<bool>,

        /// Model to assign roles to (with --assign)
        #[arg(long, value_name = "MODEL")]
        model: Option<String>,

        /// Comma-separated rotation sequence, e.g. "generator,critic"
        #[arg(long, value_name = "ROLES")]
        assign: Option<String>,

        /// Clear a model's role assignment
        #[arg(long, value_name = "MODEL")]
        clear: Option<String>,

        /// Role whose prompt template to override (with --text)
        #[arg(long, value_name = "ROLE")]
        template: Option<String>,

        /// Replacement template text
        #[arg(long, value_name = "TEXT")]
        text: Option<String>,
    },
}

/// Typed per-field model updates; absent flags leave fields untouched
#[derive(Args, Debug, Default)]
pub struct ModelUpdateArgs {
    /// Provider-side model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Custom endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Sampling temperature (0.0-2.0)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Maximum response tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Context window size in tokens
    #[arg(long)]
    pub context_window: Option<u32>,

    /// API key or env:VAR_NAME reference
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,
}
