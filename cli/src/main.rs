//! CLI entrypoint for the `ai` binary
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use roundtable_application::{RoundTableError, RunChatUseCase, RunRoundTableUseCase};
use roundtable_infrastructure::{
    ConfigLoader, ConfigManager, ModelUpdate, ProviderFactory, RoundTableUpdate,
    create_example_env_file, env_file_candidates, load_env_files, mask_key,
};
use roundtable_presentation::{ChatRepl, Cli, Command, ConfigCommand, ConsolePresenter};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Fold .env files into the environment before any key resolution;
    // variables already set in the shell keep their values
    load_env_files();

    let mut manager = if cli.no_config {
        ConfigManager::ephemeral()
    } else {
        ConfigManager::load(cli.config.as_ref())?
    };

    match cli.command {
        Command::Chat {
            prompt,
            model,
            roundtable,
            parallel,
        } => {
            run_chat(&manager, &prompt, model, roundtable, parallel, cli.quiet).await?;
        }
        Command::Interactive => {
            let settings = manager.roundtable_settings()?;
            let specs = manager.model_specs()?;
            let default_model = manager.config().ui.default_model.clone();
            let factory = Arc::new(ProviderFactory::new());
            let mut repl = ChatRepl::new(factory, settings, specs, default_model, cli.quiet);
            repl.run().await?;
        }
        Command::Config { command } => {
            run_config(&mut manager, command)?;
        }
    }

    Ok(())
}

async fn run_chat(
    manager: &ConfigManager,
    prompt: &str,
    model: Option<String>,
    roundtable: bool,
    parallel: bool,
    quiet: bool,
) -> Result<()> {
    let factory = Arc::new(ProviderFactory::new());

    if roundtable {
        let mut settings = manager.roundtable_settings()?;
        if parallel {
            settings.parallel_responses = true;
        }
        let specs = manager.model_specs()?;

        if !quiet {
            println!(
                "{} {}",
                "Round-table:".cyan().bold(),
                settings.enabled_models.join(", ")
            );
        }

        info!(models = settings.enabled_models.len(), "starting round-table");
        let use_case = RunRoundTableUseCase::new(factory);
        // Quiet drops banners and the spinner, not the responses
        let presenter = ConsolePresenter::new(quiet);
        let result = use_case.run(prompt, &settings, &specs, &presenter).await;

        match result {
            Ok(_) => {}
            Err(RoundTableError::InsufficientModels(n)) => {
                println!(
                    "{}",
                    format!(
                        "Round-table needs at least 2 enabled models ({n} configured).\n\
                         Add one with: ai config roundtable --add <model>"
                    )
                    .yellow()
                );
            }
            Err(e) => return Err(e.into()),
        }
        return Ok(());
    }

    let spec = match model {
        Some(name) => manager.model_spec(&name)?,
        None => manager.default_model_spec()?,
    };

    if !quiet {
        println!("\n{}", format!("── {} ──", spec.name).yellow().bold());
    }

    let use_case = RunChatUseCase::new(factory);
    let presenter = ConsolePresenter::new(quiet);
    let mut conversation = roundtable_domain::Conversation::new();
    use_case
        .run(prompt, &spec, &mut conversation, &presenter)
        .await?;
    println!();
    Ok(())
}

fn run_config(manager: &mut ConfigManager, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::List => {
            let config = manager.config();
            println!("\n{}\n", "Configured models".blue().bold());
            for (name, model) in &config.models {
                let default = if *name == config.ui.default_model { "*" } else { " " };
                let seated = if config.round_table.enabled_models.contains(name) {
                    " [round-table]"
                } else {
                    ""
                };
                println!("{default} {}{seated}", name.bold());
                println!("    provider: {}", model.provider);
                println!("    model:    {}", model.model);
                println!("    temp:     {}", model.temperature);
                if let Some(endpoint) = &model.endpoint {
                    println!("    endpoint: {endpoint}");
                }
            }
            println!("\n{}", "* = default model".dimmed());
        }
        ConfigCommand::Path => {
            ConfigLoader::print_config_sources();
        }
        ConfigCommand::SetDefault { name } => {
            manager.set_default_model(&name)?;
            manager.save()?;
            println!("{}", format!("Default model set to {name}").green());
        }
        ConfigCommand::SetModel { name, update } => {
            manager.update_model(
                &name,
                ModelUpdate {
                    model: update.model,
                    endpoint: update.endpoint,
                    temperature: update.temperature,
                    max_tokens: update.max_tokens,
                    context_window: update.context_window,
                    api_key: update.api_key,
                },
            )?;
            manager.save()?;
            println!("{}", format!("Updated {name}").green());
        }
        ConfigCommand::AddModel {
            name,
            provider,
            model,
            api_key,
            endpoint,
        } => {
            manager.add_model(&name, &provider, &model, endpoint, api_key)?;
            manager.save()?;
            println!("{}", format!("Added model {name}").green());
        }
        ConfigCommand::RemoveModel { name } => {
            manager.remove_model(&name)?;
            manager.save()?;
            println!("{}", format!("Removed model {name}").green());
        }
        ConfigCommand::Env { init, show, path } => {
            if init {
                let created = create_example_env_file(path)?;
                println!(
                    "{}",
                    format!("Created example .env file: {}", created.display()).green()
                );
                println!("{}", "Edit the file and add your API keys".dimmed());
            } else if show {
                let loaded = load_env_files();
                println!("\n{}\n", "Environment".blue().bold());
                if loaded.is_empty() {
                    println!("{}", "No .env files found (use --init to create one)".yellow());
                } else {
                    println!("Loaded .env files:");
                    for file in &loaded {
                        println!("  - {}", file.display());
                    }
                }
                println!("\nAPI key status:");
                for provider in roundtable_domain::Provider::ALL {
                    let Some(var) = provider.api_key_env() else {
                        continue;
                    };
                    match std::env::var(var).ok().filter(|v| !v.is_empty()) {
                        Some(value) => {
                            println!("  {} {var}: {}", "set".green(), mask_key(&value));
                        }
                        None => println!("  {} {var}", "not set".red()),
                    }
                }
                println!("\n{}", "Checked locations:".dimmed());
                for candidate in env_file_candidates() {
                    println!("{}", format!("  - {}", candidate.display()).dimmed());
                }
            } else {
                println!("{}", "Please specify --init or --show".yellow());
            }
        }
        ConfigCommand::Roundtable {
            add,
            remove,
            list,
            rounds,
            critique,
            parallel,
            timeout,
        } => {
            let mut changed = false;
            if let Some(name) = add {
                manager.enable_model(&name)?;
                println!("{}", format!("Added {name} to the round-table").green());
                changed = true;
            }
            if let Some(name) = remove {
                manager.disable_model(&name)?;
                println!("{}", format!("Removed {name} from the round-table").green());
                changed = true;
            }
            if rounds.is_some() || critique.is_some() || parallel.is_some() || timeout.is_some() {
                manager.update_roundtable(RoundTableUpdate {
                    discussion_rounds: rounds,
                    critique_mode: critique,
                    parallel_responses: parallel,
                    timeout_seconds: timeout,
                    ..RoundTableUpdate::default()
                })?;
                println!("{}", "Round-table settings updated".green());
                changed = true;
            }
            if changed {
                manager.save()?;
            }
            if list || !changed {
                let rt = &manager.config().round_table;
                println!("\n{}\n", "Round-table".blue().bold());
                for model in &rt.enabled_models {
                    println!("  - {model}");
                }
                println!("\n  rounds:   {}", rt.discussion_rounds);
                println!("  critique: {}", rt.critique_mode);
                println!("  parallel: {}", rt.parallel_responses);
                println!("  timeout:  {}s", rt.timeout_seconds);
            }
        }
        ConfigCommand::Roles {
            list,
            enabled,
            rotation,
            model,
            assign,
            clear,
            template,
            text,
        } => {
            let mut changed = false;
            if enabled.is_some() || rotation.is_some() {
                manager.update_roundtable(RoundTableUpdate {
                    use_role_based_prompting: enabled,
                    role_rotation: rotation,
                    ..RoundTableUpdate::default()
                })?;
                changed = true;
            }
            if let Some(roles) = assign {
                let Some(model) = model else {
                    anyhow::bail!("--assign requires --model <name>");
                };
                let roles: Vec<String> =
                    roles.split(',').map(|r| r.trim().to_string()).collect();
                manager.assign_roles(&model, &roles)?;
                println!(
                    "{}",
                    format!("Assigned roles to {model}: {}", roles.join(", ")).green()
                );
                changed = true;
            }
            if let Some(model) = clear {
                manager.clear_roles(&model)?;
                println!("{}", format!("Cleared role assignment for {model}").green());
                changed = true;
            }
            if let Some(role) = template {
                let Some(text) = text else {
                    anyhow::bail!("--template requires --text <template>");
                };
                manager.set_role_template(&role, &text)?;
                println!("{}", format!("Template for {role} updated").green());
                changed = true;
            }
            if changed {
                manager.save()?;
            }
            if list || !changed {
                let rt = &manager.config().round_table;
                println!("\n{}\n", "Discussion roles".blue().bold());
                for role in roundtable_domain::DiscussionRole::ALL {
                    println!("  {:<10} {}", role.as_str().bold(), role.description());
                }
                println!("\n  role prompting: {}", rt.use_role_based_prompting);
                println!("  rotation:       {}", rt.role_rotation);
                if !rt.role_assignments.is_empty() {
                    println!("\n  assignments:");
                    for (model, roles) in &rt.role_assignments {
                        println!("    {model}: {}", roles.join(", "));
                    }
                }
            }
        }
    }
    Ok(())
}
