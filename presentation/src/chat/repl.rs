//! REPL (Read-Eval-Print Loop) for interactive chat
//!
//! Holds the running conversation for plain chat and a toggle for
//! round-table mode. Slash commands adjust the session; anything else
//! is sent to the models.

use crate::ConsolePresenter;
use colored::Colorize;
use roundtable_application::{CompletionClientFactory, RunChatUseCase, RunRoundTableUseCase};
use roundtable_domain::{Conversation, ModelSpec, RoundTableSettings};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Interactive chat REPL
pub struct ChatRepl<F: CompletionClientFactory + 'static> {
    chat: RunChatUseCase<F>,
    roundtable: RunRoundTableUseCase<F>,
    settings: RoundTableSettings,
    specs: HashMap<String, ModelSpec>,
    current_model: String,
    roundtable_mode: bool,
    conversation: Conversation,
    presenter: ConsolePresenter,
}

impl<F: CompletionClientFactory + 'static> ChatRepl<F> {
    pub fn new(
        factory: Arc<F>,
        settings: RoundTableSettings,
        specs: HashMap<String, ModelSpec>,
        default_model: String,
        quiet: bool,
    ) -> Self {
        Self {
            chat: RunChatUseCase::new(factory.clone()),
            roundtable: RunRoundTableUseCase::new(factory),
            settings,
            specs,
            current_model: default_model,
            roundtable_mode: false,
            conversation: Conversation::new(),
            presenter: ConsolePresenter::new(quiet),
        }
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = dirs::data_dir().map(|p| p.join("roundtable").join("history.txt"));
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let prompt = if self.roundtable_mode { "rt> " } else { ">>> " };
            match rl.readline(prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line.starts_with('/') {
                        // "/roundtable <prompt>" convenes the table once
                        // without switching modes
                        if let Some(prompt) = line
                            .strip_prefix("/roundtable ")
                            .or_else(|| line.strip_prefix("/rt "))
                            .filter(|p| !matches!(p.trim(), "on" | "off"))
                        {
                            let _ = rl.add_history_entry(line);
                            self.run_roundtable(prompt.trim()).await;
                            continue;
                        }
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }
                    let _ = rl.add_history_entry(line);
                    self.process_prompt(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err:?}");
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│          Round-Table - Chat Mode            │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Model: {}", self.current_model);
        println!("Type /help for commands, /roundtable to convene the table");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&mut self, cmd: &str) -> bool {
        let mut parts = cmd.splitn(2, ' ');
        let head = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match head {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                return true;
            }
            "/help" | "/h" | "/?" => {
                println!();
                println!("Commands:");
                println!("  /help, /h, /?        - Show this help");
                println!("  /model <name>        - Switch the chat model");
                println!("  /models              - List configured models");
                println!("  /roundtable [on|off] - Toggle round-table mode");
                println!("  /roundtable <prompt> - Run one round-table discussion");
                println!("  /clear               - Forget the conversation so far");
                println!("  /history             - Show the conversation so far");
                println!("  /config              - Show session settings");
                println!("  /quit, /exit, /q     - Exit chat");
                println!();
            }
            "/model" => {
                if arg.is_empty() {
                    println!("Current model: {}", self.current_model);
                } else if self.specs.contains_key(arg) {
                    self.current_model = arg.to_string();
                    println!("{}", format!("Switched to {arg}").green());
                } else {
                    println!("{}", format!("No model named '{arg}' is configured").red());
                }
            }
            "/models" => {
                println!();
                println!("Configured models:");
                let mut names: Vec<_> = self.specs.keys().collect();
                names.sort();
                for name in names {
                    let seat = if self.settings.enabled_models.contains(name) {
                        " (round-table)"
                    } else {
                        ""
                    };
                    let current = if *name == self.current_model { "* " } else { "  " };
                    println!("{current}{name}{seat}");
                }
                println!();
            }
            "/roundtable" | "/rt" => {
                self.roundtable_mode = match arg {
                    "on" => true,
                    "off" => false,
                    _ => !self.roundtable_mode,
                };
                if self.roundtable_mode {
                    println!(
                        "{}",
                        format!(
                            "Round-table mode on ({} models, {} rounds)",
                            self.settings.enabled_models.len(),
                            self.settings.discussion_rounds
                        )
                        .green()
                    );
                } else {
                    println!("Round-table mode off");
                }
            }
            "/clear" => {
                self.conversation = Conversation::new();
                println!("Conversation cleared");
            }
            "/history" => {
                println!();
                for turn in self.conversation.turns() {
                    let who = turn.model().unwrap_or("you");
                    println!("{}", format!("[{who}]").dimmed());
                    println!("{}", turn.content);
                }
                println!();
            }
            "/config" => {
                println!();
                println!("Model:     {}", self.current_model);
                println!("Rounds:    {}", self.settings.discussion_rounds);
                println!("Critique:  {}", self.settings.critique_mode);
                println!("Parallel:  {}", self.settings.parallel_responses);
                println!("Timeout:   {}s", self.settings.timeout_seconds);
                println!("Roles:     {}", self.settings.use_role_based_prompting);
                println!();
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type /help for available commands");
            }
        }
        false
    }

    async fn run_roundtable(&self, prompt: &str) {
        match self
            .roundtable
            .run(prompt, &self.settings, &self.specs, &self.presenter)
            .await
        {
            Ok(_) => println!(),
            Err(e) => eprintln!("{}", format!("Error: {e}").red()),
        }
    }

    async fn process_prompt(&mut self, prompt: &str) {
        if self.roundtable_mode {
            self.run_roundtable(prompt).await;
            return;
        }

        let Some(spec) = self.specs.get(&self.current_model).cloned() else {
            eprintln!(
                "{}",
                format!("No model named '{}' is configured", self.current_model).red()
            );
            return;
        };

        println!("\n{}", format!("── {} ──", spec.name).yellow().bold());
        match self
            .chat
            .run(prompt, &spec, &mut self.conversation, &self.presenter)
            .await
        {
            Ok(_) => println!(),
            Err(e) => eprintln!("{}", format!("Error: {e}").red()),
        }
    }
}
