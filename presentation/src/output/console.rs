//! Console renderer for chat and round-table output

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use roundtable_application::RoundTablePresenter;
use roundtable_domain::{DiscussionRole, ResponseOutcome, RoundResult};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Renders discussion progress and responses to the terminal.
///
/// Responses arrive in configured model order in every mode, so the
/// rendering is deterministic even for parallel rounds.
pub struct ConsolePresenter {
    quiet: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsolePresenter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap()
    }

    fn model_header(model: &str, role: Option<DiscussionRole>) -> String {
        match role {
            Some(role) => format!("── {model} ({role}) ──"),
            None => format!("── {model} ──"),
        }
    }

    fn clear_spinner(&self) {
        if let Some(pb) = self.spinner.lock().unwrap().take() {
            pb.finish_and_clear();
        }
    }
}

impl Default for ConsolePresenter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl RoundTablePresenter for ConsolePresenter {
    fn on_round_start(&self, round_index: usize, total_rounds: usize) {
        if self.quiet {
            return;
        }
        println!(
            "\n{}",
            format!("=== Round {}/{} ===", round_index + 1, total_rounds)
                .cyan()
                .bold()
        );

        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message("waiting for responses...");
        pb.enable_steady_tick(Duration::from_millis(120));
        *self.spinner.lock().unwrap() = Some(pb);
    }

    fn on_model_start(&self, model: &str, role: Option<DiscussionRole>) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.spinner.lock().unwrap().as_ref() {
            pb.set_message(format!("{} is thinking...", Self::model_header(model, role)));
        }
    }

    fn on_model_chunk(&self, _model: &str, chunk: &str) {
        print!("{chunk}");
        let _ = std::io::stdout().flush();
    }

    fn on_model_response(&self, model: &str, role: Option<DiscussionRole>, text: &str) {
        self.clear_spinner();
        println!("\n{}", Self::model_header(model, role).yellow().bold());
        println!("{text}");
    }

    fn on_round_result(&self, _round_index: usize, result: &RoundResult) {
        self.clear_spinner();
        if self.quiet {
            return;
        }
        let failed: Vec<&str> = result
            .responses()
            .iter()
            .filter(|r| r.outcome != ResponseOutcome::Ok)
            .map(|r| r.model.as_str())
            .collect();
        if !failed.is_empty() {
            println!(
                "{}",
                format!("warning: no response from {}", failed.join(", ")).red()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_header_includes_role_when_present() {
        assert_eq!(
            ConsolePresenter::model_header("openai/gpt-4", Some(DiscussionRole::Critic)),
            "── openai/gpt-4 (critic) ──"
        );
        assert_eq!(
            ConsolePresenter::model_header("openai/gpt-4", None),
            "── openai/gpt-4 ──"
        );
    }

    #[test]
    fn test_quiet_suppresses_progress_not_responses() {
        let presenter = ConsolePresenter::new(true);
        presenter.on_round_start(0, 2);
        assert!(presenter.spinner.lock().unwrap().is_none());
        // The response path has no quiet gate; only banners and the
        // spinner are dropped
        presenter.on_model_response("openai/gpt-4", None, "still printed");
        presenter.on_round_result(0, &RoundResult::new(0, vec![]));
    }
}
