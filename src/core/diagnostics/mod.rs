// Offline checks over the bot's files, used by the `doctor` subcommands.

pub mod config_check;
pub mod language_check;
pub mod state_check;

pub use config_check::{check_global_config, check_guild_config};
pub use language_check::check_languages;
pub use state_check::{analyze_states, apply_entry_cleanup, plan_cleanup, CleanupAction};

/// Findings of one check. Issues are errors, warnings are advisory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl Report {
    pub fn issue(&mut self, message: impl Into<String>) {
        self.issues.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn merge(&mut self, other: Report) {
        self.issues.extend(other.issues);
        self.warnings.extend(other.warnings);
    }
}
