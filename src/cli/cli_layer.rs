// Command line surface: the bot runner plus the `doctor` maintenance tools.

pub mod doctor;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mc-status-bot")]
#[command(about = "Discord bot that keeps Minecraft server status messages up to date")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Folder holding global-config.json, configs/, states/, Icons/, texts/ and logs/
    #[arg(long, global = true, env = "MCSTATUS_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to Discord and start monitoring (default)
    Run,
    /// Offline checks and maintenance of the bot's files
    Doctor {
        #[command(subcommand)]
        cmd: DoctorCommand,
    },
}

#[derive(Subcommand)]
pub enum DoctorCommand {
    /// Validate global-config.json and every guild config
    CheckConfig,
    /// Compare the language files for missing keys and placeholders
    CheckLanguages,
    /// Summarize the saved status message state
    StateReport,
    /// Remove orphaned and empty state entries
    StateCleanup {
        /// Apply the removals instead of only listing them
        #[arg(long)]
        yes: bool,
    },
    /// Query a Minecraft server once and print the result
    Ping {
        address: String,
        #[arg(long, default_value_t = 25565)]
        port: u16,
    },
    /// Check that Discord and a sample Minecraft server are reachable
    Network {
        #[arg(long, default_value = "mc.hypixel.net")]
        sample: String,
    },
    /// Manage custom language files
    Lang {
        #[command(subcommand)]
        cmd: LangCommand,
    },
}

#[derive(Subcommand)]
pub enum LangCommand {
    /// Copy a language into a new custom_<name> language
    Create {
        name: String,
        #[arg(long, default_value = "en")]
        base: String,
    },
    /// Delete a custom language
    Delete { code: String },
    /// Set one text of a custom language, e.g. `status.footer`
    Set {
        code: String,
        key: String,
        value: String,
    },
}

/// File layout under the data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn global_config(&self) -> PathBuf {
        self.root.join("global-config.json")
    }

    pub fn configs(&self) -> PathBuf {
        self.root.join("configs")
    }

    pub fn states(&self) -> PathBuf {
        self.root.join("states")
    }

    pub fn icons(&self) -> PathBuf {
        self.root.join("Icons")
    }

    pub fn texts(&self) -> PathBuf {
        self.root.join("texts")
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Creates every folder the bot writes into.
    pub fn create_all(&self) -> std::io::Result<()> {
        for dir in [
            self.configs(),
            self.states(),
            self.icons(),
            self.texts(),
            self.logs(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_is_the_default() {
        let cli = Cli::try_parse_from(["mc-status-bot", "--data-dir", "/srv/bot"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.data_dir, PathBuf::from("/srv/bot"));
    }

    #[test]
    fn parses_doctor_subcommands() {
        let cli = Cli::try_parse_from(["mc-status-bot", "doctor", "state-cleanup", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Doctor {
                cmd: DoctorCommand::StateCleanup { yes: true }
            })
        ));

        let cli = Cli::try_parse_from([
            "mc-status-bot",
            "doctor",
            "ping",
            "play.example.org",
            "--port",
            "25570",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Doctor {
                cmd: DoctorCommand::Ping { address, port },
            }) => {
                assert_eq!(address, "play.example.org");
                assert_eq!(port, 25570);
            }
            _ => panic!("expected doctor ping"),
        }
    }

    #[test]
    fn creates_data_folders() {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.create_all().unwrap();
        for sub in ["configs", "states", "Icons", "texts", "logs"] {
            assert!(dir.path().join(sub).is_dir(), "{sub} missing");
        }
    }
}
