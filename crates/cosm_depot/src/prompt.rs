use camino::{Utf8Path, Utf8PathBuf};
use cosm_core::{Error, Result};
use std::io::Write as _;

/// Isolates "ask the user a question on a terminal" behind a trait, the
/// way `release_plz_core` isolates GitHub/Gitea HTTP calls behind a client
/// trait: engines stay exercisable in tests without a real TTY.
pub trait Prompter {
    fn ask_depot_path(&mut self, default: &Utf8Path) -> Result<Utf8PathBuf>;
}

/// Prompts once on stdin/stdout. Used by the `cosm` binary.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask_depot_path(&mut self, default: &Utf8Path) -> Result<Utf8PathBuf> {
        print!("COSM_DEPOT_PATH is not set. Depot location [{default}]: ");
        std::io::stdout().flush().map_err(Error::from)?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map_err(Error::from)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Ok(default.to_owned())
        } else {
            Ok(Utf8PathBuf::from(trimmed))
        }
    }
}

/// Returns a fixed answer without touching a terminal. Used by automation
/// paths and tests.
#[derive(Debug, Clone)]
pub struct FixedPrompter(pub Utf8PathBuf);

impl Prompter for FixedPrompter {
    fn ask_depot_path(&mut self, _default: &Utf8Path) -> Result<Utf8PathBuf> {
        Ok(self.0.clone())
    }
}
