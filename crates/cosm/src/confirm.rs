use std::io::Write as _;

/// Isolates "ask the user yes/no on a terminal" behind a trait, the same
/// shape `cosm_depot::Prompter` uses for the depot-path question: commands
/// stay exercisable in tests without a real TTY.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool>;
}

/// Prompts once on stdin/stdout. Used by the `cosm` binary.
#[derive(Debug, Default)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&mut self, prompt: &str) -> anyhow::Result<bool> {
        print!("{prompt} [y/N]: ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        let trimmed = line.trim();
        Ok(trimmed.eq_ignore_ascii_case("y") || trimmed.eq_ignore_ascii_case("yes"))
    }
}

/// Returns a fixed answer without touching a terminal. Used by tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmer(pub bool);

impl Confirmer for FixedConfirmer {
    fn confirm(&mut self, _prompt: &str) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}
