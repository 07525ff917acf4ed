#[path = "all/cli.rs"]
mod cli;
