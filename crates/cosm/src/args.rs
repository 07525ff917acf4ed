use clap::builder::{styling::AnsiColor, Styles};
use cosm_semver::SemVer;
use tracing::level_filters::LevelFilter;

const MAIN_COLOR: AnsiColor = AnsiColor::Red;
const SECONDARY_COLOR: AnsiColor = AnsiColor::Yellow;
const HELP_STYLES: Styles = Styles::styled()
    .header(MAIN_COLOR.on_default().bold())
    .usage(MAIN_COLOR.on_default().bold())
    .placeholder(SECONDARY_COLOR.on_default())
    .literal(SECONDARY_COLOR.on_default());

/// cosm manages source-level Git dependencies for a project: a registry of
/// packages, a depot that caches their clones and extracted content, and a
/// resolver that turns a project's direct dependencies into a build list.
#[derive(clap::Parser, Debug)]
#[command(name = "cosm", version, styles = HELP_STYLES)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Print source location and additional information in logs.
    ///
    /// `-v` raises the log level to INFO, `-vv` to DEBUG, `-vvv` to TRACE.
    /// To change the log level without also enabling file/line output, use
    /// the `COSM_LOG` environment variable instead.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print machine-readable JSON instead of a human summary, where the
    /// command supports it (`status`, `activate`).
    #[arg(long, global = true)]
    pub json: bool,
}

impl CliArgs {
    pub fn verbosity(&self) -> anyhow::Result<Option<LevelFilter>> {
        let level = match self.verbose {
            0 => None,
            1 => Some(LevelFilter::INFO),
            2 => Some(LevelFilter::DEBUG),
            3 => Some(LevelFilter::TRACE),
            _ => anyhow::bail!("invalid verbosity level. Use -v, -vv, or -vvv."),
        };
        Ok(level)
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Print the cosm version.
    Version,
    /// Print the current project's name, version, and dependency count.
    Status,
    /// Resolve (or reuse the cached) build list for the current project.
    Activate,
    /// Create `Project.json` in the current directory.
    Init {
        name: String,
        version: Option<SemVer>,
        #[arg(long = "language")]
        language: Option<String>,
    },
    /// Add a dependency to the current project.
    Add {
        name: String,
        version: Option<SemVer>,
        /// Registries to search, in order. Defaults to every registered one.
        #[arg(long = "registry")]
        registries: Vec<String>,
    },
    /// Remove a dependency from the current project by name.
    ///
    /// When more than one entry shares that name, re-run with `--bucket`
    /// set to one of the printed bucket keys to pick which one.
    Rm {
        name: String,
        #[arg(long)]
        bucket: Option<String>,
    },
    /// Tag and push a new release of the current project.
    Release {
        version: Option<SemVer>,
        #[arg(long, conflicts_with_all = ["minor", "major"])]
        patch: bool,
        #[arg(long, conflicts_with_all = ["patch", "major"])]
        minor: bool,
        #[arg(long, conflicts_with_all = ["patch", "minor"])]
        major: bool,
    },
    /// Registry lifecycle and package metadata operations.
    Registry {
        #[command(subcommand)]
        command: RegistryCommand,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum RegistryCommand {
    /// Turn an empty Git remote into a fresh registry and register it locally.
    Init { name: String, giturl: String },
    /// Clone an existing registry by URL and register it under its own name.
    Clone { giturl: String },
    /// Forget a registered registry and remove its local working copy.
    Delete {
        name: String,
        #[arg(long)]
        force: bool,
    },
    /// Pull one registry, or every registered registry with `--all`.
    Update {
        name: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Register a package by its Git URL, or publish a new version of one
    /// already in the registry.
    Add {
        registry: String,
        /// A Git URL (first publish) or an already-registered package name.
        target: String,
        /// The version to publish, when `target` is a package name.
        version: Option<SemVer>,
    },
    /// Remove a package, or a single version of it, from a registry.
    Rm {
        registry: String,
        package: String,
        version: Option<SemVer>,
        #[arg(long)]
        force: bool,
    },
    /// Print package and version counts for one registry, read-only.
    Status { name: String },
}
