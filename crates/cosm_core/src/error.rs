//! The error taxonomy every cosm engine returns (spec §7). Kinds are the
//! ones named in the spec, not a type-per-failure-site explosion; callers
//! match on variant, not on error message text, wherever that matters
//! (e.g. "nothing to commit" and "up-to-date" are absorbed inside
//! `cosm_git` and never surface as errors here at all).

/// The sole error type returned by cosm's core engines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// CLI shape violations; surfaced to the user, exit non-zero.
    #[error("{0}")]
    ArgError(String),

    /// A project, registry, package, or version is missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// A name/version collision, or a pre-existing `Project.json`/registry.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// JSON parse failure, or a semantic invariant violation (UUID text
    /// that is not a UUID, version text that is not SemVer).
    #[error("malformed data: {0}")]
    Malformed(String),

    /// A requested new version is not strictly greater than current.
    #[error("version order violation: {0}")]
    VersionOrder(String),

    /// Uncommitted changes, behind origin, non-empty clone target, or an
    /// operation that would require rewriting history.
    #[error("repository state: {0}")]
    RepoState(String),

    /// A wrapped external `git` process failure.
    #[error(transparent)]
    Git(#[from] cosm_git::GitError),

    /// A filesystem failure not covered by the variants above.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An interactive prompt declined a destructive action.
    #[error("cancelled by user")]
    UserCancelled,
}

impl From<cosm_semver::ParseError> for Error {
    fn from(e: cosm_semver::ParseError) -> Self {
        Error::Malformed(e.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(e: uuid::Error) -> Self {
        Error::Malformed(format!("invalid UUID: {e}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Malformed(format!("invalid JSON: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
