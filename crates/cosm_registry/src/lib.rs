//! Registry lifecycle (init/clone/update/delete) and package lifecycle
//! within a registry (add/rm/find), plus the package materializer that
//! turns a resolved `(name, version)` into a checked-out file tree.
//!
//! Every mutating operation follows load → mutate → commit-and-push: a
//! registry is a Git working copy under the sole control of the local
//! process for the operation's duration (§4.10's registry state machine).

mod engine;
mod materializer;
mod tmp_clone;

pub use engine::RegistryEngine;
pub use materializer::make_available;
