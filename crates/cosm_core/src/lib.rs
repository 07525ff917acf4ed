//! Shared data model (spec §3) and error taxonomy (spec §7) used by every
//! other cosm crate.

pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{
    bucket_key, split_bucket_key, BuildEntry, BuildList, DepEntry, PackageInfo, PackageLocation,
    Project, Registry, Specs,
};
