//! Typed read/write of JSON artifacts at the defined paths of spec §6.

pub mod paths;
pub mod store;

pub use store::{
    load, load_build_list, load_project, load_registry, load_registry_names, load_specs,
    load_versions, save, save_build_list, save_project, save_registry, save_registry_names,
    save_specs, save_versions,
};
