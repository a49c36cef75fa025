//! # Configuration: target records and layered file loading.
//!
//! The dispatch core consumes only the resolved [`TargetConfig`] list and
//! [`Settings`]; this module produces them from YAML files discovered on an
//! XDG-style search path.

mod loader;
mod model;

pub use loader::{load, SearchPath, CONFIG_SUBDIR};
pub use model::{Settings, TargetConfig};
