//! Installation layout and platform path resolution.
//!
//! # Modules
//!
//! - `layout` - the install/staging/data directory triple and derived paths
//! - `platform` - supported operating systems and their executable paths
//! - `error` - path resolution errors

mod error;
mod layout;
mod platform;

pub use error::PathError;
pub use layout::{CITIZEN_DIR, InstallationLayout, SERVER_DATA_DIR};
pub use platform::SupportedOs;
