//! Server binary and data-set installation.
//!
//! Both procedures download into the updates directory, extract there and
//! then merge the extracted tree into its destination. Build archives are
//! chosen per platform: zip for Windows, `.tar.xz` for Linux.

mod download;
mod extract;
mod index;
mod merge;
mod pipeline;
mod progress;

pub use download::download_to_file;
pub use extract::{ArchiveFormat, extract_archive};
pub use index::{latest_release, parse_release_index};
pub use merge::{MergeSummary, merge_tree};
pub use pipeline::UpdatePipeline;
#[cfg(feature = "cli")]
pub use progress::cli_progress::CliProgress;
pub use progress::{NoopProgress, ProgressReporter};
