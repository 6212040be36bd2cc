//! Server process launch, shutdown and resource sampling.

mod error;
mod handle;
mod shutdown;
mod spawn;
mod usage;

pub use error::ProcessError;
pub use handle::ServerProcessHandle;
pub use shutdown::shutdown_child;
pub use spawn::launch_server;
pub use usage::{ProcessUsage, UsageSampler};
