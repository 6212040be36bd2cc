//! Progress reporting for the update pipeline.
//!
//! A binary update reports one transfer labelled "Downloading server files";
//! a data-set update reports one labelled "Downloading server data". After
//! each transfer the pipeline posts plain status lines ("Extracted N files
//! ...", "Installed N files into ...") through [`ProgressReporter::message`].
//!
//! With the `cli` feature, [`cli_progress::CliProgress`] draws `indicatif`
//! bars. Otherwise only [`NoopProgress`] is available.

/// Receives download progress and status lines from the update pipeline.
pub trait ProgressReporter: Send + Sync {
    /// A transfer starts. `message` is the download label, `total` the
    /// archive size in bytes when the server sends a length.
    fn start(&self, message: &str, total: Option<u64>);

    /// Bytes received so far for the current transfer.
    fn update(&self, current: u64, total: Option<u64>);

    /// A status line outside any transfer (extraction and merge results).
    fn message(&self, msg: &str);

    /// The transfer completed; `message` is "<label> complete".
    fn finish(&self, message: &str);

    /// The transfer broke off mid-stream.
    fn finish_with_error(&self, message: &str);
}

/// Discards everything; the default when no terminal is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _message: &str, _total: Option<u64>) {}
    fn update(&self, _current: u64, _total: Option<u64>) {}
    fn message(&self, _msg: &str) {}
    fn finish(&self, _message: &str) {}
    fn finish_with_error(&self, _message: &str) {}
}

#[cfg(feature = "cli")]
pub mod cli_progress {
    use super::ProgressReporter;
    use indicatif::{ProgressBar, ProgressStyle};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Terminal progress bars.
    #[derive(Default)]
    pub struct CliProgress {
        bar: Mutex<Option<ProgressBar>>,
    }

    impl CliProgress {
        pub fn new() -> Self {
            Self::default()
        }

        fn download_bar(total: u64) -> ProgressBar {
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░");
            ProgressBar::new(total).with_style(style)
        }

        fn spinner() -> ProgressBar {
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} {bytes} ({bytes_per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            ProgressBar::new_spinner().with_style(style)
        }

        fn bar(&self) -> MutexGuard<'_, Option<ProgressBar>> {
            self.bar.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl ProgressReporter for CliProgress {
        fn start(&self, message: &str, total: Option<u64>) {
            let pb = match total {
                Some(t) if t > 0 => Self::download_bar(t),
                _ => Self::spinner(),
            };
            pb.set_message(message.to_string());
            *self.bar() = Some(pb);
        }

        fn update(&self, current: u64, total: Option<u64>) {
            if let Some(ref pb) = *self.bar() {
                if let Some(t) = total {
                    pb.set_length(t);
                }
                pb.set_position(current);
            }
        }

        fn message(&self, msg: &str) {
            match *self.bar() {
                Some(ref pb) => pb.println(msg),
                None => println!("{msg}"),
            }
        }

        fn finish(&self, message: &str) {
            if let Some(pb) = self.bar().take() {
                pb.finish_with_message(message.to_string());
            }
        }

        fn finish_with_error(&self, message: &str) {
            if let Some(pb) = self.bar().take() {
                pb.abandon_with_message(message.to_string());
            }
        }
    }
}
