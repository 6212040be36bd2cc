//! Remote release descriptors.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One downloadable server build parsed from the remote artifact index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    /// Relative path of the build directory, e.g. `2431-350dd7bd5c.../`
    pub version_path: String,
    /// Publish time as listed in the index (no timezone in the listing)
    pub released_at: NaiveDateTime,
}

impl ReleaseDescriptor {
    pub fn new(version_path: impl Into<String>, released_at: NaiveDateTime) -> Self {
        Self {
            version_path: version_path.into(),
            released_at,
        }
    }

    /// Version path without the trailing slash, used for staging file names.
    pub fn version_name(&self) -> &str {
        self.version_path.trim_end_matches('/')
    }

    /// Pick the most recently published release.
    pub fn latest<'a, I>(releases: I) -> Option<&'a Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        releases.into_iter().max_by_key(|r| r.released_at)
    }
}

impl fmt::Display for ReleaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.version_name(), self.released_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 9, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn latest_ignores_listing_order() {
        let releases = vec![
            ReleaseDescriptor::new("2-bbb/", at(2)),
            ReleaseDescriptor::new("3-ccc/", at(3)),
            ReleaseDescriptor::new("1-aaa/", at(1)),
        ];
        let latest = ReleaseDescriptor::latest(&releases).unwrap();
        assert_eq!(latest.version_path, "3-ccc/");
    }

    #[test]
    fn latest_of_empty_is_none() {
        let releases: Vec<ReleaseDescriptor> = Vec::new();
        assert!(ReleaseDescriptor::latest(&releases).is_none());
    }

    #[test]
    fn version_name_strips_trailing_slash() {
        let r = ReleaseDescriptor::new("2431-350dd7bd/", at(1));
        assert_eq!(r.version_name(), "2431-350dd7bd");
    }
}
