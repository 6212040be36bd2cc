//! Release index parsing.
//!
//! The artifact server publishes an HTML directory listing with one anchor
//! per build and its publish time, e.g.
//! `<a href="2431-350dd7bd.../">2431-350dd7bd.../</a>   19-Sep-2020 14:22   -`.

use chrono::NaiveDateTime;
use fxhost_core::{ReleaseDescriptor, UpdateError};
use regex::Regex;

const RELEASE_PATTERN: &str = r".*?(\d+\-[0-9a-z/]+).*?(\d+\-\D+\-\d+\s\d+\:\d+)";
const TIMESTAMP_FORMAT: &str = "%d-%b-%Y %H:%M";

/// Parse every release listed in `page`.
///
/// Only anchor lines are considered; the parent link and revoked builds are
/// skipped. Lines that do not match the release pattern are dropped.
pub fn parse_release_index(page: &str) -> Result<Vec<ReleaseDescriptor>, UpdateError> {
    let pattern = Regex::new(RELEASE_PATTERN).map_err(|e| UpdateError::Index {
        url: String::new(),
        reason: e.to_string(),
    })?;

    let releases = page
        .lines()
        .filter(|line| {
            line.contains("<a href=") && !line.contains("../") && !line.contains("revoked/")
        })
        .filter_map(|line| {
            let caps = pattern.captures(line)?;
            let released_at = NaiveDateTime::parse_from_str(&caps[2], TIMESTAMP_FORMAT).ok()?;
            Some(ReleaseDescriptor::new(&caps[1], released_at))
        })
        .collect();

    Ok(releases)
}

/// Most recent release in `page`.
pub fn latest_release(page: &str) -> Result<ReleaseDescriptor, UpdateError> {
    let releases = parse_release_index(page)?;
    ReleaseDescriptor::latest(&releases)
        .cloned()
        .ok_or(UpdateError::NoReleases)
}
