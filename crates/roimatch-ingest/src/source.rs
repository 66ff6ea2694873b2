//! Filesystem readers for raw profile directories and the sponsored-post
//! observation file.

use std::path::{Path, PathBuf};

use crate::error::IngestError;
use crate::linker::Observation;

/// Minimum tab-separated field count for a usable profile line.
const PROFILE_MIN_FIELDS: usize = 8;

/// One raw profile line, split into the fields the normalizer reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProfile {
    /// Field 0: username or brand name.
    pub identity: String,
    /// Field 1: follower count as written in the source.
    pub followers: String,
    /// Field 7: bio or brand description.
    pub bio: String,
    /// Field 8, when present: explicit campaign budget.
    pub budget: Option<String>,
}

impl RawProfile {
    /// Split a tab-separated profile line. Returns `None` when the line has
    /// fewer than eight fields.
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if fields.len() < PROFILE_MIN_FIELDS {
            return None;
        }
        Some(Self {
            identity: fields[0].trim().to_string(),
            followers: fields[1].trim().to_string(),
            bio: fields[7].to_string(),
            budget: fields
                .get(8)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

/// Raw profiles read from one directory, plus the count of files that could
/// not be read or split.
#[derive(Debug, Clone, Default)]
pub struct ProfileBatch {
    pub records: Vec<RawProfile>,
    pub malformed: usize,
}

/// Read the first line of each regular file in `dir`, in file-name order,
/// stopping after `max_files` files.
///
/// # Errors
///
/// Returns [`IngestError::SourceUnavailable`] if the directory is missing or
/// cannot be listed. Unreadable individual files are counted in
/// [`ProfileBatch::malformed`] instead.
pub fn read_profile_dir(dir: &Path, max_files: usize) -> Result<ProfileBatch, IngestError> {
    let unavailable = |source: std::io::Error| IngestError::SourceUnavailable {
        path: dir.display().to_string(),
        source,
    };

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(unavailable)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    paths.truncate(max_files);

    let mut batch = ProfileBatch::default();
    for path in &paths {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "skipping unreadable profile file");
                batch.malformed += 1;
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        match text.lines().next().and_then(RawProfile::from_line) {
            Some(profile) => batch.records.push(profile),
            None => batch.malformed += 1,
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        files = paths.len(),
        records = batch.records.len(),
        malformed = batch.malformed,
        "read profile directory"
    );
    Ok(batch)
}

/// Like [`read_profile_dir`], but a batch-level failure is logged and
/// yields an empty batch so the surrounding run can continue.
#[must_use]
pub fn load_profile_batch_or_empty(dir: &Path, max_files: usize) -> ProfileBatch {
    match read_profile_dir(dir, max_files) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "profile source unavailable; continuing with empty batch");
            ProfileBatch::default()
        }
    }
}

/// Observations parsed from a post-info file.
#[derive(Debug, Clone, Default)]
pub struct ObservationBatch {
    pub observations: Vec<Observation>,
    pub malformed: usize,
}

/// Read a headerless tab-separated post-info file:
/// `post_id \t username \t is_sponsored [\t observed_roi]`.
///
/// # Errors
///
/// Returns [`IngestError::SourceUnavailable`] if the file cannot be read.
pub fn read_post_info(path: &Path) -> Result<ObservationBatch, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::SourceUnavailable {
        path: path.display().to_string(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let mut batch = ObservationBatch::default();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match parse_observation(line) {
            Some(obs) => batch.observations.push(obs),
            None => batch.malformed += 1,
        }
    }
    Ok(batch)
}

fn parse_observation(line: &str) -> Option<Observation> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
    if fields.len() < 3 {
        return None;
    }
    let username = fields[1].trim();
    if username.is_empty() {
        return None;
    }
    let observed_roi = match fields.get(3).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<f64>().ok().filter(|v| v.is_finite())?),
        None => None,
    };
    Some(Observation {
        post_id: fields[0].trim().to_string(),
        username: username.to_string(),
        is_sponsored: parse_sponsored_flag(fields[2]),
        observed_roi,
    })
}

fn parse_sponsored_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
