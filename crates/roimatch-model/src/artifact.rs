//! JSON artifact persistence for trained models.
//!
//! The envelope records what the model predicts, where its labels came from,
//! and the held-out report, plus a SHA-256 of the serialized model body.
//! Saves go to a temporary file in the target directory and are renamed into
//! place, so a reader never sees a partial artifact.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ArtifactError;
use crate::evaluate::TrainingReport;
use crate::pipeline::RoiModel;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Creator features to match ROI.
    CreatorRoi,
    /// Campaign features to product sales.
    CampaignSales,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::CreatorRoi => write!(f, "creator_roi"),
            ModelKind::CampaignSales => write!(f, "campaign_sales"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSource {
    Synthetic,
    Observed,
    Mixed,
    Historical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub kind: ModelKind,
    pub trained_at: DateTime<Utc>,
    pub label_source: LabelSource,
    pub report: TrainingReport,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format_version: u32,
    #[serde(flatten)]
    metadata: &'a ArtifactMetadata,
    model_sha256: String,
    model: &'a RoiModel,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(flatten)]
    metadata: ArtifactMetadata,
    model_sha256: String,
    model: RoiModel,
}

#[derive(Deserialize)]
struct VersionHeader {
    format_version: u32,
}

/// A model read back from disk with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub metadata: ArtifactMetadata,
    pub model: RoiModel,
}

/// Write `model` and `metadata` to `path`, replacing any existing artifact
/// atomically. Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`ArtifactError::Io`] on filesystem failures and
/// [`ArtifactError::Json`] if serialization fails.
pub fn save_artifact(
    model: &RoiModel,
    metadata: &ArtifactMetadata,
    path: &Path,
) -> Result<(), ArtifactError> {
    let io_err = |source: std::io::Error| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let envelope = EnvelopeRef {
        format_version: FORMAT_VERSION,
        metadata,
        model_sha256: model_digest(model)?,
        model,
    };
    let body = serde_json::to_vec_pretty(&envelope)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&body).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    tracing::info!(path = %path.display(), kind = %metadata.kind, "model artifact saved");
    Ok(())
}

/// Read and verify an artifact.
///
/// # Errors
///
/// Returns [`ArtifactError::NotFound`] if nothing exists at `path`,
/// [`ArtifactError::UnsupportedVersion`] for an unknown format version,
/// [`ArtifactError::ChecksumMismatch`] if the model body was altered, and
/// [`ArtifactError::Io`] / [`ArtifactError::Json`] otherwise.
pub fn load_artifact(path: &Path) -> Result<LoadedModel, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            ArtifactError::Io {
                path: path.display().to_string(),
                source,
            }
        }
    })?;

    let header: VersionHeader = serde_json::from_slice(&bytes)?;
    if header.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            found: header.format_version,
            supported: FORMAT_VERSION,
        });
    }

    let envelope: Envelope = serde_json::from_slice(&bytes)?;
    if model_digest(&envelope.model)? != envelope.model_sha256 {
        return Err(ArtifactError::ChecksumMismatch);
    }

    Ok(LoadedModel {
        metadata: envelope.metadata,
        model: envelope.model,
    })
}

fn model_digest(model: &RoiModel) -> Result<String, ArtifactError> {
    let compact = serde_json::to_vec(model)?;
    Ok(format!("{:x}", Sha256::digest(&compact)))
}
