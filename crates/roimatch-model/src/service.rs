//! The recommendation service: two lazily-loaded model slots plus the
//! candidate sets used for recommendation requests.
//!
//! Built once at startup and shared behind an `Arc`. Model artifacts are
//! read at most once per slot; after that every call reads the shared
//! `Arc<LoadedModel>` without locking.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use roimatch_core::{AppConfig, Candidate, Platform, Recommendation, Tier};
use serde::{Deserialize, Serialize};

use crate::artifact::{load_artifact, LabelSource, LoadedModel, ModelKind};
use crate::candidates::generate;
use crate::dataset::{
    candidate_table, creator_schema, PerformanceFeatures, FOLLOWER_COUNT, NICHE, PLATFORM,
};
use crate::error::{ArtifactError, ServiceError};
use crate::ranking::rank_by_model;
use crate::table::{Column, FeatureSchema, FeatureTable};

/// One model artifact, loaded on first use.
///
/// The `OnceLock` is the only synchronization point: concurrent first calls
/// race to load, exactly one result is kept, and a missing or unreadable
/// artifact is remembered as absent.
#[derive(Debug)]
pub struct ModelSlot {
    kind: ModelKind,
    path: Option<PathBuf>,
    cell: OnceLock<Option<Arc<LoadedModel>>>,
}

impl ModelSlot {
    /// A slot that loads `path` on first access.
    #[must_use]
    pub fn new(kind: ModelKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: Some(path.into()),
            cell: OnceLock::new(),
        }
    }

    /// A slot that already holds `model`.
    #[must_use]
    pub fn loaded(model: LoadedModel) -> Self {
        let cell = OnceLock::new();
        let kind = model.metadata.kind;
        let _ = cell.set(Some(Arc::new(model)));
        Self {
            kind,
            path: None,
            cell,
        }
    }

    /// A slot with no model and nothing to load.
    #[must_use]
    pub fn empty(kind: ModelKind) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(None);
        Self {
            kind,
            path: None,
            cell,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The loaded model, reading the artifact on the first call.
    #[must_use]
    pub fn get(&self) -> Option<&Arc<LoadedModel>> {
        self.cell
            .get_or_init(|| self.path.as_deref().and_then(|p| load_slot(self.kind, p)))
            .as_ref()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.get().is_some()
    }
}

fn load_slot(kind: ModelKind, path: &Path) -> Option<Arc<LoadedModel>> {
    match load_artifact(path) {
        Ok(loaded) if loaded.metadata.kind != kind => {
            tracing::error!(
                model = %kind,
                found = %loaded.metadata.kind,
                path = %path.display(),
                "artifact holds the wrong model kind; treating as absent"
            );
            None
        }
        Ok(loaded) if loaded.model.schema() != &serving_schema(kind) => {
            tracing::error!(
                model = %kind,
                path = %path.display(),
                expected = ?serving_schema(kind),
                found = ?loaded.model.schema(),
                "artifact was trained on features the service cannot supply; treating as absent"
            );
            None
        }
        Ok(loaded) => {
            tracing::info!(
                model = %kind,
                path = %path.display(),
                label_source = ?loaded.metadata.label_source,
                r2 = ?loaded.metadata.report.r2,
                "model loaded"
            );
            Some(Arc::new(loaded))
        }
        Err(ArtifactError::NotFound { .. }) => {
            tracing::warn!(model = %kind, path = %path.display(), "model artifact absent");
            None
        }
        Err(e) => {
            tracing::error!(model = %kind, path = %path.display(), error = %e, "failed to load model artifact");
            None
        }
    }
}

/// Feature columns the service builds at request time for each model kind.
/// Recommendation candidates only carry platform, tier and budget.
#[must_use]
pub fn serving_schema(kind: ModelKind) -> FeatureSchema {
    match kind {
        ModelKind::CreatorRoi => creator_schema(),
        ModelKind::CampaignSales => PerformanceFeatures::Basic.schema(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub budget: i64,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub follower_count: i64,
    pub niche: String,
    pub platform: String,
    pub budget: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionInputInfo {
    pub niche: String,
    pub platform: String,
}

/// How much to trust a prediction, from the label provenance and held-out R².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[serde(rename = "Low (Synthetic Data)")]
    LowSynthetic,
}

impl Confidence {
    #[must_use]
    pub fn assess(label_source: LabelSource, r2: Option<f64>) -> Self {
        if label_source == LabelSource::Synthetic {
            return Confidence::LowSynthetic;
        }
        match r2 {
            Some(v) if v >= 0.7 => Confidence::High,
            Some(v) if v >= 0.4 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionAnalysis {
    pub predicted_roi: f64,
    pub estimated_revenue: f64,
    pub confidence_score: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub input_info: PredictionInputInfo,
    pub ai_analysis: PredictionAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub roi_model: bool,
    pub sales_model: bool,
}

#[derive(Debug)]
pub struct RecommendationService {
    roi: ModelSlot,
    sales: ModelSlot,
    platforms: Vec<Platform>,
    tiers: Vec<Tier>,
    default_top_k: usize,
}

impl RecommendationService {
    #[must_use]
    pub fn new(roi: ModelSlot, sales: ModelSlot, default_top_k: usize) -> Self {
        Self {
            roi,
            sales,
            platforms: Platform::CANDIDATES.to_vec(),
            tiers: Tier::ALL.to_vec(),
            default_top_k,
        }
    }

    /// Slots pointing at the configured artifact paths. Nothing is read
    /// until [`warm`](Self::warm) or the first request.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ModelSlot::new(ModelKind::CreatorRoi, &config.roi_model_path),
            ModelSlot::new(ModelKind::CampaignSales, &config.sales_model_path),
            config.default_top_k,
        )
    }

    #[must_use]
    pub fn with_candidates(mut self, platforms: Vec<Platform>, tiers: Vec<Tier>) -> Self {
        self.platforms = platforms;
        self.tiers = tiers;
        self
    }

    /// Force both slots to load now and report the result.
    pub fn warm(&self) -> ModelStatus {
        self.status()
    }

    #[must_use]
    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            roi_model: self.roi.is_loaded(),
            sales_model: self.sales.is_loaded(),
        }
    }

    /// Rank candidate placements for a budget by predicted sales.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidBudget`] if `budget <= 0`
    /// - [`ServiceError::InvalidInput`] if `top_k` is zero
    /// - [`ServiceError::ModelUnavailable`] if no sales model is loaded
    /// - [`ServiceError::Prediction`] if the model rejects the candidate rows
    pub fn recommend(
        &self,
        req: &RecommendationRequest,
    ) -> Result<Vec<Recommendation>, ServiceError> {
        if req.budget <= 0 {
            return Err(ServiceError::InvalidBudget(req.budget));
        }
        let top_k = req.top_k.unwrap_or(self.default_top_k);
        if top_k == 0 {
            return Err(ServiceError::InvalidInput("top_k must be at least 1".into()));
        }
        let model = self
            .sales
            .get()
            .ok_or(ServiceError::ModelUnavailable("sales"))?;

        let candidates: Vec<Candidate> = generate(req.budget, &self.platforms, &self.tiers)?
            .into_iter()
            .filter(|c| req.platform.is_none_or(|p| p == c.platform))
            .filter(|c| req.tier.is_none_or(|t| t == c.influencer_tier))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let table = candidate_table(&candidates)?;
        let sales = model.model.predict(&table)?;
        let recs = rank_by_model(candidates, &sales, top_k)?;

        tracing::debug!(
            budget = req.budget,
            returned = recs.len(),
            "recommendations ranked"
        );
        Ok(recs)
    }

    /// Predict ROI for a single creator profile and estimate revenue.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidBudget`] if `budget <= 0`
    /// - [`ServiceError::InvalidInput`] for a negative follower count or a
    ///   blank platform
    /// - [`ServiceError::ModelUnavailable`] if no ROI model is loaded
    /// - [`ServiceError::Prediction`] if the model rejects the row
    #[allow(clippy::cast_precision_loss)]
    pub fn predict_roi(&self, req: &PredictionRequest) -> Result<PredictionResponse, ServiceError> {
        if req.budget <= 0 {
            return Err(ServiceError::InvalidBudget(req.budget));
        }
        if req.follower_count < 0 {
            return Err(ServiceError::InvalidInput(format!(
                "follower_count must be non-negative, got {}",
                req.follower_count
            )));
        }
        let raw_platform = req.platform.trim();
        if raw_platform.is_empty() {
            return Err(ServiceError::InvalidInput("platform must not be empty".to_string()));
        }
        // Known platforms use their canonical spelling; anything else is passed
        // through and one-hot encodes to all zeros.
        let platform = raw_platform
            .parse::<Platform>()
            .map_or_else(|_| raw_platform.to_string(), |p| p.to_string());
        let model = self.roi.get().ok_or(ServiceError::ModelUnavailable("roi"))?;

        let row = FeatureTable::new()
            .with(NICHE, Column::Categorical(vec![req.niche.clone()]))?
            .with(PLATFORM, Column::Categorical(vec![platform.clone()]))?
            .with(
                FOLLOWER_COUNT,
                Column::Numeric(vec![req.follower_count as f64]),
            )?;
        let raw = model
            .model
            .predict(&row)?
            .first()
            .copied()
            .unwrap_or_default();

        let predicted_roi = round_to(raw, 2);
        let estimated_revenue = round_to(req.budget as f64 * predicted_roi, 0);
        let meta = &model.metadata;

        Ok(PredictionResponse {
            input_info: PredictionInputInfo {
                niche: req.niche.clone(),
                platform,
            },
            ai_analysis: PredictionAnalysis {
                predicted_roi,
                estimated_revenue,
                confidence_score: Confidence::assess(meta.label_source, meta.report.r2),
            },
        })
    }
}

fn round_to(v: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (v * scale).round() / scale
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
