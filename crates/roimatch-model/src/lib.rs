//! Feature tables, the encoder + regressor model, artifact persistence,
//! candidate generation, ranking, and the recommendation service.

pub mod artifact;
pub mod candidates;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod evaluate;
pub mod forest;
pub mod pipeline;
pub mod ranking;
pub mod service;
pub mod table;

pub use artifact::{
    load_artifact, save_artifact, ArtifactMetadata, LabelSource, LoadedModel, ModelKind,
    FORMAT_VERSION,
};
pub use candidates::generate;
pub use dataset::{
    build_creator_dataset, build_performance_dataset, candidate_table, creator_schema,
    label_source_for, Dataset, PerformanceFeatures,
};
pub use encoder::{Encoder, OneHotEncoder};
pub use error::{ArtifactError, ModelError, RecommendError, ServiceError};
pub use evaluate::{mean_squared_error, r2_score, TrainingReport};
pub use forest::{ForestParams, RandomForestRegressor, Regressor};
pub use pipeline::{train_with_holdout, RoiModel, TrainOptions, TrainedModel};
pub use ranking::{rank, rank_by_kpis, rank_by_model, roi_percent, HistoricalPick, Ranked};
pub use roimatch_core::HistoricalFilter;
pub use service::{
    Confidence, ModelSlot, ModelStatus, PredictionAnalysis, PredictionInputInfo,
    PredictionRequest, PredictionResponse, RecommendationRequest, RecommendationService,
    serving_schema,
};
pub use table::{Column, FeatureSchema, FeatureTable, Matrix};
