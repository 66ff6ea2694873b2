//! Raw-source readers, record normalization, and match linkage.
//!
//! Everything here is pure apart from file reads in [`source`] and the
//! injected random source used for budget simulation and synthetic links.

pub mod error;
pub mod linker;
pub mod normalize;
pub mod performance;
pub mod source;

pub use error::{IngestError, LinkError};
pub use linker::{Linked, Observation, SyntheticLinker};
pub use normalize::{
    normalize_campaigns, normalize_creators, BudgetPolicy, CampaignNormalizeConfig,
    CreatorNormalizeConfig, Normalized,
};
pub use performance::{parse_performance_csv, read_performance_csv, PerformanceBatch};
pub use source::{
    load_profile_batch_or_empty, read_post_info, read_profile_dir, ObservationBatch,
    ProfileBatch, RawProfile,
};
