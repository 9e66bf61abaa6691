pub mod config;
pub mod csv_io;
pub mod error;
pub mod export;
pub mod features;
pub mod h2h;
pub mod incremental;
pub mod match_store;
pub mod pipeline;
pub mod rolling;
pub mod season;
pub mod store;
pub mod table;
pub mod team_history;

pub use config::{H2hStrategy, PipelineConfig, PromotedBaseline};
pub use error::{MalformedReason, PipelineError};
pub use features::{MarketValues, feature_columns};
pub use incremental::{IncrementalUpdate, UpdateReport, update_features};
pub use match_store::{Match, MatchKey, MatchStore, Outcome, RawMatch, TeamAliases};
pub use pipeline::{Derivation, DerivationReport, PipelineContext, derive_features};
pub use table::{FeatureRow, FeatureTable, SchemaDrift};
