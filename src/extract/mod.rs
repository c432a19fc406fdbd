//! Field and record extraction with per-field fallback chains.

pub mod field;
pub mod normalize;
pub mod record;
pub mod selectors;
pub mod strategy;

pub use field::FieldExtractor;
pub use normalize::Normalize;
pub use record::RecordExtractor;
pub use strategy::{
    ExtractionConfig, FieldSpec, FieldSpecs, Source, Strategy, StrategyConfig, StrategyOutcome,
};
