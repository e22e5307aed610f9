//! Uniform `{data_quality, confidence_level}` envelope for analytics results

use serde::{Deserialize, Serialize};

use super::sufficiency::{ConfidenceLevel, DataSufficiency};

/// Quality/confidence metadata carried by every analytics response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// 0-100
    pub data_quality: f64,
    pub confidence_level: ConfidenceLevel,
}

impl ResponseMetadata {
    pub fn from_sufficiency(sufficiency: &DataSufficiency) -> Self {
        Self {
            data_quality: sufficiency.data_quality_score.clamp(0.0, 100.0),
            confidence_level: sufficiency.confidence_level(),
        }
    }
}

/// An analytics result with its metadata
///
/// Struct results serialize flat with an extra `metadata` field; list
/// results go under `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithMetadata<T> {
    #[serde(flatten)]
    pub data: T,
    pub metadata: ResponseMetadata,
}

/// Wrapper so sequence results still serialize as an object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing<T> {
    pub data: Vec<T>,
}

impl<T> From<Vec<T>> for Listing<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// Attach metadata derived from `sufficiency` to a result
pub fn attach_metadata<T>(result: T, sufficiency: &DataSufficiency) -> WithMetadata<T> {
    WithMetadata {
        data: result,
        metadata: ResponseMetadata::from_sufficiency(sufficiency),
    }
}
