use serde::{Deserialize, Serialize};

use super::{DatasetMetrics, ListingRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    #[default]
    Zh,
}

/// 市场解读请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default)]
    pub locale: Locale,
    pub metrics: DatasetMetrics,
    pub samples: Vec<ListingRecord>,
}
