use serde::{Deserialize, Serialize};

/// 月度汇总点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    pub month: String,
    pub units: f64,
    pub revenue: f64,
    pub avg_price: f64,
}

/// 区域 / 产品分组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub name: String,
    pub units: f64,
    pub revenue: f64,
}

/// 价格段直方图桶
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub band: String,
    pub count: usize,
}

/// 数据集汇总指标，可随时由记录重新计算
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetrics {
    pub total_units: f64,
    pub total_revenue: f64,
    /// 各记录均价的简单平均 (非按套数加权)，保留两位小数
    pub avg_price: f64,
    pub months: Vec<String>,
    pub monthly: Vec<MonthlyPoint>,
    pub districts: Vec<CategorySlice>,
    pub product_types: Vec<CategorySlice>,
    pub price_bands: Vec<PriceBand>,
}
