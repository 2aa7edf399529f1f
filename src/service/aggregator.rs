use indexmap::IndexMap;

use super::fields::UNLABELED;
use crate::models::{CategorySlice, DatasetMetrics, ListingRecord, MonthlyPoint, PriceBand};

/// 价格段分界 (元/㎡)
pub const PRICE_STOPS: [f64; 4] = [10000.0, 20000.0, 30000.0, 50000.0];

/// 未填价格的桶
pub const NO_PRICE_BAND: &str = "未填价格";

/// 由记录计算汇总指标；纯函数，空输入得到全零指标
pub fn aggregate(records: &[ListingRecord]) -> DatasetMetrics {
    let monthly = build_monthly(records);
    let districts = build_slices(records, |r| r.district.as_deref());
    let product_types = build_slices(records, |r| r.product_type.as_deref());

    let total_units: f64 = records.iter().map(|r| r.units_sold.unwrap_or(0.0)).sum();
    let total_revenue: f64 = records.iter().map(|r| r.revenue.unwrap_or(0.0)).sum();

    let prices: Vec<f64> = records.iter().filter_map(|r| r.avg_price).collect();
    let avg_price = if prices.is_empty() {
        0.0
    } else {
        round2(prices.iter().sum::<f64>() / prices.len() as f64)
    };

    DatasetMetrics {
        total_units,
        total_revenue,
        avg_price,
        months: monthly.iter().map(|m| m.month.clone()).collect(),
        monthly,
        districts,
        product_types,
        price_bands: build_price_bands(records),
    }
}

#[derive(Default)]
struct MonthAccumulator {
    units: f64,
    revenue: f64,
    price_sum: f64,
    price_count: usize,
}

/// 按月份字符串分组，月份升序
fn build_monthly(records: &[ListingRecord]) -> Vec<MonthlyPoint> {
    let mut groups: IndexMap<&str, MonthAccumulator> = IndexMap::new();

    for record in records {
        let entry = groups.entry(record.month.as_str()).or_default();
        entry.units += record.units_sold.unwrap_or(0.0);
        entry.revenue += record.revenue.unwrap_or(0.0);
        if let Some(price) = record.avg_price {
            entry.price_sum += price;
            entry.price_count += 1;
        }
    }

    let mut points: Vec<MonthlyPoint> = groups
        .into_iter()
        .map(|(month, acc)| MonthlyPoint {
            month: month.to_string(),
            units: acc.units,
            revenue: acc.revenue,
            avg_price: if acc.price_count > 0 {
                acc.price_sum / acc.price_count as f64
            } else {
                0.0
            },
        })
        .collect();

    points.sort_by(|a, b| a.month.cmp(&b.month));
    points
}

/// 按字段分组汇总，成交额降序 (稳定排序，同额保持首次出现顺序)
fn build_slices<F>(records: &[ListingRecord], key: F) -> Vec<CategorySlice>
where
    F: Fn(&ListingRecord) -> Option<&str>,
{
    let mut groups: IndexMap<&str, (f64, f64)> = IndexMap::new();

    for record in records {
        let name = key(record).unwrap_or(UNLABELED);
        let entry = groups.entry(name).or_insert((0.0, 0.0));
        entry.0 += record.units_sold.unwrap_or(0.0);
        entry.1 += record.revenue.unwrap_or(0.0);
    }

    let mut slices: Vec<CategorySlice> = groups
        .into_iter()
        .map(|(name, (units, revenue))| CategorySlice {
            name: name.to_string(),
            units,
            revenue,
        })
        .collect();

    slices.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    slices
}

/// 均价所属价格段标签
pub fn price_band_for(value: Option<f64>) -> String {
    let Some(value) = value.filter(|v| !v.is_nan()) else {
        return NO_PRICE_BAND.to_string();
    };

    if value < PRICE_STOPS[0] {
        return format!("< {}", PRICE_STOPS[0]);
    }
    for pair in PRICE_STOPS.windows(2) {
        if value >= pair[0] && value < pair[1] {
            return format!("{} - {}", pair[0], pair[1]);
        }
    }
    format!("≥ {}", PRICE_STOPS[PRICE_STOPS.len() - 1])
}

/// 价格段直方图，按标签字符串升序 (非数值顺序)
fn build_price_bands(records: &[ListingRecord]) -> Vec<PriceBand> {
    let mut buckets: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        *buckets.entry(price_band_for(record.avg_price)).or_insert(0) += 1;
    }

    let mut bands: Vec<PriceBand> = buckets
        .into_iter()
        .map(|(band, count)| PriceBand { band, count })
        .collect();
    bands.sort_by(|a, b| a.band.cmp(&b.band));
    bands
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
