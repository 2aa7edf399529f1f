use uuid::Uuid;

use super::fields::{
    month_from_cell, month_from_text, pick_value, placeholder_month, to_number, to_text, Field,
    HEADER_ALIASES, MONTH_ALIASES,
};
use super::workbook::{read_workbook, RawRow, RawSheet};
use crate::error::ParseError;
use crate::models::{Dataset, ListingRecord, SheetSummary};

/// 解析上传的工作簿：逐表、逐行标准化，记录按工作表顺序、行顺序展开
pub fn parse(bytes: &[u8]) -> Result<Dataset, ParseError> {
    let raw_sheets = read_workbook(bytes)?;

    let mut dataset = Dataset::default();
    for raw in &raw_sheets {
        let (summary, records) = normalize_sheet(raw);
        tracing::debug!(
            "工作表 {}: 月份 {}, 读取 {} 行, 有效 {} 条",
            summary.name, summary.month, summary.rows, records.len()
        );
        dataset.sheets.push(summary);
        dataset.records.extend(records);
    }

    tracing::info!(
        "工作簿解析完成: {} 个工作表, {} 条记录",
        dataset.sheets.len(),
        dataset.records.len()
    );

    Ok(dataset)
}

/// 标准化单个工作表，月份由表名推断
pub fn normalize_sheet(raw: &RawSheet) -> (SheetSummary, Vec<ListingRecord>) {
    let month = sheet_month(&raw.name, raw.index);

    let records = raw
        .rows
        .iter()
        .filter_map(|row| normalize_row(row, &month))
        .collect();

    let summary = SheetSummary {
        name: raw.name.clone(),
        month,
        rows: raw.rows.len(),
    };

    (summary, records)
}

/// 表名中的月份，识别不到时使用 `未标注-<n>`
pub fn sheet_month(sheet_name: &str, sheet_index: usize) -> String {
    month_from_text(sheet_name).unwrap_or_else(|| placeholder_month(sheet_index))
}

/// 标准化单行；项目、区域、均价、套数都没有时丢弃
pub fn normalize_row(row: &RawRow, sheet_month: &str) -> Option<ListingRecord> {
    let mut record = ListingRecord {
        id: String::new(),
        month: sheet_month.to_string(),
        city: None,
        district: None,
        project: None,
        product_type: None,
        avg_price: None,
        units_sold: None,
        area: None,
        revenue: None,
    };

    for (field, aliases) in HEADER_ALIASES {
        let Some(value) = pick_value(row, aliases) else {
            continue;
        };

        match field {
            Field::Project => record.project = to_text(value),
            Field::City => record.city = to_text(value),
            Field::District => record.district = to_text(value),
            Field::ProductType => record.product_type = to_text(value),
            Field::AvgPrice => record.avg_price = to_number(value),
            Field::UnitsSold => record.units_sold = to_number(value),
            Field::Area => record.area = to_number(value),
        }
    }

    // 行内月份列覆盖表名月份；无法识别时保留表名月份
    if let Some(month) = pick_value(row, MONTH_ALIASES).and_then(month_from_cell) {
        record.month = month;
    }

    let has_content = record.project.is_some()
        || record.district.is_some()
        || record.avg_price.is_some()
        || record.units_sold.is_some();
    if !has_content {
        return None;
    }

    record.revenue = match (record.units_sold, record.avg_price) {
        (Some(units), Some(price)) => Some(units * price),
        _ => None,
    };
    record.id = Uuid::new_v4().to_string();

    Some(record)
}
