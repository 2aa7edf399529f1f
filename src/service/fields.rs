//! 表头别名匹配与取值转换

use chrono::{Datelike, Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

use super::workbook::{CellValue, RawRow};

lazy_static! {
    static ref MONTH_PATTERN: Regex = Regex::new(r"(20[0-9]{2})[.\-/年]?([0-9]{1,2})").unwrap();
}

/// 无法识别月份 / 区域 / 产品时的占位标记
pub const UNLABELED: &str = "未标注";

/// 可映射的标准字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Project,
    City,
    District,
    ProductType,
    AvgPrice,
    UnitsSold,
    Area,
}

/// 标准字段 -> 表头别名，按优先级排列
pub const HEADER_ALIASES: &[(Field, &[&str])] = &[
    (Field::Project, &["项目", "楼盘", "案名", "小区", "项目名称", "project", "estate"]),
    (Field::City, &["城市", "city"]),
    (Field::District, &["区域", "区县", "板块", "商圈", "district", "区域名称"]),
    (Field::ProductType, &["产品", "业态", "类型", "户型", "产品类型", "product", "type"]),
    (
        Field::AvgPrice,
        &["价格", "均价", "平均价格", "单价", "售价", "均价(元/㎡)", "price", "avg price"],
    ),
    (Field::UnitsSold, &["套数", "销量", "成交套数", "去化套数", "数量", "units", "套"]),
    (Field::Area, &["面积", "建面", "成交面积", "体量", "面积(㎡)", "area", "平方米"]),
];

/// 行内月份列别名
pub const MONTH_ALIASES: &[&str] = &["月份", "月度", "日期", "month"];

// 按日期序列号处理的数字区间 (1982-02-19 ~ 2099-12-31)，其余数字按文本识别
const MIN_DATE_SERIAL: f64 = 30000.0;
const MAX_DATE_SERIAL: f64 = 73416.0;

/// 取第一个表头命中别名的列 (不区分大小写的子串匹配)。
/// 命中列为空时返回 `None`，不再继续查找后面的列。
pub fn pick_value<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a CellValue> {
    row.iter()
        .find(|(header, _)| {
            let header = header.to_lowercase();
            aliases.iter().any(|alias| header.contains(&alias.to_lowercase()))
        })
        .and_then(|(_, value)| value.as_ref())
}

/// 文本字段：去空白，空串视为无值
pub fn to_text(value: &CellValue) -> Option<String> {
    let text = value.to_text();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// 数值字段：数字原样返回；文本去掉非数字字符后解析，含「万」则乘 10000
pub fn to_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::Date { serial, .. } => serial.is_finite().then_some(*serial),
        CellValue::Bool(_) => None,
        CellValue::Text(text) => parse_numeric_text(text),
    }
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let num = leading_decimal(&cleaned)?;

    if text.contains('万') {
        Some(num * 10000.0)
    } else {
        Some(num)
    }
}

/// 解析最长的合法十进制前缀 `-?digits[.digits]`，如 "14500-15000" -> 14500
fn leading_decimal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        } else if digits > 0 {
            end += 1;
        }
    }

    if digits == 0 {
        return None;
    }

    s[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// 从文本识别月份，如 "经开区市调2025.12.2" -> "2025-12"
pub fn month_from_text(text: &str) -> Option<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let caps = MONTH_PATTERN.captures(&compact)?;
    let month: u32 = caps[2].parse().ok()?;
    Some(format!("{}-{:02}", &caps[1], month))
}

/// 从月份列单元格识别月份，支持 Excel 日期序列号
pub fn month_from_cell(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Date { date: Some(date), .. } => Some(format_month(*date)),
        CellValue::Date { serial, date: None } => month_from_serial(*serial),
        CellValue::Number(n) if *n > MIN_DATE_SERIAL && *n < MAX_DATE_SERIAL => {
            month_from_serial(*n)
        }
        other => month_from_text(&other.to_text()),
    }
}

/// 1900 日期系统：序列号 1 = 1900-01-01，含 Excel 的 1900-02-29 误差
fn month_from_serial(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let days = serial.floor() as i64;
    // 序列号 60 之前没有虚构的 2 月 29 日
    let days = if days < 61 { days + 1 } else { days };
    let date = epoch.checked_add_signed(Duration::days(days))?;
    Some(format_month(date))
}

fn format_month(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

/// 工作表无月份信息时的占位月份，按工作表位置编号保证互不相同
pub fn placeholder_month(sheet_index: usize) -> String {
    format!("{}-{}", UNLABELED, sheet_index + 1)
}
