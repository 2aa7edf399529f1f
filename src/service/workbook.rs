use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::NaiveDate;

use crate::error::ParseError;

/// 单元格取值 (空单元格用 `None` 表示)
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    /// 日期单元格：原始序列号 + 按工作簿日期系统换算出的日期
    Date { serial: f64, date: Option<NaiveDate> },
}

impl CellValue {
    /// 转为文本 (数字按最短形式输出)
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date { serial, .. } => serial.to_string(),
        }
    }
}

/// 一行数据：按列顺序排列的 (表头, 值)
pub type RawRow = Vec<(String, Option<CellValue>)>;

/// 一个工作表的原始行
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub name: String,
    /// 在工作簿中的位置 (从 0 开始)
    pub index: usize,
    pub rows: Vec<RawRow>,
}

/// 从内存字节读取全部工作表，首行视为表头。
/// 无法识别为工作簿的 UTF-8 文本按 CSV 读取为单个工作表 `Sheet1`。
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<RawSheet>, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut workbook = match open_workbook_auto_from_rs(Cursor::new(bytes)) {
        Ok(workbook) => workbook,
        Err(e) => {
            return match csv_text(bytes) {
                Some(text) => {
                    tracing::debug!("未识别为工作簿 ({}), 按 CSV 读取", e);
                    read_csv(text)
                }
                None => Err(e.into()),
            };
        }
    };
    let names = workbook.sheet_names();

    let mut sheets = Vec::with_capacity(names.len());
    for (index, name) in names.into_iter().enumerate() {
        let range = match workbook.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!("跳过无法读取的工作表 {}: {}", name, e);
                continue;
            }
        };

        sheets.push(RawSheet {
            rows: range_to_rows(&range),
            name,
            index,
        });
    }

    Ok(sheets)
}

// 压缩包 (xlsx/ods) 与 OLE (xls) 文件头，带这些文件头的损坏文件不按文本处理
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

fn csv_text(bytes: &[u8]) -> Option<&str> {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        return None;
    }
    let text = std::str::from_utf8(bytes).ok()?;
    Some(text.strip_prefix('\u{feff}').unwrap_or(text))
}

fn read_csv(text: &str) -> Result<Vec<RawSheet>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut grid: Vec<Vec<Option<CellValue>>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(csv_cell).collect());
    }

    Ok(vec![RawSheet {
        name: "Sheet1".to_string(),
        index: 0,
        rows: grid_to_rows(grid),
    }])
}

/// CSV 字段：数字文本转为数字，其余保留原文
fn csv_cell(field: &str) -> Option<CellValue> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(CellValue::Number(n)),
        _ => Some(CellValue::Text(field.to_string())),
    }
}

fn range_to_rows(range: &Range<Data>) -> Vec<RawRow> {
    grid_to_rows(range.rows().map(|row| row.iter().map(convert_cell).collect::<Vec<_>>()))
}

fn grid_to_rows(grid: impl IntoIterator<Item = Vec<Option<CellValue>>>) -> Vec<RawRow> {
    let mut rows_iter = grid.into_iter();
    let Some(header_row) = rows_iter.next() else {
        return Vec::new();
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.as_ref().map(|v| v.to_text().trim().to_string()).unwrap_or_default())
        .collect();

    rows_iter
        .filter_map(|row| {
            // 整行空白 (包括无表头列) 不计入读取行数
            if row.iter().all(Option::is_none) {
                return None;
            }

            let values: RawRow = headers
                .iter()
                .enumerate()
                .filter(|(_, header)| !header.is_empty())
                .map(|(i, header)| (header.clone(), row.get(i).cloned().flatten()))
                .collect();
            Some(values)
        })
        .collect()
}

/// calamine 单元格 -> CellValue；空单元格与错误单元格均视为无值
pub fn convert_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::Date {
            serial: dt.as_f64(),
            date: dt.as_datetime().map(|d| d.date()),
        }),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_error_cells_have_no_value() {
        assert_eq!(convert_cell(&Data::Empty), None);
        assert_eq!(convert_cell(&Data::String("  ".to_string())), None);
        assert_eq!(
            convert_cell(&Data::Error(calamine::CellErrorType::NA)),
            None
        );
    }

    #[test]
    fn numeric_cells_keep_their_value() {
        assert_eq!(convert_cell(&Data::Int(3)), Some(CellValue::Number(3.0)));
        assert_eq!(
            convert_cell(&Data::Float(12500.5)),
            Some(CellValue::Number(12500.5))
        );
    }

    #[test]
    fn to_text_prints_whole_numbers_without_fraction() {
        assert_eq!(CellValue::Number(2.0).to_text(), "2");
        assert_eq!(CellValue::Number(1.5).to_text(), "1.5");
    }

    #[test]
    fn rejects_empty_and_garbage_bytes() {
        assert!(matches!(read_workbook(&[]), Err(ParseError::Empty)));
        assert!(matches!(
            read_workbook(&[0x00, 0x9f, 0x92, 0x96, 0xff, 0xfe, 0x01]),
            Err(ParseError::Unreadable(_))
        ));
        assert!(matches!(
            read_workbook(b"PK\x03\x04 truncated archive"),
            Err(ParseError::Unreadable(_))
        ));
    }

    #[test]
    fn csv_text_reads_as_single_sheet() {
        let text = "\u{feff}项目,均价,,套数\n A ,10000,x,2\n,,,\nB,2万\n";
        let sheets = read_workbook(text.as_bytes()).unwrap();

        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Sheet1");
        assert_eq!(sheets[0].index, 0);
        assert_eq!(sheets[0].rows.len(), 2);

        let first = &sheets[0].rows[0];
        assert_eq!(first.len(), 3);
        assert_eq!(first[0], ("项目".to_string(), Some(CellValue::Text(" A ".to_string()))));
        assert_eq!(first[1], ("均价".to_string(), Some(CellValue::Number(10000.0))));
        assert_eq!(first[2], ("套数".to_string(), Some(CellValue::Number(2.0))));

        // 短行缺少的列视为空
        let second = &sheets[0].rows[1];
        assert_eq!(second[1].1, Some(CellValue::Text("2万".to_string())));
        assert_eq!(second[2].1, None);
    }

    #[test]
    fn whitespace_only_rows_are_not_read() {
        let sheets = read_workbook("项目,均价\n  , \t\nA,1\n".as_bytes()).unwrap();
        assert_eq!(sheets[0].rows.len(), 1);
        assert_eq!(
            sheets[0].rows[0][0],
            ("项目".to_string(), Some(CellValue::Text("A".to_string())))
        );
    }

    #[test]
    fn csv_numeric_fields_ignore_surrounding_spaces() {
        assert_eq!(csv_cell(" 12.5 "), Some(CellValue::Number(12.5)));
        assert_eq!(csv_cell("NaN"), Some(CellValue::Text("NaN".to_string())));
        assert_eq!(csv_cell("   "), None);
    }
}
