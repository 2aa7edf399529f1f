#![allow(dead_code)]

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

/// 测试用单元格
#[derive(Debug, Clone, Copy)]
pub enum Cell {
    Text(&'static str),
    Num(f64),
    /// 按 yyyy-mm-dd 格式写入的日期单元格
    Date(u16, u8, u8),
    Blank,
}

/// 测试用工作表：名称、表头、数据行
pub struct FixtureSheet {
    pub name: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl FixtureSheet {
    pub fn new(name: &'static str, headers: &[&'static str], rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name,
            headers: headers.to_vec(),
            rows,
        }
    }
}

/// 在内存中生成 xlsx
pub fn build_workbook(sheets: &[FixtureSheet]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name).expect("valid sheet name");

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, *header)
                .expect("write header");
        }

        for (row_idx, row) in sheet.rows.iter().enumerate() {
            let row_num = (row_idx + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(s) => {
                        worksheet
                            .write_string(row_num, col as u16, *s)
                            .expect("write text");
                    }
                    Cell::Num(n) => {
                        worksheet
                            .write_number(row_num, col as u16, *n)
                            .expect("write number");
                    }
                    Cell::Date(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(*y, *m, *d).expect("valid date");
                        worksheet
                            .write_datetime_with_format(row_num, col as u16, &date, &date_format)
                            .expect("write date");
                    }
                    Cell::Blank => {}
                }
            }
        }
    }

    workbook.save_to_buffer().expect("save workbook")
}
