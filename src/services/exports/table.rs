//! 表格文件生成（CSV / XLSX），导出与导入模板共用

use actix_web::HttpResponse;
use rust_xlsxwriter::{Format, Workbook};

use crate::errors::{EduStatsError, Result};
use crate::models::imports::requests::FileFormat;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 单元格：数字在 XLSX 中写为数值
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn to_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(value as f64)
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// CSV 以 UTF-8 BOM 开头，Excel 打开时不会乱码
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(UTF8_BOM.to_vec());
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(Cell::to_text))?;
        }
        wtr.into_inner()
            .map_err(|e| EduStatsError::spreadsheet(format!("CSV generation failed: {e}")))
    }

    pub fn to_xlsx(&self, sheet_name: &str) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name)?;

        let header_format = Format::new().set_bold();
        for (col, header) in self.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (row_idx, row) in self.rows.iter().enumerate() {
            let row_num = (row_idx + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(s) => worksheet.write_string(row_num, col as u16, s)?,
                    Cell::Number(n) => worksheet.write_number(row_num, col as u16, *n)?,
                };
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    /// 生成下载响应，文件名不含扩展名
    pub fn into_response(self, format: FileFormat, file_stem: &str) -> Result<HttpResponse> {
        let (body, content_type, extension) = match format {
            FileFormat::Csv => (self.to_csv()?, "text/csv; charset=utf-8", "csv"),
            FileFormat::Xlsx => (
                self.to_xlsx(file_stem)?,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "xlsx",
            ),
        };

        Ok(HttpResponse::Ok()
            .content_type(content_type)
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{file_stem}.{extension}\""),
            ))
            .body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(&["matricula", "nota"]);
        table.push(vec!["A001".into(), 85.5.into()]);
        table.push(vec!["A002, bis".into(), 70.0.into()]);
        table
    }

    #[test]
    fn test_csv_has_bom_and_quotes() {
        let bytes = sample().to_csv().unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "matricula,nota\nA001,85.5\n\"A002, bis\",70\n");
    }

    #[test]
    fn test_xlsx_is_zip() {
        let bytes = sample().to_xlsx("notas").unwrap();
        assert!(bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]));
    }
}
