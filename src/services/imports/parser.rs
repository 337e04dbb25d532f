//! 成绩表格解析
//!
//! CSV 与 XLSX 先读成字符串表格，再统一按列名映射、逐行校验。

use calamine::{Reader, Xlsx};
use std::collections::HashMap;
use std::io::Cursor;

use crate::models::ErrorCode;
use crate::models::imports::entities::{
    FULL_COLUMNS, GradeImportRow, MISSING_GIVEN_NAMES, MISSING_SURNAME, REQUIRED_COLUMNS,
};
use crate::models::imports::responses::ImportRowError;
use crate::utils::SpreadsheetKind;
use crate::utils::validate::validate_percentage;

/// 文件级解析错误，整个导入被拒绝
#[derive(Debug, Clone, PartialEq)]
pub enum ImportParseError {
    MissingColumns(Vec<String>),
    ParseFailed(String),
    EmptyFile,
    TooManyRows { rows: usize, max: usize },
}

impl ImportParseError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingColumns(_) => ErrorCode::ImportFileMissingColumn,
            Self::ParseFailed(_) | Self::EmptyFile => ErrorCode::ImportFileParseFailed,
            Self::TooManyRows { .. } => ErrorCode::ImportTooManyRows,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MissingColumns(cols) => format!(
                "Missing required columns: {}. Required: {}. Optional: nombre (or apellido_paterno, apellido_materno, nombres)",
                cols.join(", "),
                REQUIRED_COLUMNS.join(", ")
            ),
            Self::ParseFailed(msg) => msg.clone(),
            Self::EmptyFile => "The file contains no header row".to_string(),
            Self::TooManyRows { rows, max } => {
                format!("The file has {rows} data rows, at most {max} are allowed")
            }
        }
    }
}

/// 解析结果：合法行与逐行错误
#[derive(Debug, Default)]
pub struct ParsedSheet {
    /// 数据行总数（不含表头与空行）
    pub total: usize,
    pub rows: Vec<GradeImportRow>,
    pub errors: Vec<ImportRowError>,
}

impl ParsedSheet {
    /// 出错的行数（同一行多个字段出错只计一次）
    pub fn invalid_rows(&self) -> usize {
        let mut rows: Vec<usize> = self.errors.iter().map(|e| e.row).collect();
        rows.dedup();
        rows.len()
    }
}

/// 姓名列的来源
#[derive(Debug, Clone, Copy)]
enum NameColumns {
    Split {
        paternal: usize,
        maternal: usize,
        given: usize,
    },
    Single(usize),
    Missing,
}

struct ColumnMap {
    enrollment_id: usize,
    program: usize,
    semester: usize,
    subject: usize,
    score: usize,
    attendance: usize,
    period: usize,
    names: NameColumns,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Result<Self, ImportParseError> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !index.contains_key(*col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ImportParseError::MissingColumns(missing));
        }

        let names = match (
            index.get("apellido_paterno"),
            index.get("apellido_materno"),
            index.get("nombres"),
            index.get("nombre"),
        ) {
            (Some(&paternal), Some(&maternal), Some(&given), _) => NameColumns::Split {
                paternal,
                maternal,
                given,
            },
            (_, _, _, Some(&single)) => NameColumns::Single(single),
            _ => NameColumns::Missing,
        };

        Ok(Self {
            enrollment_id: index["matricula"],
            program: index["carrera"],
            semester: index["semestre"],
            subject: index["materia"],
            score: index["nota"],
            attendance: index["asistencia"],
            period: index["periodo"],
            names,
        })
    }
}

/// 规范化表头：去除 BOM 与首尾空白，转小写
fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// 解析整数学期，接受 "3" 或表格中的 "3.0"
fn parse_semester(value: &str) -> Option<i32> {
    if let Ok(n) = value.parse::<i32>() {
        return Some(n);
    }
    let n = value.parse::<f64>().ok()?;
    if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
        Some(n as i32)
    } else {
        None
    }
}

fn parse_percentage(field: &str, value: &str) -> Result<f64, String> {
    let n = value
        .parse::<f64>()
        .map_err(|_| format!("{field} must be a number"))?;
    validate_percentage(field, n)?;
    Ok(n)
}

/// 按列映射与校验一行，返回合法数据或该行的全部错误
fn parse_row(
    columns: &ColumnMap,
    row_num: usize,
    cells: &[String],
) -> Result<GradeImportRow, Vec<ImportRowError>> {
    let cell = |idx: usize| cells.get(idx).map(|c| c.trim()).unwrap_or("");
    let mut errors = Vec::new();
    let mut error = |field: &str, message: String| {
        errors.push(ImportRowError {
            row: row_num,
            field: field.to_string(),
            message,
        })
    };

    for (field, idx) in [
        ("matricula", columns.enrollment_id),
        ("carrera", columns.program),
        ("materia", columns.subject),
        ("periodo", columns.period),
    ] {
        if cell(idx).is_empty() {
            error(field, format!("{field} is required"));
        }
    }

    let semester = match cell(columns.semester) {
        "" => {
            error("semestre", "semestre is required".to_string());
            None
        }
        raw => match parse_semester(raw) {
            Some(n) if n >= 1 => Some(n),
            _ => {
                error("semestre", format!("semestre must be an integer >= 1, got '{raw}'"));
                None
            }
        },
    };

    let mut percentage = |field: &str, idx: usize| match cell(idx) {
        "" => {
            error(field, format!("{field} is required"));
            None
        }
        raw => parse_percentage(field, raw)
            .map_err(|msg| error(field, msg))
            .ok(),
    };
    let score = percentage("nota", columns.score);
    let attendance = percentage("asistencia", columns.attendance);

    let (Some(semester), Some(score), Some(attendance)) = (semester, score, attendance) else {
        return Err(errors);
    };
    if !errors.is_empty() {
        return Err(errors);
    }

    let or_placeholder = |value: &str, placeholder: &str| {
        if value.is_empty() {
            placeholder.to_string()
        } else {
            value.to_string()
        }
    };
    let (paternal_surname, maternal_surname, given_names) = match columns.names {
        NameColumns::Split {
            paternal,
            maternal,
            given,
        } => (
            or_placeholder(cell(paternal), MISSING_SURNAME),
            or_placeholder(cell(maternal), MISSING_SURNAME),
            or_placeholder(cell(given), MISSING_GIVEN_NAMES),
        ),
        NameColumns::Single(idx) => (
            MISSING_SURNAME.to_string(),
            MISSING_SURNAME.to_string(),
            or_placeholder(cell(idx), MISSING_GIVEN_NAMES),
        ),
        NameColumns::Missing => (
            MISSING_SURNAME.to_string(),
            MISSING_SURNAME.to_string(),
            MISSING_GIVEN_NAMES.to_string(),
        ),
    };

    Ok(GradeImportRow {
        row_num,
        enrollment_id: cell(columns.enrollment_id).to_string(),
        paternal_surname,
        maternal_surname,
        given_names,
        program: cell(columns.program).to_string(),
        semester,
        subject: cell(columns.subject).to_string(),
        score,
        attendance,
        period: cell(columns.period).to_string(),
    })
}

/// 解析字符串表格：第一行为表头
fn parse_table(table: Vec<Vec<String>>, max_rows: usize) -> Result<ParsedSheet, ImportParseError> {
    let mut lines = table.into_iter();
    let headers: Vec<String> = lines
        .next()
        .ok_or(ImportParseError::EmptyFile)?
        .iter()
        .map(|h| normalize_header(h))
        .collect();
    let columns = ColumnMap::from_headers(&headers)?;

    // 行号从表头所在的第 1 行算起；全空的行跳过
    let data: Vec<(usize, Vec<String>)> = lines
        .enumerate()
        .map(|(i, cells)| (i + 2, cells))
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
        .collect();

    if data.len() > max_rows {
        return Err(ImportParseError::TooManyRows {
            rows: data.len(),
            max: max_rows,
        });
    }

    let mut sheet = ParsedSheet {
        total: data.len(),
        ..Default::default()
    };
    for (row_num, cells) in data {
        match parse_row(&columns, row_num, &cells) {
            Ok(row) => sheet.rows.push(row),
            Err(mut errors) => sheet.errors.append(&mut errors),
        }
    }
    Ok(sheet)
}

fn read_csv(data: &[u8]) -> Result<Vec<Vec<String>>, ImportParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(data));

    rdr.records()
        .enumerate()
        .map(|(i, record)| {
            record.map(|r| r.iter().map(str::to_string).collect()).map_err(|e| {
                ImportParseError::ParseFailed(format!("Row {} is malformed: {e}", i + 1))
            })
        })
        .collect()
}

fn read_xlsx(data: &[u8]) -> Result<Vec<Vec<String>>, ImportParseError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))
        .map_err(|e| ImportParseError::ParseFailed(format!("Failed to open XLSX: {e}")))?;

    // 只读取第一个工作表
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportParseError::ParseFailed("The workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportParseError::ParseFailed(format!("Failed to read sheet: {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

/// 解析上传的表格
pub fn parse_spreadsheet(
    data: &[u8],
    kind: SpreadsheetKind,
    max_rows: usize,
) -> Result<ParsedSheet, ImportParseError> {
    let table = match kind {
        SpreadsheetKind::Csv => read_csv(data)?,
        SpreadsheetKind::Xlsx => read_xlsx(data)?,
    };
    parse_table(table, max_rows)
}

/// 模板示例行，列顺序与 FULL_COLUMNS 一致
pub const TEMPLATE_EXAMPLE: [&str; FULL_COLUMNS.len()] = [
    "2024001",
    "",
    "García",
    "López",
    "Ana María",
    "Ingeniería en Sistemas",
    "1",
    "Cálculo I",
    "85",
    "92.5",
    "2024-1",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(text: &str) -> ParsedSheet {
        parse_spreadsheet(text.as_bytes(), SpreadsheetKind::Csv, 100).unwrap()
    }

    #[test]
    fn test_split_name_columns() {
        let sheet = csv(
            "Matricula, Apellido_Paterno ,apellido_materno,nombres,carrera,semestre,materia,nota,asistencia,periodo\n\
             A001,García,,Ana,Derecho,2,Civil I,85.5,90,2024-1\n",
        );
        assert_eq!(sheet.total, 1);
        assert!(sheet.errors.is_empty());
        let row = &sheet.rows[0];
        assert_eq!(row.row_num, 2);
        assert_eq!(row.paternal_surname, "García");
        assert_eq!(row.maternal_surname, MISSING_SURNAME);
        assert_eq!(row.given_names, "Ana");
        assert_eq!(row.semester, 2);
        assert_eq!(row.score, 85.5);
    }

    #[test]
    fn test_single_name_column() {
        let sheet = csv(
            "matricula,nombre,carrera,semestre,materia,nota,asistencia,periodo\n\
             A002,Luis Pérez,Derecho,1,Civil I,70,80,2024-1\n\
             A003,,Derecho,1,Civil I,70,80,2024-1\n",
        );
        assert_eq!(sheet.rows[0].given_names, "Luis Pérez");
        assert_eq!(sheet.rows[0].paternal_surname, MISSING_SURNAME);
        assert_eq!(sheet.rows[1].given_names, MISSING_GIVEN_NAMES);
    }

    #[test]
    fn test_no_name_columns_use_placeholders() {
        let sheet = csv(
            "matricula,carrera,semestre,materia,nota,asistencia,periodo\n\
             A004,Derecho,1,Civil I,70,80,2024-1\n",
        );
        let row = &sheet.rows[0];
        assert_eq!(row.paternal_surname, MISSING_SURNAME);
        assert_eq!(row.maternal_surname, MISSING_SURNAME);
        assert_eq!(row.given_names, MISSING_GIVEN_NAMES);
    }

    #[test]
    fn test_missing_columns_rejected() {
        let err = parse_spreadsheet(
            b"matricula,carrera,materia,nota\nA001,Derecho,Civil,80\n",
            SpreadsheetKind::Csv,
            100,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ImportParseError::MissingColumns(vec![
                "semestre".to_string(),
                "asistencia".to_string(),
                "periodo".to_string()
            ])
        );
        assert_eq!(err.error_code(), ErrorCode::ImportFileMissingColumn);
        assert!(err.message().contains("matricula, carrera, semestre"));
    }

    #[test]
    fn test_invalid_rows_reported_and_skipped() {
        let sheet = csv(
            "matricula,carrera,semestre,materia,nota,asistencia,periodo\n\
             A001,Derecho,1,Civil I,101,80,2024-1\n\
             A002,Derecho,0,Civil I,abc,80,2024-1\n\
             ,Derecho,1,Civil I,90,80,\n\
             A004,Derecho,1,Civil I,90,NaN,2024-1\n\
             A005,Derecho,3.0,Civil I,0,100,2024-1\n",
        );
        assert_eq!(sheet.total, 5);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].enrollment_id, "A005");
        assert_eq!(sheet.rows[0].semester, 3);
        assert_eq!(sheet.invalid_rows(), 4);

        let fields: Vec<(usize, &str)> = sheet
            .errors
            .iter()
            .map(|e| (e.row, e.field.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                (2, "nota"),
                (3, "semestre"),
                (3, "nota"),
                (4, "matricula"),
                (4, "periodo"),
                (5, "asistencia"),
            ]
        );
    }

    #[test]
    fn test_bom_and_blank_lines() {
        let sheet = csv(
            "\u{feff}matricula,carrera,semestre,materia,nota,asistencia,periodo\n\
             A001,Derecho,1,Civil I,80,80,2024-1\n\
             ,,,,,,\n",
        );
        assert_eq!(sheet.total, 1);
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn test_row_limit() {
        let mut text = String::from("matricula,carrera,semestre,materia,nota,asistencia,periodo\n");
        for i in 0..3 {
            text.push_str(&format!("A{i},Derecho,1,Civil I,80,80,2024-1\n"));
        }
        let err = parse_spreadsheet(text.as_bytes(), SpreadsheetKind::Csv, 2).unwrap_err();
        assert_eq!(err, ImportParseError::TooManyRows { rows: 3, max: 2 });
    }

    #[test]
    fn test_empty_file() {
        let err = parse_spreadsheet(b"", SpreadsheetKind::Csv, 10).unwrap_err();
        assert_eq!(err, ImportParseError::EmptyFile);
    }

    #[test]
    fn test_xlsx_roundtrip() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (col, header) in FULL_COLUMNS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        worksheet.write_string(1, 0, "2024001").unwrap();
        worksheet.write_string(1, 2, "García").unwrap();
        worksheet.write_string(1, 3, "López").unwrap();
        worksheet.write_string(1, 4, "Ana").unwrap();
        worksheet.write_string(1, 5, "Derecho").unwrap();
        worksheet.write_number(1, 6, 2.0).unwrap();
        worksheet.write_string(1, 7, "Civil I").unwrap();
        worksheet.write_number(1, 8, 88.0).unwrap();
        worksheet.write_number(1, 9, 95.5).unwrap();
        worksheet.write_string(1, 10, "2024-1").unwrap();
        let buffer = workbook.save_to_buffer().unwrap();

        let sheet = parse_spreadsheet(&buffer, SpreadsheetKind::Xlsx, 100).unwrap();
        assert!(sheet.errors.is_empty(), "{:?}", sheet.errors);
        let row = &sheet.rows[0];
        assert_eq!(row.enrollment_id, "2024001");
        assert_eq!(row.semester, 2);
        assert_eq!(row.score, 88.0);
        assert_eq!(row.attendance, 95.5);
        assert_eq!(row.maternal_surname, "López");
    }
}
