//! 学生与成绩导出
//!
//! 成绩导出使用导入模板的列结构，导出的文件可以原样重新导入。

pub mod table;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::error;

use crate::middlewares::RequireJWT;
use crate::models::grades::entities::GradeRecord;
use crate::models::grades::requests::GradeRecordFilter;
use crate::models::imports::entities::FULL_COLUMNS;
use crate::models::imports::requests::{FileFormat, GradeExportParams, StudentExportParams};
use crate::models::students::entities::Student;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::students::resolve_student_filter;
use crate::storage::Storage;
use table::{Cell, Table};

/// 学生导出列
pub const STUDENT_COLUMNS: [&str; 10] = [
    "matricula",
    "apellido_paterno",
    "apellido_materno",
    "nombres",
    "nombre_completo",
    "genero",
    "modalidad",
    "carrera",
    "semestre",
    "estado",
];

pub struct ExportService {
    storage: Option<Arc<dyn Storage>>,
}

impl ExportService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    /// 导出学生
    pub async fn export_students(
        &self,
        params: StudentExportParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);
        let scope = RequireJWT::extract_scope(request);

        let filter = match resolve_student_filter(
            &storage,
            &scope,
            params.program_id,
            params.subject_id,
            None,
            None,
        )
        .await
        {
            Ok(filter) => filter,
            Err(response) => return Ok(response),
        };

        let students = match storage.list_students(&scope, filter).await {
            Ok(students) => students,
            Err(e) => return Ok(export_failed(e)),
        };
        if students.is_empty() {
            return Ok(no_data("No students to export"));
        }

        render(students_table(&students), params.format, "students")
    }

    /// 导出成绩
    pub async fn export_grades(
        &self,
        params: GradeExportParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);
        let scope = RequireJWT::extract_scope(request);

        // 复用学生筛选的范围检查
        let student_filter = match resolve_student_filter(
            &storage,
            &scope,
            params.program_id,
            params.subject_id,
            None,
            None,
        )
        .await
        {
            Ok(filter) => filter,
            Err(response) => return Ok(response),
        };

        let filter = GradeRecordFilter {
            program_id: params.program_id,
            subject_id: params.subject_id,
            period: params.period,
            program: student_filter.program,
        };

        let records = match storage.list_grade_records(&scope, filter).await {
            Ok(records) => records,
            Err(e) => return Ok(export_failed(e)),
        };
        if records.is_empty() {
            return Ok(no_data("No grades to export"));
        }

        render(grades_table(&records), params.format, "grades")
    }
}

fn export_failed(e: impl std::fmt::Display) -> HttpResponse {
    error!("Export failed: {}", e);
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::ExportFailed,
        format!("Export failed: {e}"),
    ))
}

fn no_data(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(ErrorCode::ExportNoData, message))
}

fn render(table: Table, format: FileFormat, file_stem: &str) -> ActixResult<HttpResponse> {
    match table.into_response(format, file_stem) {
        Ok(response) => Ok(response),
        Err(e) => Ok(export_failed(e)),
    }
}

pub fn students_table(students: &[Student]) -> Table {
    let mut table = Table::new(&STUDENT_COLUMNS);
    for student in students {
        table.push(vec![
            student.enrollment_id.as_str().into(),
            student.paternal_surname.as_str().into(),
            student.maternal_surname.as_str().into(),
            student.given_names.as_str().into(),
            student.full_name().into(),
            student.gender.clone().unwrap_or_default().into(),
            student.modality.clone().unwrap_or_default().into(),
            student.program.as_str().into(),
            student.semester.into(),
            student.status.to_string().into(),
        ]);
    }
    table
}

pub fn grades_table(records: &[GradeRecord]) -> Table {
    let mut table = Table::new(&FULL_COLUMNS);
    for record in records {
        table.push(vec![
            record.enrollment_id.as_str().into(),
            record.full_name().into(),
            record.paternal_surname.as_str().into(),
            record.maternal_surname.as_str().into(),
            record.given_names.as_str().into(),
            record.program.as_str().into(),
            record.semester.into(),
            record.subject.as_str().into(),
            Cell::Number(record.score),
            Cell::Number(record.attendance),
            record.period.as_str().into(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::imports::parser::parse_spreadsheet;
    use crate::utils::SpreadsheetKind;

    fn record(enrollment_id: &str, subject: &str, score: f64) -> GradeRecord {
        GradeRecord {
            enrollment_id: enrollment_id.to_string(),
            paternal_surname: "Hernández".to_string(),
            maternal_surname: "Ruiz".to_string(),
            given_names: "José, Luis".to_string(),
            program: "Ingeniería en Sistemas".to_string(),
            semester: 3,
            subject: subject.to_string(),
            score,
            attendance: 87.5,
            period: "2024-2".to_string(),
        }
    }

    #[test]
    fn test_grade_export_reimports_unchanged() {
        let records = vec![record("A001", "Cálculo I", 69.5), record("A002", "Física", 100.0)];

        for kind in [SpreadsheetKind::Csv, SpreadsheetKind::Xlsx] {
            let table = grades_table(&records);
            let bytes = match kind {
                SpreadsheetKind::Csv => table.to_csv().unwrap(),
                SpreadsheetKind::Xlsx => table.to_xlsx("grades").unwrap(),
            };
            let sheet = parse_spreadsheet(&bytes, kind, 100).unwrap();
            assert!(sheet.errors.is_empty(), "{:?}", sheet.errors);

            let reimported: Vec<GradeRecord> = sheet
                .rows
                .into_iter()
                .map(|row| GradeRecord {
                    enrollment_id: row.enrollment_id,
                    paternal_surname: row.paternal_surname,
                    maternal_surname: row.maternal_surname,
                    given_names: row.given_names,
                    program: row.program,
                    semester: row.semester,
                    subject: row.subject,
                    score: row.score,
                    attendance: row.attendance,
                    period: row.period,
                })
                .collect();
            assert_eq!(reimported, records);
        }
    }

    #[test]
    fn test_student_columns() {
        let now = chrono::Utc::now();
        let student = Student {
            id: 1,
            enrollment_id: "A001".to_string(),
            paternal_surname: "García".to_string(),
            maternal_surname: "López".to_string(),
            given_names: "Ana".to_string(),
            gender: None,
            modality: Some("Escolarizada".to_string()),
            program: "Derecho".to_string(),
            semester: 2,
            status: crate::models::students::entities::StudentStatus::Dropout,
            created_at: now,
            updated_at: now,
        };
        let table = students_table(&[student]);
        assert_eq!(table.headers.len(), STUDENT_COLUMNS.len());
        assert_eq!(table.rows[0][4], Cell::Text("García López Ana".to_string()));
        assert_eq!(table.rows[0][5], Cell::Text(String::new()));
        assert_eq!(table.rows[0][8], Cell::Number(2.0));
        assert_eq!(table.rows[0][9], Cell::Text("dropout".to_string()));
    }
}
