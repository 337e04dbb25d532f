//! 成绩录入
//!
//! 成绩归属于学生，科目必须是学生所在专业的科目或公共科目。

pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::grades::entities::Grade;
use crate::models::grades::requests::{CreateGradeRequest, UpdateGradeRequest};
use crate::models::students::entities::Student;
use crate::models::subjects::entities::Subject;
use crate::models::{AccessScope, ApiResponse, ErrorCode};
use crate::services::students::load_student;
use crate::storage::Storage;

pub struct GradeService {
    storage: Option<Arc<dyn Storage>>,
}

impl GradeService {
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

    pub async fn list_student_grades(
        &self,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_student_grades(self, student_id, request).await
    }

    pub async fn create_grade(
        &self,
        student_id: i64,
        req: CreateGradeRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_grade(self, student_id, req, request).await
    }

    pub async fn update_grade(
        &self,
        grade_id: i64,
        update: UpdateGradeRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_grade(self, grade_id, update, request).await
    }

    pub async fn delete_grade(
        &self,
        grade_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_grade(self, grade_id, request).await
    }
}

fn invalid(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::GradeInvalid, msg))
}

fn already_exists() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::GradeAlreadyExists,
        "Grade already recorded for this subject and period",
    ))
}

fn internal_error(context: &str, e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        format!("{context}: {e}"),
    ))
}

/// 学生所在专业的 ID；专业名称没有对应的专业记录时为 None
pub(crate) async fn student_program_id(
    storage: &Arc<dyn Storage>,
    student: &Student,
) -> Result<Option<i64>, HttpResponse> {
    storage
        .get_program_by_name(&student.program)
        .await
        .map(|program| program.map(|p| p.id))
        .map_err(|e| internal_error("Failed to get program", e))
}

/// 科目可用于该学生：本专业科目或公共科目
fn subject_allowed(subject: &Subject, program_id: Option<i64>) -> bool {
    subject.program_id.is_none() || subject.program_id == program_id
}

async fn load_allowed_subject(
    storage: &Arc<dyn Storage>,
    student: &Student,
    subject_id: i64,
) -> Result<Subject, HttpResponse> {
    let subject = match storage.get_subject_by_id(subject_id).await {
        Ok(Some(subject)) => subject,
        Ok(None) => {
            return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::SubjectNotFound,
                "Subject not found",
            )));
        }
        Err(e) => return Err(internal_error("Failed to get subject", e)),
    };

    let program_id = student_program_id(storage, student).await?;
    if !subject_allowed(&subject, program_id) {
        return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::GradeSubjectNotAllowed,
            "Subject is not available for the student's program",
        )));
    }
    Ok(subject)
}

/// 已存在同一 (学生, 科目, 学期) 的其他成绩时返回 409
async fn ensure_unique(
    storage: &Arc<dyn Storage>,
    student_id: i64,
    subject_id: i64,
    period: &str,
    exclude_id: Option<i64>,
) -> Result<(), HttpResponse> {
    match storage.find_grade(student_id, subject_id, period).await {
        Ok(Some(existing)) if Some(existing.id) != exclude_id => Err(already_exists()),
        Ok(_) => Ok(()),
        Err(e) => Err(internal_error("Failed to check grade", e)),
    }
}

fn validate_scores(score: Option<f64>, attendance: Option<f64>) -> Result<(), String> {
    use crate::utils::validate::validate_percentage;

    if let Some(score) = score {
        validate_percentage("score", score)?;
    }
    if let Some(attendance) = attendance {
        validate_percentage("attendance", attendance)?;
    }
    Ok(())
}

/// 加载成绩及其学生，并检查学生的可见范围
async fn load_grade(
    storage: &Arc<dyn Storage>,
    scope: &AccessScope,
    grade_id: i64,
) -> Result<(Grade, Student), HttpResponse> {
    let grade = match storage.get_grade_by_id(grade_id).await {
        Ok(Some(grade)) => grade,
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::GradeNotFound,
                "Grade not found",
            )));
        }
        Err(e) => return Err(internal_error("Failed to get grade", e)),
    };

    let student = load_student(storage, scope, grade.student_id).await?;
    Ok((grade, student))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(program_id: Option<i64>) -> Subject {
        Subject {
            id: 1,
            name: "Cálculo".to_string(),
            semester: 1,
            program_id,
        }
    }

    #[test]
    fn test_subject_allowed() {
        assert!(subject_allowed(&subject(None), Some(2)));
        assert!(subject_allowed(&subject(None), None));
        assert!(subject_allowed(&subject(Some(2)), Some(2)));
        assert!(!subject_allowed(&subject(Some(3)), Some(2)));
        assert!(!subject_allowed(&subject(Some(3)), None));
    }

    #[test]
    fn test_validate_scores() {
        assert!(validate_scores(Some(0.0), Some(100.0)).is_ok());
        assert!(validate_scores(None, None).is_ok());
        assert!(validate_scores(Some(100.5), None).is_err());
        assert!(validate_scores(None, Some(f64::NAN)).is_err());
        assert!(validate_scores(Some(-1.0), Some(50.0)).is_err());
    }
}
