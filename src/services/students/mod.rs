pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::students::entities::{Student, StudentStatus};
use crate::models::students::requests::{
    CreateStudentRequest, StudentFilter, StudentListParams, UpdateStudentRequest,
};
use crate::models::{AccessScope, ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct StudentService {
    storage: Option<Arc<dyn Storage>>,
}

impl StudentService {
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

    pub async fn list_students(
        &self,
        params: StudentListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_students(self, params, request).await
    }

    pub async fn create_student(
        &self,
        req: CreateStudentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_student(self, req, request).await
    }

    pub async fn get_student(
        &self,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        get::get_student(self, student_id, request).await
    }

    pub async fn update_student(
        &self,
        student_id: i64,
        update: UpdateStudentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_student(self, student_id, update, request).await
    }

    pub async fn delete_student(
        &self,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_student(self, student_id, request).await
    }
}

fn permission_denied() -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(
        ErrorCode::StudentPermissionDenied,
        "Student is outside of your program",
    ))
}

/// 加载学生并检查可见范围：不存在 404，越权 403
pub(crate) async fn load_student(
    storage: &Arc<dyn Storage>,
    scope: &AccessScope,
    student_id: i64,
) -> Result<Student, HttpResponse> {
    match storage.get_student_by_id(student_id).await {
        Ok(Some(student)) if scope.allows_program_name(&student.program) => Ok(student),
        Ok(Some(_)) => Err(permission_denied()),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            "Student not found",
        ))),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to get student: {e}"),
            )),
        ),
    }
}

/// 按 ID 解析专业名称，专业不存在时返回 400
pub(crate) async fn resolve_program_name(
    storage: &Arc<dyn Storage>,
    program_id: i64,
) -> Result<String, HttpResponse> {
    match storage.get_program_by_id(program_id).await {
        Ok(Some(program)) => Ok(program.name),
        Ok(None) => Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ProgramNotFound,
            "Program not found",
        ))),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to get program: {e}"),
            )),
        ),
    }
}

/// 构建学生筛选条件
///
/// 教师按其他专业或其他专业的科目筛选时返回 403。列表与导出共用。
pub(crate) async fn resolve_student_filter(
    storage: &Arc<dyn Storage>,
    scope: &AccessScope,
    program_id: Option<i64>,
    subject_id: Option<i64>,
    status: Option<StudentStatus>,
    search: Option<String>,
) -> Result<StudentFilter, HttpResponse> {
    let program = match program_id {
        Some(id) => {
            if !scope.is_all() && scope.program_id() != Some(id) {
                return Err(permission_denied());
            }
            Some(resolve_program_name(storage, id).await?)
        }
        None => None,
    };

    if let Some(subject_id) = subject_id {
        match storage.get_subject_by_id(subject_id).await {
            Ok(Some(subject)) if scope.allows_subject_program(subject.program_id) => {}
            Ok(Some(_)) => {
                return Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                    ErrorCode::SubjectPermissionDenied,
                    "Subject belongs to another program",
                )));
            }
            Ok(None) => {
                return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::SubjectNotFound,
                    "Subject not found",
                )));
            }
            Err(e) => {
                return Err(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        format!("Failed to get subject: {e}"),
                    )),
                );
            }
        }
    }

    Ok(StudentFilter {
        program,
        subject_id,
        status,
        search: search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

/// 可选文本字段：去除空白，空串视为未填写
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn invalid(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::StudentInvalid, msg))
}

fn validate_semester(semester: i32) -> Result<(), HttpResponse> {
    if semester < 1 {
        return Err(invalid("semester must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some(" M ".to_string())), Some("M".to_string()));
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_validate_semester() {
        assert!(validate_semester(1).is_ok());
        assert!(validate_semester(0).is_err());
        assert!(validate_semester(-2).is_err());
    }
}
