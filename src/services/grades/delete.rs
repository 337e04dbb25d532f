use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{GradeService, internal_error, load_grade};
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};

pub async fn delete_grade(
    service: &GradeService,
    grade_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let (existing, student) = match load_grade(&storage, &scope, grade_id).await {
        Ok(loaded) => loaded,
        Err(response) => return Ok(response),
    };

    match storage.delete_grade(grade_id).await {
        Ok(true) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Delete,
                    AuditEntity::Grade,
                    Some(grade_id),
                    format!("Deleted a grade of student {}", student.enrollment_id),
                )
                .old(&existing),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Grade deleted")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::GradeNotFound,
            "Grade not found",
        ))),
        Err(e) => Ok(internal_error("Failed to delete grade", e)),
    }
}
