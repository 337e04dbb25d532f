use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{StudentService, load_student};
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};

pub async fn delete_student(
    service: &StudentService,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let existing = match load_student(&storage, &scope, student_id).await {
        Ok(student) => student,
        Err(response) => return Ok(response),
    };

    match storage.delete_student(student_id).await {
        Ok(true) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Delete,
                    AuditEntity::Student,
                    Some(student_id),
                    format!("Deleted student {}", existing.enrollment_id),
                )
                .old(&existing),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Student deleted")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            "Student not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Student deletion failed: {e}"),
            )),
        ),
    }
}
