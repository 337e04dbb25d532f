use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProgramService;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};
use crate::services::users::invalidate_cached_users;

pub async fn delete_program(
    service: &ProgramService,
    program_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let existing = match storage.get_program_by_id(program_id).await {
        Ok(Some(program)) => program,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ProgramNotFound,
                "Program not found",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to get program: {e}"),
                )),
            );
        }
    };

    // 专业科目变为公共科目，教师解除绑定
    match storage.delete_program(program_id).await {
        Ok(true) => {
            invalidate_cached_users(request).await;
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Delete,
                    AuditEntity::Program,
                    Some(program_id),
                    format!("Deleted program {}", existing.name),
                )
                .old(&existing),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Program deleted")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ProgramNotFound,
            "Program not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Program deletion failed: {e}"),
            )),
        ),
    }
}
