use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{SubjectService, load_subject, permission_denied};
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};

pub async fn delete_subject(
    service: &SubjectService,
    subject_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let existing = match load_subject(&storage, subject_id).await {
        Ok(subject) => subject,
        Err(response) => return Ok(response),
    };
    if !scope.can_modify_subject(existing.program_id) {
        return Ok(permission_denied());
    }

    // 科目的成绩随之级联删除
    match storage.delete_subject(subject_id).await {
        Ok(true) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Delete,
                    AuditEntity::Subject,
                    Some(subject_id),
                    format!("Deleted subject {}", existing.name),
                )
                .old(&existing),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Subject deleted")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Subject deletion failed: {e}"),
            )),
        ),
    }
}
