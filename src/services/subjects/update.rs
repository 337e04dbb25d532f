use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{
    SubjectService, already_exists, ensure_unique, invalid, load_subject, permission_denied,
    validate_semester,
};
use crate::errors::EduStatsError;
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::subjects::requests::UpdateSubjectRequest;
use crate::models::subjects::responses::SubjectResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};
use crate::services::users::ensure_program_exists;
use crate::utils::validate::require_text;

pub async fn update_subject(
    service: &SubjectService,
    subject_id: i64,
    update: UpdateSubjectRequest,
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

    // 只有管理员能调整科目归属
    let changes_owner = update.make_shared
        || update
            .program_id
            .is_some_and(|id| Some(id) != existing.program_id);
    if !scope.is_all() && changes_owner {
        return Ok(permission_denied());
    }
    if let Some(program_id) = update.program_id
        && !update.make_shared
        && let Err(response) = ensure_program_exists(&storage, program_id).await
    {
        return Ok(response);
    }

    let name = match update.name.map(|v| require_text("name", &v)).transpose() {
        Ok(name) => name,
        Err(msg) => return Ok(invalid(msg)),
    };
    if let Some(semester) = update.semester
        && let Err(response) = validate_semester(semester)
    {
        return Ok(response);
    }

    let effective_name = name.clone().unwrap_or_else(|| existing.name.clone());
    let effective_program = if update.make_shared {
        None
    } else {
        update.program_id.or(existing.program_id)
    };
    if let Err(response) =
        ensure_unique(&storage, &effective_name, effective_program, Some(subject_id)).await
    {
        return Ok(response);
    }

    let update = UpdateSubjectRequest {
        name,
        semester: update.semester,
        program_id: update.program_id,
        make_shared: update.make_shared,
    };

    match storage.update_subject(subject_id, update).await {
        Ok(Some(subject)) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Update,
                    AuditEntity::Subject,
                    Some(subject.id),
                    format!("Updated subject {}", subject.name),
                )
                .old(&existing)
                .new_data(&subject),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                SubjectResponse { subject },
                "Subject updated",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(EduStatsError::Conflict(_)) => Ok(already_exists()),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Subject update failed: {e}"),
            )),
        ),
    }
}
