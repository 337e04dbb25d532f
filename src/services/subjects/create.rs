use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{
    SubjectService, already_exists, ensure_unique, invalid, permission_denied, validate_semester,
};
use crate::errors::EduStatsError;
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::subjects::requests::CreateSubjectRequest;
use crate::models::subjects::responses::SubjectResponse;
use crate::models::{AccessScope, ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};
use crate::services::users::ensure_program_exists;
use crate::utils::validate::require_text;

pub async fn create_subject(
    service: &SubjectService,
    req: CreateSubjectRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let name = match require_text("name", &req.name) {
        Ok(name) => name,
        Err(msg) => return Ok(invalid(msg)),
    };
    if let Err(response) = validate_semester(req.semester) {
        return Ok(response);
    }

    // 教师创建的科目归属本专业；管理员不指定专业则为公共科目
    let program_id = match &scope {
        AccessScope::Program { id, .. } => Some(*id),
        AccessScope::Nothing => return Ok(permission_denied()),
        AccessScope::All => {
            if let Some(program_id) = req.program_id
                && let Err(response) = ensure_program_exists(&storage, program_id).await
            {
                return Ok(response);
            }
            req.program_id
        }
    };

    if let Err(response) = ensure_unique(&storage, &name, program_id, None).await {
        return Ok(response);
    }

    let req = CreateSubjectRequest {
        name,
        semester: req.semester,
        program_id,
    };

    match storage.create_subject(req).await {
        Ok(subject) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Create,
                    AuditEntity::Subject,
                    Some(subject.id),
                    format!("Created subject {}", subject.name),
                )
                .new_data(&subject),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(
                SubjectResponse { subject },
                "Subject created",
            )))
        }
        Err(EduStatsError::Conflict(_)) => Ok(already_exists()),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Subject creation failed: {e}"),
            )),
        ),
    }
}
