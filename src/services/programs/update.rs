use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ProgramService, ensure_no_conflict, normalize_code};
use crate::errors::EduStatsError;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::{ApiResponse, ErrorCode, programs::requests::UpdateProgramRequest};
use crate::services::audit::{AuditEntry, record};
use crate::services::users::invalidate_cached_users;
use crate::utils::validate::require_text;

pub async fn update_program(
    service: &ProgramService,
    program_id: i64,
    update: UpdateProgramRequest,
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

    let name = match update.name.as_deref().map(|name| require_text("name", name)) {
        Some(Ok(name)) => Some(name),
        Some(Err(msg)) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ProgramInvalid, msg)));
        }
        None => None,
    };

    // 传入空串表示清除代码
    let code = update
        .code
        .as_deref()
        .map(|code| normalize_code(Some(code)).unwrap_or_default());

    let effective_name = name.clone().unwrap_or_else(|| existing.name.clone());
    let effective_code = match &code {
        Some(code) if code.is_empty() => None,
        Some(code) => Some(code.clone()),
        None => existing.code.clone(),
    };
    if let Err(response) = ensure_no_conflict(
        &storage,
        &effective_name,
        effective_code.as_deref(),
        Some(program_id),
    )
    .await
    {
        return Ok(response);
    }

    match storage
        .update_program(program_id, UpdateProgramRequest { name, code })
        .await
    {
        Ok(Some(program)) => {
            // 教师会话中缓存了专业名称
            invalidate_cached_users(request).await;
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Update,
                    AuditEntity::Program,
                    Some(program.id),
                    format!("Updated program {}", program.name),
                )
                .old(&existing)
                .new_data(&program),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(program, "Program updated")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ProgramNotFound,
            "Program not found",
        ))),
        Err(EduStatsError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::ProgramAlreadyExists, "Program already exists"),
        )),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Program update failed: {e}"),
            )),
        ),
    }
}
