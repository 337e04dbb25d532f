use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{ProgramService, ensure_no_conflict, normalize_code};
use crate::errors::EduStatsError;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::{ApiResponse, ErrorCode, programs::requests::CreateProgramRequest};
use crate::services::audit::{AuditEntry, record};
use crate::utils::validate::require_text;

pub async fn create_program(
    service: &ProgramService,
    req: CreateProgramRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let name = match require_text("name", &req.name) {
        Ok(name) => name,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ProgramInvalid, msg)));
        }
    };
    let code = normalize_code(req.code.as_deref());

    if let Err(response) = ensure_no_conflict(&storage, &name, code.as_deref(), None).await {
        return Ok(response);
    }

    match storage
        .create_program(CreateProgramRequest { name, code })
        .await
    {
        Ok(program) => {
            info!("Program created: {} ({})", program.name, program.id);
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Create,
                    AuditEntity::Program,
                    Some(program.id),
                    format!("Created program {}", program.name),
                )
                .new_data(&program),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(program, "Program created")))
        }
        Err(EduStatsError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::ProgramAlreadyExists, "Program already exists"),
        )),
        Err(e) => {
            error!("Program creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Program creation failed: {e}"),
                )),
            )
        }
    }
}
