use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{RiskFactorService, already_exists, ensure_dropout, invalid};
use crate::errors::EduStatsError;
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::risk_factors::requests::CreateRiskFactorRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};
use crate::services::students::load_student;
use crate::utils::validate::require_text;

pub async fn create_risk_factor(
    service: &RiskFactorService,
    student_id: i64,
    req: CreateRiskFactorRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let student = match load_student(&storage, &scope, student_id).await {
        Ok(student) => student,
        Err(response) => return Ok(response),
    };
    if let Err(response) = ensure_dropout(&student) {
        return Ok(response);
    }

    let label = match require_text("label", &req.label) {
        Ok(label) => label,
        Err(msg) => return Ok(invalid(msg)),
    };
    let period = match require_text("period", &req.period) {
        Ok(period) => period,
        Err(msg) => return Ok(invalid(msg)),
    };

    let req = CreateRiskFactorRequest {
        kind: req.kind,
        label,
        period,
    };

    match storage.create_risk_factor(student_id, req).await {
        Ok(risk_factor) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Create,
                    AuditEntity::RiskFactor,
                    Some(risk_factor.id),
                    format!(
                        "Recorded risk factor for student {}: {}",
                        student.enrollment_id, risk_factor.kind
                    ),
                )
                .new_data(&risk_factor),
            )
            .await;
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(risk_factor, "Risk factor recorded")))
        }
        Err(EduStatsError::Conflict(_)) => Ok(already_exists()),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to record risk factor: {e}"),
            )),
        ),
    }
}
