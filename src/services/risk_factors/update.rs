use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{RiskFactorService, already_exists, ensure_dropout, invalid, load_risk_factor};
use crate::errors::EduStatsError;
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::risk_factors::requests::UpdateRiskFactorRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};
use crate::utils::validate::require_text;

pub async fn update_risk_factor(
    service: &RiskFactorService,
    risk_factor_id: i64,
    update: UpdateRiskFactorRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let (existing, student) = match load_risk_factor(&storage, &scope, risk_factor_id).await {
        Ok(loaded) => loaded,
        Err(response) => return Ok(response),
    };
    if let Err(response) = ensure_dropout(&student) {
        return Ok(response);
    }

    let label = match update.label.map(|v| require_text("label", &v)).transpose() {
        Ok(label) => label,
        Err(msg) => return Ok(invalid(msg)),
    };
    let period = match update.period.map(|v| require_text("period", &v)).transpose() {
        Ok(period) => period,
        Err(msg) => return Ok(invalid(msg)),
    };

    let update = UpdateRiskFactorRequest {
        kind: update.kind,
        label,
        period,
    };

    match storage.update_risk_factor(risk_factor_id, update).await {
        Ok(Some(risk_factor)) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Update,
                    AuditEntity::RiskFactor,
                    Some(risk_factor.id),
                    format!("Updated a risk factor of student {}", student.enrollment_id),
                )
                .old(&existing)
                .new_data(&risk_factor),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(risk_factor, "Risk factor updated")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::RiskFactorNotFound,
            "Risk factor not found",
        ))),
        Err(EduStatsError::Conflict(_)) => Ok(already_exists()),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to update risk factor: {e}"),
            )),
        ),
    }
}
