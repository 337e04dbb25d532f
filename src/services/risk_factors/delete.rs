use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{RiskFactorService, load_risk_factor};
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};

pub async fn delete_risk_factor(
    service: &RiskFactorService,
    risk_factor_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    // 学生恢复在读后仍允许清理旧记录
    let (existing, student) = match load_risk_factor(&storage, &scope, risk_factor_id).await {
        Ok(loaded) => loaded,
        Err(response) => return Ok(response),
    };

    match storage.delete_risk_factor(risk_factor_id).await {
        Ok(true) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Delete,
                    AuditEntity::RiskFactor,
                    Some(risk_factor_id),
                    format!("Deleted a risk factor of student {}", student.enrollment_id),
                )
                .old(&existing),
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Risk factor deleted")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::RiskFactorNotFound,
            "Risk factor not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to delete risk factor: {e}"),
            )),
        ),
    }
}
