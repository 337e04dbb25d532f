use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::RiskFactorService;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, risk_factors::responses::RiskFactorListResponse};
use crate::services::students::load_student;

pub async fn list_risk_factors(
    service: &RiskFactorService,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    if let Err(response) = load_student(&storage, &scope, student_id).await {
        return Ok(response);
    }

    match storage.list_risk_factors_by_student(student_id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RiskFactorListResponse { items },
            "Risk factors retrieved successfully",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to retrieve risk factors: {e}"),
            )),
        ),
    }
}
