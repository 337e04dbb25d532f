use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::risk_factors::requests::UpdateRiskFactorRequest;
use crate::models::users::entities::UserRole;
use crate::services::RiskFactorService;
use crate::utils::SafeIDI64;

static RISK_FACTOR_SERVICE: Lazy<RiskFactorService> = Lazy::new(RiskFactorService::new_lazy);

pub async fn update_risk_factor(
    req: HttpRequest,
    risk_factor_id: SafeIDI64,
    body: web::Json<UpdateRiskFactorRequest>,
) -> ActixResult<HttpResponse> {
    RISK_FACTOR_SERVICE
        .update_risk_factor(risk_factor_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_risk_factor(
    req: HttpRequest,
    risk_factor_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    RISK_FACTOR_SERVICE
        .delete_risk_factor(risk_factor_id.0, &req)
        .await
}

pub fn configure_risk_factor_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/risk-factors")
            .wrap(middlewares::RequireRole::new_any(UserRole::all_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/{id}", web::put().to(update_risk_factor))
            .route("/{id}", web::delete().to(delete_risk_factor)),
    );
}
