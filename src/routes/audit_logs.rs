use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::audit::requests::AuditLogListParams;
use crate::models::users::entities::UserRole;
use crate::services::AuditService;
use crate::utils::SafeEntityIdI64;

static AUDIT_SERVICE: Lazy<AuditService> = Lazy::new(AuditService::new_lazy);

pub async fn list_audit_logs(
    req: HttpRequest,
    query: web::Query<AuditLogListParams>,
) -> ActixResult<HttpResponse> {
    AUDIT_SERVICE.list_logs(query.into_inner(), &req).await
}

pub async fn list_entity_audit_logs(
    req: HttpRequest,
    entity_id: SafeEntityIdI64,
) -> ActixResult<HttpResponse> {
    let entity = req.match_info().get("entity").unwrap_or_default().to_string();
    AUDIT_SERVICE
        .list_entity_logs(&entity, entity_id.0, &req)
        .await
}

pub fn configure_audit_log_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/audit-logs")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_audit_logs))
            .route("/{entity}/{entity_id}", web::get().to(list_entity_audit_logs)),
    );
}
