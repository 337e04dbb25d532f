use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::imports::requests::{GradeExportParams, StudentExportParams};
use crate::models::users::entities::UserRole;
use crate::services::ExportService;

static EXPORT_SERVICE: Lazy<ExportService> = Lazy::new(ExportService::new_lazy);

pub async fn export_students(
    req: HttpRequest,
    query: web::Query<StudentExportParams>,
) -> ActixResult<HttpResponse> {
    EXPORT_SERVICE.export_students(query.into_inner(), &req).await
}

pub async fn export_grades(
    req: HttpRequest,
    query: web::Query<GradeExportParams>,
) -> ActixResult<HttpResponse> {
    EXPORT_SERVICE.export_grades(query.into_inner(), &req).await
}

pub fn configure_export_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/exports")
            .wrap(middlewares::RequireRole::new_any(UserRole::all_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/students", web::get().to(export_students))
            .route("/grades", web::get().to(export_grades)),
    );
}
