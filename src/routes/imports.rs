use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::imports::requests::FormatQuery;
use crate::models::users::entities::UserRole;
use crate::services::ImportService;

static IMPORT_SERVICE: Lazy<ImportService> = Lazy::new(ImportService::new_lazy);

pub async fn import_grades(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    IMPORT_SERVICE.import_grades(payload, &req).await
}

pub async fn download_template(query: web::Query<FormatQuery>) -> ActixResult<HttpResponse> {
    IMPORT_SERVICE.download_template(query.format).await
}

pub fn configure_import_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/imports")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/template", web::get().to(download_template))
            .service(
                web::resource("")
                    .wrap(middlewares::RateLimit::import())
                    .route(web::post().to(import_grades)),
            ),
    );
}
