use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::charts::requests::ParetoQuery;
use crate::models::users::entities::UserRole;
use crate::services::ChartService;

static CHART_SERVICE: Lazy<ChartService> = Lazy::new(ChartService::new_lazy);

pub async fn dashboard(req: HttpRequest) -> ActixResult<HttpResponse> {
    CHART_SERVICE.dashboard(&req).await
}

pub async fn pareto(req: HttpRequest, query: web::Query<ParetoQuery>) -> ActixResult<HttpResponse> {
    CHART_SERVICE.pareto(query.into_inner(), &req).await
}

pub async fn histogram(req: HttpRequest) -> ActixResult<HttpResponse> {
    CHART_SERVICE.histogram(&req).await
}

pub async fn scatter(req: HttpRequest) -> ActixResult<HttpResponse> {
    CHART_SERVICE.scatter(&req).await
}

pub async fn ishikawa(req: HttpRequest) -> ActixResult<HttpResponse> {
    CHART_SERVICE.ishikawa(&req).await
}

/// 以 PNG 下载 pareto、histograma、dispersion 或 ishikawa 图
pub async fn export_chart(
    req: HttpRequest,
    chart_type: web::Path<String>,
    query: web::Query<ParetoQuery>,
) -> ActixResult<HttpResponse> {
    CHART_SERVICE
        .export_chart(&chart_type.into_inner(), query.into_inner(), &req)
        .await
}

pub fn configure_chart_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/charts")
            .wrap(middlewares::RequireRole::new_any(UserRole::all_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/dashboard", web::get().to(dashboard))
            .route("/pareto", web::get().to(pareto))
            .route("/histogram", web::get().to(histogram))
            .route("/scatter", web::get().to(scatter))
            .route("/ishikawa", web::get().to(ishikawa))
            .route("/export/{chart_type}", web::get().to(export_chart)),
    );
}
