//! 统计图表数据
//!
//! 所有查询按当前用户的可见范围过滤，没有数据时返回空序列。
//! 同一份聚合结果既以 JSON 返回，也可渲染为 PNG 下载。

pub mod aggregate;
pub mod render;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::error;

use crate::middlewares::RequireJWT;
use crate::models::charts::requests::{ChartKind, ParetoQuery};
use crate::models::charts::responses::{
    DashboardResponse, IshikawaResponse, ParetoResponse, ScatterResponse,
};
use crate::models::grades::entities::PASSING_SCORE;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use render::ChartData;

pub struct ChartService {
    storage: Option<Arc<dyn Storage>>,
}

fn query_failed(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        format!("Failed to load chart data: {e}"),
    ))
}

impl ChartService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn dashboard(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);
        let scope = RequireJWT::extract_scope(request);

        let counts = match storage.count_students(&scope).await {
            Ok(counts) => counts,
            Err(e) => return Ok(query_failed(e)),
        };
        let pairs = match storage.list_score_attendance(&scope).await {
            Ok(pairs) => pairs,
            Err(e) => return Ok(query_failed(e)),
        };
        let dropout_semesters = match storage.list_dropout_semesters(&scope).await {
            Ok(semesters) => semesters,
            Err(e) => return Ok(query_failed(e)),
        };

        let scores: Vec<f64> = pairs.iter().map(|(score, _)| *score).collect();
        let total_grades = scores.len() as u64;
        let failing = scores.iter().filter(|s| **s < PASSING_SCORE).count() as u64;

        let failing_rate = if counts.total == 0 {
            0.0
        } else {
            aggregate::percentage(failing, total_grades)
        };

        let response = DashboardResponse {
            total_students: counts.total,
            total_grades,
            failing_rate,
            dropout_rate: aggregate::percentage(counts.dropouts, counts.total),
            histogram: aggregate::histogram(&scores),
            dropout_semesters,
        };

        Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Dashboard data")))
    }

    /// 辍学学生的风险因素 Pareto 图
    pub async fn pareto(
        &self,
        query: ParetoQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);
        let scope = RequireJWT::extract_scope(request);
        let semester = query.semester();

        let kinds = match storage.list_risk_factor_kinds(&scope, true, semester).await {
            Ok(kinds) => kinds,
            Err(e) => return Ok(query_failed(e)),
        };

        let response = ParetoResponse {
            semester,
            total: kinds.len() as u64,
            bars: aggregate::pareto(&kinds),
        };

        Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Pareto data")))
    }

    pub async fn histogram(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);
        let scope = RequireJWT::extract_scope(request);

        let pairs = match storage.list_score_attendance(&scope).await {
            Ok(pairs) => pairs,
            Err(e) => return Ok(query_failed(e)),
        };
        let scores: Vec<f64> = pairs.into_iter().map(|(score, _)| score).collect();

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            aggregate::histogram(&scores),
            "Histogram data",
        )))
    }

    pub async fn scatter(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);
        let scope = RequireJWT::extract_scope(request);

        let pairs = match storage.list_score_attendance(&scope).await {
            Ok(pairs) => pairs,
            Err(e) => return Ok(query_failed(e)),
        };

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            ScatterResponse {
                points: aggregate::scatter(&pairs),
            },
            "Scatter data",
        )))
    }

    /// 全部学生（任意状态）的风险因素分类
    pub async fn ishikawa(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);
        let scope = RequireJWT::extract_scope(request);

        let kinds = match storage.list_risk_factor_kinds(&scope, false, None).await {
            Ok(kinds) => kinds,
            Err(e) => return Ok(query_failed(e)),
        };

        let response = IshikawaResponse {
            total: kinds.len() as u64,
            categories: aggregate::ishikawa(&kinds),
        };

        Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Ishikawa data")))
    }

    /// 图表导出为 PNG 附件；`semester` 只对 Pareto 生效
    pub async fn export_chart(
        &self,
        chart_type: &str,
        query: ParetoQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let kind = match chart_type.parse::<ChartKind>() {
            Ok(kind) => kind,
            Err(msg) => {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::ChartTypeInvalid, msg)));
            }
        };

        let storage = self.get_storage(request);
        let scope = RequireJWT::extract_scope(request);

        let data = match kind {
            ChartKind::Pareto | ChartKind::Ishikawa => {
                let dropout_only = kind == ChartKind::Pareto;
                let semester = if dropout_only { query.semester() } else { None };
                let kinds = match storage
                    .list_risk_factor_kinds(&scope, dropout_only, semester)
                    .await
                {
                    Ok(kinds) => kinds,
                    Err(e) => return Ok(query_failed(e)),
                };
                if dropout_only {
                    ChartData::Pareto(aggregate::pareto(&kinds))
                } else {
                    ChartData::Ishikawa(aggregate::ishikawa(&kinds))
                }
            }
            ChartKind::Histogram | ChartKind::Scatter => {
                let pairs = match storage.list_score_attendance(&scope).await {
                    Ok(pairs) => pairs,
                    Err(e) => return Ok(query_failed(e)),
                };
                if kind == ChartKind::Histogram {
                    let scores: Vec<f64> = pairs.into_iter().map(|(score, _)| score).collect();
                    ChartData::Histogram(aggregate::histogram(&scores))
                } else {
                    ChartData::Scatter(aggregate::scatter(&pairs))
                }
            }
        };

        // 栅格化是 CPU 密集操作
        let png = match tokio::task::spawn_blocking(move || render::render_png(&data)).await {
            Ok(Ok(png)) => png,
            Ok(Err(e)) => {
                error!("Failed to render {} chart: {}", kind.file_stem(), e.message());
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::ChartRenderFailed,
                        e.message(),
                    )),
                );
            }
            Err(e) => {
                error!("Chart rendering task failed: {}", e);
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::ChartRenderFailed,
                        "Chart rendering failed",
                    )),
                );
            }
        };

        Ok(HttpResponse::Ok()
            .content_type("image/png")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}.png\"", kind.file_stem()),
            ))
            .body(png))
    }
}
