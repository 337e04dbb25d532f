//! 辍学风险因素
//!
//! 只能为状态为辍学的学生登记；同一学生同一学期同一类别只允许一条。

pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::risk_factors::entities::RiskFactor;
use crate::models::risk_factors::requests::{CreateRiskFactorRequest, UpdateRiskFactorRequest};
use crate::models::students::entities::{Student, StudentStatus};
use crate::models::{AccessScope, ApiResponse, ErrorCode};
use crate::services::students::load_student;
use crate::storage::Storage;

pub struct RiskFactorService {
    storage: Option<Arc<dyn Storage>>,
}

impl RiskFactorService {
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

    pub async fn list_risk_factors(
        &self,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_risk_factors(self, student_id, request).await
    }

    pub async fn create_risk_factor(
        &self,
        student_id: i64,
        req: CreateRiskFactorRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_risk_factor(self, student_id, req, request).await
    }

    pub async fn update_risk_factor(
        &self,
        risk_factor_id: i64,
        update: UpdateRiskFactorRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_risk_factor(self, risk_factor_id, update, request).await
    }

    pub async fn delete_risk_factor(
        &self,
        risk_factor_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_risk_factor(self, risk_factor_id, request).await
    }
}

fn ensure_dropout(student: &Student) -> Result<(), HttpResponse> {
    if student.status != StudentStatus::Dropout {
        return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::StudentNotDropout,
            "Risk factors can only be recorded for dropout students",
        )));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::RiskFactorInvalid, msg))
}

fn already_exists() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::RiskFactorAlreadyExists,
        "Risk factor of this kind already recorded for the period",
    ))
}

/// 加载风险因素及其学生，并检查学生的可见范围
async fn load_risk_factor(
    storage: &Arc<dyn Storage>,
    scope: &AccessScope,
    risk_factor_id: i64,
) -> Result<(RiskFactor, Student), HttpResponse> {
    let risk_factor = match storage.get_risk_factor_by_id(risk_factor_id).await {
        Ok(Some(risk_factor)) => risk_factor,
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::RiskFactorNotFound,
                "Risk factor not found",
            )));
        }
        Err(e) => {
            return Err(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to get risk factor: {e}"),
                )),
            );
        }
    };

    let student = load_student(storage, scope, risk_factor.student_id).await?;
    Ok((risk_factor, student))
}
