pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::subjects::entities::Subject;
use crate::models::subjects::requests::{
    CreateSubjectRequest, SubjectListParams, UpdateSubjectRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct SubjectService {
    storage: Option<Arc<dyn Storage>>,
}

impl SubjectService {
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

    pub async fn list_subjects(
        &self,
        params: SubjectListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_subjects(self, params, request).await
    }

    pub async fn create_subject(
        &self,
        req: CreateSubjectRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_subject(self, req, request).await
    }

    pub async fn update_subject(
        &self,
        subject_id: i64,
        update: UpdateSubjectRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_subject(self, subject_id, update, request).await
    }

    pub async fn delete_subject(
        &self,
        subject_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_subject(self, subject_id, request).await
    }
}

fn invalid(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::SubjectInvalid, msg))
}

fn permission_denied() -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(
        ErrorCode::SubjectPermissionDenied,
        "Subject belongs to another program",
    ))
}

fn already_exists() -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::SubjectAlreadyExists,
        "Subject already exists in this program",
    ))
}

fn validate_semester(semester: i32) -> Result<(), HttpResponse> {
    if semester < 1 {
        return Err(invalid("semester must be at least 1"));
    }
    Ok(())
}

/// 同一 (name, program_id) 桶内不能重名；公共科目单独成桶
///
/// SQLite 的唯一索引不约束 NULL，这里统一在写入前检查。
async fn ensure_unique(
    storage: &Arc<dyn Storage>,
    name: &str,
    program_id: Option<i64>,
    exclude_id: Option<i64>,
) -> Result<(), HttpResponse> {
    match storage.find_subject(name, program_id).await {
        Ok(Some(existing)) if Some(existing.id) != exclude_id => Err(already_exists()),
        Ok(_) => Ok(()),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to check subject: {e}"),
            )),
        ),
    }
}

async fn load_subject(storage: &Arc<dyn Storage>, subject_id: i64) -> Result<Subject, HttpResponse> {
    match storage.get_subject_by_id(subject_id).await {
        Ok(Some(subject)) => Ok(subject),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubjectNotFound,
            "Subject not found",
        ))),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to get subject: {e}"),
            )),
        ),
    }
}
