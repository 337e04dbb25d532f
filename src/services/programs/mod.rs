pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::programs::requests::{CreateProgramRequest, UpdateProgramRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct ProgramService {
    storage: Option<Arc<dyn Storage>>,
}

impl ProgramService {
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

    pub async fn list_programs(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_programs(self, request).await
    }

    pub async fn create_program(
        &self,
        req: CreateProgramRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_program(self, req, request).await
    }

    pub async fn update_program(
        &self,
        program_id: i64,
        update: UpdateProgramRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_program(self, program_id, update, request).await
    }

    pub async fn delete_program(
        &self,
        program_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_program(self, program_id, request).await
    }
}

/// 规范化专业代码：去除空白，空串视为无代码
pub(crate) fn normalize_code(code: Option<&str>) -> Option<String> {
    code.map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

/// 名称或代码已被其他专业占用时返回 409
pub(crate) async fn ensure_no_conflict(
    storage: &Arc<dyn Storage>,
    name: &str,
    code: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<(), HttpResponse> {
    match storage.find_conflicting_program(name, code, exclude_id).await {
        Ok(None) => Ok(()),
        Ok(Some(existing)) => Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::ProgramAlreadyExists,
            format!("Program name or code already used by '{}'", existing.name),
        ))),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to check program: {e}"),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(Some(" ISC ")), Some("ISC".to_string()));
        assert_eq!(normalize_code(Some("   ")), None);
        assert_eq!(normalize_code(None), None);
    }
}
