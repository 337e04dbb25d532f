use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProgramService;
use crate::models::{ApiResponse, ErrorCode, programs::responses::ProgramListResponse};

pub async fn list_programs(
    service: &ProgramService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.list_programs().await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ProgramListResponse { items },
            "Programs retrieved successfully",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to retrieve programs: {e}"),
            )),
        ),
    }
}
