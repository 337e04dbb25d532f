use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{StudentService, resolve_student_filter};
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, students::requests::StudentListParams};

pub async fn list_students(
    service: &StudentService,
    params: StudentListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let filter = match resolve_student_filter(
        &storage,
        &scope,
        params.program_id,
        params.subject_id,
        params.status,
        params.search,
    )
    .await
    {
        Ok(filter) => filter,
        Err(response) => return Ok(response),
    };

    match storage
        .list_students_with_pagination(&scope, filter, params.pagination)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Students retrieved successfully",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to retrieve students: {e}"),
            )),
        ),
    }
}
