use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{UserService, prepare_new_user};
use crate::errors::EduStatsError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{requests::CreateUserRequest, responses::UserResponse},
};

pub async fn create_user(
    service: &UserService,
    user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let user_data = match prepare_new_user(
        &storage,
        &user_data.email,
        &user_data.password,
        &user_data.display_name,
        user_data.role,
        user_data.program_id,
    )
    .await
    {
        Ok(data) => data,
        Err(response) => return Ok(response),
    };

    match storage.create_user(user_data).await {
        Ok(user) => Ok(HttpResponse::Created()
            .json(ApiResponse::success(UserResponse { user }, "User created"))),
        Err(EduStatsError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserAlreadyExists, "Email already exists"),
        )),
        Err(e) => {
            error!("User creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::UserCreationFailed,
                    format!("User creation failed: {e}"),
                )),
            )
        }
    }
}
