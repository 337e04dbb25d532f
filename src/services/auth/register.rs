use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::EduStatsError;
use crate::models::users::entities::UserRole;
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode, auth::requests::RegisterRequest};
use crate::services::users::prepare_new_user;

use super::AuthService;

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let role = register_request.role.unwrap_or(UserRole::Teacher);

    // 1. 已有管理员时不允许自助注册管理员
    if role == UserRole::Admin {
        match storage.count_users_by_role(UserRole::Admin).await {
            Ok(0) => {}
            Ok(_) => {
                return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                    ErrorCode::AdminRegistrationClosed,
                    "Administrator registration is closed",
                )));
            }
            Err(e) => {
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::RegisterFailed,
                        format!("Register failed: {e}"),
                    )),
                );
            }
        }
    }

    // 2. 校验邮箱、姓名、密码与专业
    let create_request = match prepare_new_user(
        &storage,
        &register_request.email,
        &register_request.password,
        &register_request.display_name,
        role,
        register_request.program_id,
    )
    .await
    {
        Ok(req) => req,
        Err(response) => return Ok(response),
    };

    // 3. 创建用户
    match storage.create_user(create_request).await {
        Ok(user) => {
            tracing::info!("New {} account registered: {}", user.role, user.email);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(UserResponse { user }, "Registration successful")))
        }
        Err(EduStatsError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserAlreadyExists, "Email already exists"),
        )),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::RegisterFailed,
                format!("Register failed: {e}"),
            )),
        ),
    }
}
