pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::middlewares::require_jwt::USER_CACHE_PREFIX;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateUserRequest, UpdateUserRequest, UserListParams};
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::validate::{
    normalize_email, require_text, validate_email, validate_password_simple,
};

pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
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

    // 获取用户列表
    pub async fn list_users(
        &self,
        query: UserListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_users(self, query, request).await
    }

    // 创建用户
    pub async fn create_user(
        &self,
        user_data: CreateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_user(self, user_data, request).await
    }

    // 根据ID获取用户
    pub async fn get_user(&self, user_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);

        match storage.get_user_by_id(user_id).await {
            Ok(Some(user)) => Ok(HttpResponse::Ok()
                .json(ApiResponse::success(UserResponse { user }, "User retrieved"))),
            Ok(None) => Ok(HttpResponse::NotFound()
                .json(ApiResponse::error_empty(ErrorCode::UserNotFound, "User not found"))),
            Err(e) => Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to get user: {e}"),
                )),
            ),
        }
    }

    // 更新用户信息
    pub async fn update_user(
        &self,
        user_id: i64,
        update_data: UpdateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_user(self, user_id, update_data, request).await
    }

    // 删除用户
    pub async fn delete_user(
        &self,
        user_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_user(self, user_id, request).await
    }
}

/// 校验新账号并返回可写库的请求（邮箱已规范化，密码已哈希）
///
/// 注册与管理员创建用户共用：教师必须绑定已存在的专业，管理员不绑定专业。
pub(crate) async fn prepare_new_user(
    storage: &Arc<dyn Storage>,
    email: &str,
    password: &str,
    display_name: &str,
    role: UserRole,
    program_id: Option<i64>,
) -> Result<CreateUserRequest, HttpResponse> {
    let email = normalize_email(email);
    if let Err(msg) = validate_email(&email) {
        return Err(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
    }

    let display_name = require_text("display_name", display_name).map_err(|msg| {
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg))
    })?;

    if let Err(msg) = validate_password_simple(password) {
        return Err(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }

    let program_id = match role {
        UserRole::Admin => None,
        UserRole::Teacher => {
            let Some(program_id) = program_id else {
                return Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::ProgramInvalid,
                    "Teachers must belong to a program",
                )));
            };
            ensure_program_exists(storage, program_id).await?;
            Some(program_id)
        }
    };

    match storage.get_user_by_email(&email).await {
        Ok(Some(_)) => {
            return Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserAlreadyExists,
                "Email already exists",
            )));
        }
        Ok(None) => {}
        Err(e) => {
            return Err(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to check email: {e}"),
                )),
            );
        }
    }

    let password = hash_password(password).map_err(|e| {
        HttpResponse::InternalServerError().json(ApiResponse::error_empty(
            ErrorCode::InternalServerError,
            format!("Password hashing failed: {e}"),
        ))
    })?;

    Ok(CreateUserRequest {
        email,
        password,
        display_name,
        role,
        program_id,
    })
}

/// 专业必须存在
pub(crate) async fn ensure_program_exists(
    storage: &Arc<dyn Storage>,
    program_id: i64,
) -> Result<(), HttpResponse> {
    match storage.get_program_by_id(program_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ProgramNotFound,
            "Program not found",
        ))),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to get program: {e}"),
            )),
        ),
    }
}

/// 账号或专业变更后清空缓存中的会话用户，下次请求重新从数据库加载
/// 只清理用户键，登出吊销标记保持不变
pub(crate) async fn invalidate_cached_users(request: &HttpRequest) {
    if let Some(cache) = request.app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>() {
        cache.invalidate_prefix(USER_CACHE_PREFIX).await;
    }
}
