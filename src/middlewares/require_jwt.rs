/*!
 * JWT 认证中间件
 *
 * 验证 `Authorization: Bearer <token>` 中的 access token，
 * 通过后把当前用户放入请求扩展，供后续处理程序与 `RequireRole` 使用。
 *
 * ```rust,ignore
 * web::scope("/api/v1/students")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_students))
 * ```
 *
 * 在处理程序中：
 *
 * ```rust,ignore
 * let user = RequireJWT::extract_user_claims(&req);
 * ```
 *
 * 令牌缺失、无效、已登出或用户已被删除时返回 401。
 * 用户信息按 token 缓存在 `user:{token}`，有效期取 `cache.default_ttl`；
 * 登出的令牌在 `revoked:{token}` 留下标记，直到令牌本身过期。
 */

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::models::users::entities::{self, UserRole};
use crate::models::{AccessScope, ErrorCode};
use crate::storage::Storage;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

/// 会话用户缓存键的前缀
pub const USER_CACHE_PREFIX: &str = "user:";
const REVOKED_TOKEN_PREFIX: &str = "revoked:";

/// 当前用户在缓存中的键
pub fn user_cache_key(token: &str) -> String {
    format!("{USER_CACHE_PREFIX}{token}")
}

fn revoked_token_key(token: &str) -> String {
    format!("{REVOKED_TOKEN_PREFIX}{token}")
}

/// 吊销令牌，标记保留到令牌的 `exp`
pub async fn revoke_token(cache: &Arc<dyn ObjectCache>, token: &str, exp: usize) {
    let remaining = (exp as i64) - chrono::Utc::now().timestamp();
    if remaining <= 0 {
        return;
    }
    cache
        .insert_raw(revoked_token_key(token), "1".to_string(), remaining as u64)
        .await;
}

/// 令牌是否已被吊销
pub async fn is_token_revoked(cache: &Arc<dyn ObjectCache>, token: &str) -> bool {
    matches!(
        cache.get_raw(&revoked_token_key(token)).await,
        CacheResult::Found(_)
    )
}

/// 从请求头中提取 Bearer token
pub fn extract_bearer_token(req: &actix_web::HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(|s| s.trim().to_string())
}

// 辅助函数：提取并验证 JWT access token
async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<entities::User, String> {
    let token = extract_bearer_token(req.request())
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let claims = crate::utils::jwt::JwtUtils::verify_access_token(&token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    let cache = req
        .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
        .ok_or_else(|| "Cache not configured".to_string())?
        .get_ref()
        .clone();

    if is_token_revoked(&cache, &token).await {
        return Err("Session has been logged out".to_string());
    }

    let cache_key = user_cache_key(&token);

    // 从缓存中获取用户信息
    match cache.get_raw(&cache_key).await {
        CacheResult::Found(json) => match serde_json::from_str::<entities::User>(&json) {
            Ok(user) => return Ok(user),
            Err(_) => {
                cache.remove(&cache_key).await;
                info!("Failed to deserialize cached user, entry dropped");
            }
        },
        _ => {
            debug!("User not found in cache, loading from storage");
        }
    };

    let storage = req
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .ok_or_else(|| "Storage not configured".to_string())?
        .get_ref()
        .clone();

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| "Invalid user ID in JWT".to_string())?;

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|_| "Failed to retrieve user from storage".to_string())?
        .ok_or_else(|| "User not found".to_string())?;

    // 将用户信息存入缓存
    let app_config = AppConfig::get();
    if let Ok(user_json) = serde_json::to_string(&user) {
        cache
            .insert_raw(cache_key, user_json, app_config.cache.default_ttl)
            .await;
    }

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 处理 OPTIONS 请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            // 验证 JWT token
            match extract_and_validate_jwt(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取用户信息
impl RequireJWT {
    /// 从请求扩展中提取当前用户
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_user_claims(req: &actix_web::HttpRequest) -> Option<entities::User> {
        req.extensions().get::<entities::User>().cloned()
    }

    /// 从请求扩展中提取用户ID
    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<entities::User>().map(|user| user.id)
    }

    /// 从请求扩展中提取用户角色
    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions()
            .get::<entities::User>()
            .map(|user| user.role.clone())
    }

    /// 当前用户的数据可见范围，未认证时为空范围
    pub fn extract_scope(req: &actix_web::HttpRequest) -> AccessScope {
        req.extensions()
            .get::<entities::User>()
            .map(|user| user.scope())
            .unwrap_or(AccessScope::Nothing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object_cache::moka::MokaCacheWrapper;

    #[actix_web::test]
    async fn test_revoked_marker_lives_until_expiry() {
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(10, 60));
        let now = chrono::Utc::now().timestamp() as usize;

        revoke_token(&cache, "live-token", now + 600).await;
        assert!(is_token_revoked(&cache, "live-token").await);

        // 已过期的令牌本身就会被拒绝，不写标记
        revoke_token(&cache, "stale-token", now.saturating_sub(5)).await;
        assert!(!is_token_revoked(&cache, "stale-token").await);
    }

    #[actix_web::test]
    async fn test_user_invalidation_keeps_revocations() {
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(10, 60));
        let now = chrono::Utc::now().timestamp() as usize;

        cache
            .insert_raw(user_cache_key("abc"), "{}".to_string(), 0)
            .await;
        revoke_token(&cache, "abc", now + 600).await;
        cache.invalidate_prefix(USER_CACHE_PREFIX).await;

        assert!(matches!(
            cache.get_raw(&user_cache_key("abc")).await,
            CacheResult::NotFound
        ));
        assert!(is_token_revoked(&cache, "abc").await);
    }
}
