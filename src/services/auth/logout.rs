use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::middlewares::require_jwt::{extract_bearer_token, revoke_token, user_cache_key};
use crate::models::ApiResponse;
use crate::utils::jwt::JwtUtils;

use super::AuthService;

/// 处理用户登出
/// 吊销 access token 与 refresh token，移除缓存用户并清除 refresh_token cookie
pub async fn handle_logout(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Some(cache) = service.get_cache(request) {
        if let Some(token) = extract_bearer_token(request) {
            cache.remove(&user_cache_key(&token)).await;
            // 已过期或无效的令牌无需吊销
            if let Ok(claims) = JwtUtils::verify_access_token(&token) {
                revoke_token(&cache, &token, claims.exp).await;
            }
        }

        if let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request)
            && let Ok(claims) = JwtUtils::verify_refresh_token(&refresh_token)
        {
            revoke_token(&cache, &refresh_token, claims.exp).await;
        }
    }

    let empty_cookie = JwtUtils::create_empty_refresh_token_cookie();

    Ok(HttpResponse::Ok()
        .cookie(empty_cookie)
        .json(ApiResponse::<()>::success_empty("Logged out successfully")))
}
