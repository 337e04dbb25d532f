/*!
 * 账号角色校验中间件
 *
 * EduStats 的账号只有一个角色（teacher 或 admin）。此中间件读取 RequireJWT
 * 放入请求扩展的用户，角色不在允许列表内时返回 403。
 * 必须包在 RequireJWT 内层，actix 中后调用的 `wrap` 先执行，因此 RequireJWT 写在最后。
 *
 * ## 使用方法
 *
 * 账号管理只对管理员开放：
 *
 * ```rust,ignore
 * web::scope("/api/v1/users")
 *     .wrap(RequireRole::new_any(UserRole::admin_roles()))
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_users))
 * ```
 *
 * 学生与成绩对教师和管理员都开放，教师的数据范围另由 `RequireJWT::extract_scope` 限定：
 *
 * ```rust,ignore
 * .wrap(RequireRole::new_any(UserRole::all_roles()))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::models::{
    ErrorCode,
    users::entities::{self, UserRole},
};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    allowed_roles: Rc<[UserRole]>,
}

impl RequireRole {
    /// 允许列表中任一角色的账号通过
    pub fn new_any(roles: &[&UserRole]) -> Self {
        Self {
            allowed_roles: roles.iter().map(|r| (*r).clone()).collect(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed_roles: self.allowed_roles.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed_roles: Rc<[UserRole]>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
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
        let allowed_roles = self.allowed_roles.clone();

        Box::pin(async move {
            let account = req
                .extensions()
                .get::<entities::User>()
                .map(|user| (user.id, user.role.clone()));

            let Some((user_id, role)) = account else {
                info!("Role check reached without an authenticated account, RequireJWT missing");
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Authentication required",
                    )
                    .map_into_right_body(),
                ));
            };

            if allowed_roles.contains(&role) {
                return Ok(srv.call(req).await?.map_into_left_body());
            }

            info!(
                "Account {} ({}) denied on {}, allowed roles: {:?}",
                user_id,
                role,
                req.path(),
                allowed_roles
            );
            Ok(req.into_response(
                create_error_response(
                    StatusCode::FORBIDDEN,
                    ErrorCode::Forbidden,
                    &format!("{role} accounts cannot access this resource"),
                )
                .map_into_right_body(),
            ))
        })
    }
}
