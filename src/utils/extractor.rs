//! 路径参数安全提取器
//!
//! 路径中的 ID 必须是正整数，否则直接返回 400 统一响应。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn bad_path_param(message: String) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(
        ErrorCode::BadRequest,
        message.clone(),
    ));
    InternalError::from_response(message, response).into()
}

/// 解析名为 `name` 的路径参数为正整数
pub(crate) fn parse_positive_id(req: &HttpRequest, name: &str) -> Result<i64, actix_web::Error> {
    let raw = req
        .match_info()
        .get(name)
        .ok_or_else(|| bad_path_param(format!("Missing path parameter: {name}")))?;

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(bad_path_param(format!("Invalid path parameter {name}: {raw}"))),
    }
}

macro_rules! define_safe_id_extractor {
    ($(#[$meta:meta])* $name:ident, $param:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                ready(parse_positive_id(req, $param).map($name))
            }
        }
    };
}

define_safe_id_extractor!(
    /// 通用 `{id}` 路径参数
    SafeIDI64,
    "id"
);
define_safe_id_extractor!(
    /// 审计日志查询中的 `{entity_id}`
    SafeEntityIdI64,
    "entity_id"
);

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_valid_id() {
        let (req, mut payload) = TestRequest::default()
            .param("id", "42")
            .to_http_parts();
        let id = SafeIDI64::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(id, SafeIDI64(42));
    }

    #[actix_web::test]
    async fn test_rejects_invalid_ids() {
        for raw in ["0", "-3", "abc", "1.5"] {
            let (req, mut payload) = TestRequest::default().param("id", raw).to_http_parts();
            let err = SafeIDI64::from_request(&req, &mut payload)
                .await
                .unwrap_err();
            assert_eq!(
                err.error_response().status(),
                actix_web::http::StatusCode::BAD_REQUEST
            );
        }
    }

    #[actix_web::test]
    async fn test_named_param() {
        let (req, mut payload) = TestRequest::default()
            .param("entity_id", "7")
            .to_http_parts();
        let id = SafeEntityIdI64::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(id.0, 7);
    }
}
