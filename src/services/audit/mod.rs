//! 审计日志
//!
//! 写入失败只记录日志，不影响主操作。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity, NewAuditLog};
use crate::models::audit::requests::AuditLogListParams;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct AuditService {
    storage: Option<Arc<dyn Storage>>,
}

impl AuditService {
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

    // 分页列出审计日志
    pub async fn list_logs(
        &self,
        params: AuditLogListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);

        match storage
            .list_audit_logs_with_pagination(params.entity, params.pagination)
            .await
        {
            Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Audit logs retrieved successfully",
            ))),
            Err(e) => Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to retrieve audit logs: {e}"),
                )),
            ),
        }
    }

    // 某条记录的审计历史
    pub async fn list_entity_logs(
        &self,
        entity: &str,
        entity_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request);

        match storage.list_audit_logs_for_entity(entity, entity_id).await {
            Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                items,
                "Audit logs retrieved successfully",
            ))),
            Err(e) => Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to retrieve audit logs: {e}"),
                )),
            ),
        }
    }
}

/// 序列化快照
pub(crate) fn snapshot<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

/// 一条待写入的审计记录
pub(crate) struct AuditEntry {
    pub action: AuditAction,
    pub entity: AuditEntity,
    pub entity_id: Option<i64>,
    pub description: String,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
}

impl AuditEntry {
    pub fn new(
        action: AuditAction,
        entity: AuditEntity,
        entity_id: Option<i64>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action,
            entity,
            entity_id,
            description: description.into(),
            old_data: None,
            new_data: None,
        }
    }

    pub fn old<T: Serialize>(mut self, value: &T) -> Self {
        self.old_data = snapshot(value);
        self
    }

    pub fn new_data<T: Serialize>(mut self, value: &T) -> Self {
        self.new_data = snapshot(value);
        self
    }
}

/// 以当前用户身份写入审计日志
pub(crate) async fn record(storage: &Arc<dyn Storage>, request: &HttpRequest, entry: AuditEntry) {
    let user = RequireJWT::extract_user_claims(request);

    let log = NewAuditLog {
        user_id: user.as_ref().map(|u| u.id),
        user_name: user.map(|u| u.display_name),
        action: entry.action,
        entity: entry.entity,
        entity_id: entry.entity_id,
        description: entry.description,
        old_data: entry.old_data,
        new_data: entry.new_data,
    };

    if let Err(e) = storage.create_audit_log(log).await {
        warn!(
            "Failed to write audit log ({} {}): {}",
            entry.action.as_str(),
            entry.entity.as_str(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
        semester: i32,
    }

    #[test]
    fn test_entry_snapshots() {
        let entry = AuditEntry::new(AuditAction::Update, AuditEntity::Subject, Some(3), "Renamed")
            .old(&Sample {
                name: "Cálculo",
                semester: 1,
            })
            .new_data(&Sample {
                name: "Cálculo I",
                semester: 1,
            });

        assert_eq!(entry.entity_id, Some(3));
        assert_eq!(entry.old_data.unwrap()["name"], "Cálculo");
        assert_eq!(entry.new_data.unwrap()["name"], "Cálculo I");
    }
}
