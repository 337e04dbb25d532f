//! 审计日志存储操作

use super::{SeaOrmStorage, db_error, pagination_info};
use crate::entity::audit_logs::{ActiveModel, Column, Entity as AuditLogs};
use crate::errors::Result;
use crate::models::PaginationQuery;
use crate::models::audit::{
    entities::{AuditLog, NewAuditLog},
    responses::AuditLogListResponse,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 写入审计日志
    pub async fn create_audit_log_impl(&self, log: NewAuditLog) -> Result<()> {
        let snapshot = |value: Option<serde_json::Value>| value.map(|v| v.to_string());

        let model = ActiveModel {
            user_id: Set(log.user_id),
            user_name: Set(log.user_name),
            action: Set(log.action.as_str().to_string()),
            entity: Set(log.entity.as_str().to_string()),
            entity_id: Set(log.entity_id),
            description: Set(Some(log.description)),
            old_data: Set(snapshot(log.old_data)),
            new_data: Set(snapshot(log.new_data)),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| db_error("Failed to write audit log", e))?;

        Ok(())
    }

    /// 分页列出审计日志（最新在前）
    pub async fn list_audit_logs_with_pagination_impl(
        &self,
        entity: Option<String>,
        pagination: PaginationQuery,
    ) -> Result<AuditLogListResponse> {
        let (page, size) = pagination.normalized();

        let mut select = AuditLogs::find();
        if let Some(entity) = entity.filter(|e| !e.trim().is_empty()) {
            select = select.filter(Column::Entity.eq(entity.trim()));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| db_error("Failed to count audit logs", e))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| db_error("Failed to count audit log pages", e))?;

        let logs = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| db_error("Failed to query audit logs", e))?;

        Ok(AuditLogListResponse {
            items: logs.into_iter().map(|m| m.into_audit_log()).collect(),
            pagination: pagination_info(page, size, total, pages),
        })
    }

    /// 某条记录的全部审计日志
    pub async fn list_audit_logs_for_entity_impl(
        &self,
        entity: &str,
        entity_id: i64,
    ) -> Result<Vec<AuditLog>> {
        let logs = AuditLogs::find()
            .filter(Column::Entity.eq(entity))
            .filter(Column::EntityId.eq(entity_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to query audit logs", e))?;

        Ok(logs.into_iter().map(|m| m.into_audit_log()).collect())
    }
}
