//! 审计日志实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub old_data: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub new_data: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_audit_log(self) -> crate::models::audit::entities::AuditLog {
        // 快照以 JSON 文本存储，解析失败时原样返回字符串
        let parse = |raw: Option<String>| {
            raw.map(|s| serde_json::from_str(&s).unwrap_or(serde_json::Value::String(s)))
        };

        crate::models::audit::entities::AuditLog {
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            action: self.action,
            entity: self.entity,
            entity_id: self.entity_id,
            description: self.description,
            old_data: parse(self.old_data),
            new_data: parse(self.new_data),
            created_at: super::timestamp_to_datetime(self.created_at),
        }
    }
}
