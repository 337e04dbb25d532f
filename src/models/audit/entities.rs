use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 审计操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Import,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Import => "import",
        }
    }
}

// 被审计的实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEntity {
    Program,
    Student,
    Subject,
    Grade,
    RiskFactor,
    User,
}

impl AuditEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntity::Program => "program",
            AuditEntity::Student => "student",
            AuditEntity::Subject => "subject",
            AuditEntity::Grade => "grade",
            AuditEntity::RiskFactor => "risk_factor",
            AuditEntity::User => "user",
        }
    }
}

// 审计日志
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "audit.ts")]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i64>,
    pub description: Option<String>,
    #[ts(type = "unknown")]
    pub old_data: Option<serde_json::Value>,
    #[ts(type = "unknown")]
    pub new_data: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 写入审计日志所需数据
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub action: AuditAction,
    pub entity: AuditEntity,
    pub entity_id: Option<i64>,
    pub description: String,
    pub old_data: Option<serde_json::Value>,
    pub new_data: Option<serde_json::Value>,
}
