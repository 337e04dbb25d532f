use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 专业（carrera）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "program.ts")]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
