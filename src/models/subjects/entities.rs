use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 科目（materia）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "subject.ts")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub semester: i32,
    /// 为空表示公共科目
    pub program_id: Option<i64>,
}
