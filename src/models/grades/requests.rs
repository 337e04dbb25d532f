use crate::models::common::pagination::deserialize_optional_i64;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct CreateGradeRequest {
    pub subject_id: i64,
    pub score: f64,
    pub attendance: f64,
    pub period: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct UpdateGradeRequest {
    pub subject_id: Option<i64>,
    pub score: Option<f64>,
    pub attendance: Option<f64>,
    pub period: Option<String>,
}

// 成绩记录筛选（导出）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradeRecordFilter {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub program_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub subject_id: Option<i64>,
    pub period: Option<String>,
    /// 由 program_id 解析出的专业名称
    #[serde(skip)]
    pub program: Option<String>,
}
