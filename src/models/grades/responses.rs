use super::entities::Grade;
use crate::models::subjects::entities::Subject;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct GradeResponse {
    pub grade: Grade,
}

// 学生成绩与可选科目
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct StudentGradesResponse {
    pub items: Vec<Grade>,
    pub available_subjects: Vec<Subject>,
}
