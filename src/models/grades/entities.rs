use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 及格线
pub const PASSING_SCORE: f64 = 70.0;

// 成绩
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "grade.ts")]
pub struct Grade {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub subject_name: Option<String>,
    pub score: f64,
    pub attendance: f64,
    pub period: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Grade {
    pub fn is_failing(&self) -> bool {
        self.score < PASSING_SCORE
    }
}

/// 扁平化的成绩记录（学生 + 科目 + 成绩），用于导出
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRecord {
    pub enrollment_id: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub given_names: String,
    pub program: String,
    pub semester: i32,
    pub subject: String,
    pub score: f64,
    pub attendance: f64,
    pub period: String,
}

impl GradeRecord {
    /// 全名：父姓 母姓 名，忽略空白部分
    pub fn full_name(&self) -> String {
        [
            self.paternal_surname.as_str(),
            self.maternal_surname.as_str(),
            self.given_names.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}
