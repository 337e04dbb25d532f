use super::entities::StudentStatus;
use crate::models::common::PaginationQuery;
use crate::models::common::pagination::deserialize_optional_i64;
use serde::Deserialize;
use ts_rs::TS;

// 学生列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct StudentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub program_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub subject_id: Option<i64>,
    pub status: Option<StudentStatus>,
    pub search: Option<String>,
}

// 学生筛选条件（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// 专业名称
    pub program: Option<String>,
    /// 只保留在该科目有成绩的学生
    pub subject_id: Option<i64>,
    pub status: Option<StudentStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct CreateStudentRequest {
    pub enrollment_id: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub given_names: String,
    pub gender: Option<String>,
    pub modality: Option<String>,
    /// 教师创建时忽略，强制使用其所属专业
    pub program_id: Option<i64>,
    pub semester: i32,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct UpdateStudentRequest {
    pub enrollment_id: Option<String>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    pub given_names: Option<String>,
    pub gender: Option<String>,
    pub modality: Option<String>,
    pub program_id: Option<i64>,
    pub semester: Option<i32>,
    pub status: Option<StudentStatus>,
}

// 存储层使用的学生数据（专业已解析为名称）
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub enrollment_id: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub given_names: String,
    pub gender: Option<String>,
    pub modality: Option<String>,
    pub program: String,
    pub semester: i32,
    pub status: StudentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct StudentChanges {
    pub enrollment_id: Option<String>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    pub given_names: Option<String>,
    pub gender: Option<String>,
    pub modality: Option<String>,
    pub program: Option<String>,
    pub semester: Option<i32>,
    pub status: Option<StudentStatus>,
}
