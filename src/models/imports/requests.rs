use crate::models::common::pagination::deserialize_optional_i64;
use serde::Deserialize;
use ts_rs::TS;

// 文件格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "import.ts")]
pub enum FileFormat {
    #[default]
    Csv,
    Xlsx,
}

// 模板 / 导出格式参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "import.ts")]
pub struct FormatQuery {
    #[serde(default)]
    pub format: FileFormat,
}

// 学生导出参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "import.ts")]
pub struct StudentExportParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub program_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub format: FileFormat,
}

// 成绩导出参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "import.ts")]
pub struct GradeExportParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub program_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub subject_id: Option<i64>,
    pub period: Option<String>,
    #[serde(default)]
    pub format: FileFormat,
}
