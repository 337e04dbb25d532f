use serde::Serialize;
use ts_rs::TS;

// 行级错误
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "import.ts")]
pub struct ImportRowError {
    pub row: usize,
    pub field: String,
    pub message: String,
}

// 导入结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "import.ts")]
pub struct GradeImportResponse {
    pub total: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub students_created: usize,
    pub subjects_created: usize,
    pub errors: Vec<ImportRowError>,
}
