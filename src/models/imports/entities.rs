/// 必需列
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "matricula",
    "carrera",
    "semestre",
    "materia",
    "nota",
    "asistencia",
    "periodo",
];

/// 完整列顺序（模板与成绩导出共用）
pub const FULL_COLUMNS: [&str; 11] = [
    "matricula",
    "nombre",
    "apellido_paterno",
    "apellido_materno",
    "nombres",
    "carrera",
    "semestre",
    "materia",
    "nota",
    "asistencia",
    "periodo",
];

pub const MISSING_SURNAME: &str = "Sin apellido";
pub const MISSING_GIVEN_NAMES: &str = "Sin nombre";

/// 校验通过的一行成绩数据
#[derive(Debug, Clone, PartialEq)]
pub struct GradeImportRow {
    /// 表格中的行号（从 1 开始，含表头）
    pub row_num: usize,
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

/// 写库结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeImportOutcome {
    pub imported: usize,
    pub duplicates: usize,
    pub students_created: usize,
    pub subjects_created: usize,
}
