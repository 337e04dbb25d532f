use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 学生状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "student.ts")]
pub enum StudentStatus {
    Active,    // 在读
    Dropout,   // 辍学
    Graduated, // 毕业
}

impl StudentStatus {
    pub const ACTIVE: &'static str = "active";
    pub const DROPOUT: &'static str = "dropout";
    pub const GRADUATED: &'static str = "graduated";
}

impl<'de> Deserialize<'de> for StudentStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<StudentStatus>().map_err(|_| {
            serde::de::Error::custom(format!(
                "Invalid student status: '{s}'. Supported: active, dropout, graduated"
            ))
        })
    }
}

impl std::fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StudentStatus::Active => write!(f, "{}", StudentStatus::ACTIVE),
            StudentStatus::Dropout => write!(f, "{}", StudentStatus::DROPOUT),
            StudentStatus::Graduated => write!(f, "{}", StudentStatus::GRADUATED),
        }
    }
}

impl std::str::FromStr for StudentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            StudentStatus::ACTIVE => Ok(StudentStatus::Active),
            StudentStatus::DROPOUT => Ok(StudentStatus::Dropout),
            StudentStatus::GRADUATED => Ok(StudentStatus::Graduated),
            _ => Err(format!("Invalid student status: {s}")),
        }
    }
}

// 学生实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct Student {
    pub id: i64,
    /// 学号（matrícula）
    pub enrollment_id: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub given_names: String,
    pub gender: Option<String>,
    pub modality: Option<String>,
    /// 专业名称
    pub program: String,
    pub semester: i32,
    pub status: StudentStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Student {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            StudentStatus::Active,
            StudentStatus::Dropout,
            StudentStatus::Graduated,
        ] {
            assert_eq!(status.to_string().parse::<StudentStatus>().unwrap(), status);
        }
        assert!("baja".parse::<StudentStatus>().is_err());
    }

    #[test]
    fn test_full_name_skips_blank_parts() {
        let now = chrono::Utc::now();
        let student = Student {
            id: 1,
            enrollment_id: "A001".to_string(),
            paternal_surname: "García".to_string(),
            maternal_surname: " ".to_string(),
            given_names: "Ana María".to_string(),
            gender: None,
            modality: None,
            program: "Derecho".to_string(),
            semester: 1,
            status: StudentStatus::Active,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(student.full_name(), "García Ana María");
    }
}
