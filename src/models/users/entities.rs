use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::AccessScope;

// 用户角色
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "user.ts")]
pub enum UserRole {
    Teacher, // 教师
    Admin,   // 管理员
}

impl UserRole {
    pub const TEACHER: &'static str = "teacher";
    pub const ADMIN: &'static str = "admin";

    pub fn admin_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin]
    }
    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Teacher, &Self::Admin]
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<UserRole>().map_err(|_| {
            serde::de::Error::custom(format!("Invalid user role: '{s}'. Supported roles: teacher, admin"))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Teacher => write!(f, "{}", UserRole::TEACHER),
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::TEACHER => Ok(UserRole::Teacher),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub display_name: String,
    pub role: UserRole,
    pub program_id: Option<i64>,
    pub program_name: Option<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// 当前用户的数据可见范围
    pub fn scope(&self) -> AccessScope {
        if self.is_admin() {
            return AccessScope::All;
        }
        match (self.program_id, &self.program_name) {
            (Some(id), Some(name)) => AccessScope::Program {
                id,
                name: name.clone(),
            },
            _ => AccessScope::Nothing,
        }
    }

    // 生成 token 对（access + refresh）
    pub fn generate_token_pair(
        &self,
        refresh_token_expiry: Option<chrono::TimeDelta>,
    ) -> Result<crate::utils::jwt::TokenPair, String> {
        crate::utils::jwt::JwtUtils::generate_token_pair(
            self.id,
            &self.role.to_string(),
            refresh_token_expiry,
        )
        .map_err(|e| format!("Failed to generate token pair: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole, program: Option<(i64, &str)>) -> User {
        let now = chrono::Utc::now();
        User {
            id: 1,
            email: "t@uni.mx".to_string(),
            password_hash: String::new(),
            display_name: "T".to_string(),
            role,
            program_id: program.map(|p| p.0),
            program_name: program.map(|p| p.1.to_string()),
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_scope_by_role() {
        assert_eq!(user(UserRole::Admin, None).scope(), AccessScope::All);
        assert_eq!(
            user(UserRole::Teacher, Some((2, "Derecho"))).scope(),
            AccessScope::Program {
                id: 2,
                name: "Derecho".to_string()
            }
        );
        assert_eq!(user(UserRole::Teacher, None).scope(), AccessScope::Nothing);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("student".parse::<UserRole>().is_err());
        assert!(serde_json::from_str::<UserRole>("\"user\"").is_err());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let mut u = user(UserRole::Teacher, None);
        u.password_hash = "secret".to_string();
        let json = serde_json::to_string(&u).unwrap();
        assert!(!json.contains("secret"));
    }
}
