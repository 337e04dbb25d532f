/// 数据可见范围
///
/// 管理员可见全部数据；教师只能看到本专业的学生、本专业及公共科目。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    All,
    Program { id: i64, name: String },
    /// 未绑定专业的教师
    Nothing,
}

impl AccessScope {
    pub fn is_all(&self) -> bool {
        matches!(self, AccessScope::All)
    }

    pub fn program_id(&self) -> Option<i64> {
        match self {
            AccessScope::Program { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// 学生所属专业（名称）是否在范围内
    pub fn allows_program_name(&self, program: &str) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::Program { name, .. } => name == program,
            AccessScope::Nothing => false,
        }
    }

    /// 科目是否可见：本专业或公共科目
    pub fn allows_subject_program(&self, subject_program_id: Option<i64>) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::Program { id, .. } => {
                subject_program_id.is_none() || subject_program_id == Some(*id)
            }
            AccessScope::Nothing => false,
        }
    }

    /// 科目是否可被修改：教师不能修改公共科目或其他专业的科目
    pub fn can_modify_subject(&self, subject_program_id: Option<i64>) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::Program { id, .. } => subject_program_id == Some(*id),
            AccessScope::Nothing => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teacher() -> AccessScope {
        AccessScope::Program {
            id: 3,
            name: "Ingeniería en Sistemas".to_string(),
        }
    }

    #[test]
    fn test_program_name_scope() {
        assert!(AccessScope::All.allows_program_name("Derecho"));
        assert!(teacher().allows_program_name("Ingeniería en Sistemas"));
        assert!(!teacher().allows_program_name("Derecho"));
        assert!(!AccessScope::Nothing.allows_program_name("Derecho"));
    }

    #[test]
    fn test_subject_scope() {
        assert!(teacher().allows_subject_program(None));
        assert!(teacher().allows_subject_program(Some(3)));
        assert!(!teacher().allows_subject_program(Some(4)));
        assert!(!teacher().can_modify_subject(None));
        assert!(teacher().can_modify_subject(Some(3)));
        assert!(AccessScope::All.can_modify_subject(None));
    }
}
