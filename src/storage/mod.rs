use std::sync::Arc;

use crate::models::{
    AccessScope,
    audit::{
        entities::{AuditLog, NewAuditLog},
        responses::AuditLogListResponse,
    },
    grades::{
        entities::{Grade, GradeRecord},
        requests::{CreateGradeRequest, GradeRecordFilter, UpdateGradeRequest},
    },
    imports::entities::{GradeImportOutcome, GradeImportRow},
    programs::{
        entities::Program,
        requests::{CreateProgramRequest, UpdateProgramRequest},
    },
    risk_factors::{
        entities::RiskFactor,
        requests::{CreateRiskFactorRequest, UpdateRiskFactorRequest},
    },
    students::{
        entities::Student,
        requests::{NewStudent, StudentChanges, StudentFilter},
        responses::StudentListResponse,
    },
    subjects::{
        entities::Subject,
        requests::{CreateSubjectRequest, UpdateSubjectRequest},
        responses::SubjectListResponse,
    },
    users::{
        entities::{User, UserRole},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::models::common::PaginationQuery;

use crate::errors::Result;

pub mod sea_orm_storage;

/// 图表使用的学生计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudentCounts {
    pub total: u64,
    pub dropouts: u64,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（密码已哈希）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息（密码已哈希）
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计指定角色的用户数
    async fn count_users_by_role(&self, role: UserRole) -> Result<u64>;

    /// 专业管理方法
    async fn create_program(&self, req: CreateProgramRequest) -> Result<Program>;
    async fn get_program_by_id(&self, id: i64) -> Result<Option<Program>>;
    // 学生以专业名称关联，按名称反查专业
    async fn get_program_by_name(&self, name: &str) -> Result<Option<Program>>;
    // 按名称或代码查找冲突的专业（排除 exclude_id）
    async fn find_conflicting_program(
        &self,
        name: &str,
        code: Option<&str>,
        exclude_id: Option<i64>,
    ) -> Result<Option<Program>>;
    async fn list_programs(&self) -> Result<Vec<Program>>;
    // 更新专业，改名时同步学生的专业名称
    async fn update_program(&self, id: i64, update: UpdateProgramRequest)
    -> Result<Option<Program>>;
    async fn delete_program(&self, id: i64) -> Result<bool>;

    /// 学生管理方法
    async fn create_student(&self, student: NewStudent) -> Result<Student>;
    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>>;
    async fn get_student_by_enrollment_id(&self, enrollment_id: &str) -> Result<Option<Student>>;
    async fn list_students_with_pagination(
        &self,
        scope: &AccessScope,
        filter: StudentFilter,
        pagination: PaginationQuery,
    ) -> Result<StudentListResponse>;
    // 不分页，用于导出
    async fn list_students(&self, scope: &AccessScope, filter: StudentFilter)
    -> Result<Vec<Student>>;
    async fn update_student(&self, id: i64, changes: StudentChanges) -> Result<Option<Student>>;
    // 删除学生（级联删除成绩和风险因素）
    async fn delete_student(&self, id: i64) -> Result<bool>;

    /// 风险因素管理方法
    async fn create_risk_factor(
        &self,
        student_id: i64,
        req: CreateRiskFactorRequest,
    ) -> Result<RiskFactor>;
    async fn get_risk_factor_by_id(&self, id: i64) -> Result<Option<RiskFactor>>;
    async fn list_risk_factors_by_student(&self, student_id: i64) -> Result<Vec<RiskFactor>>;
    async fn count_risk_factors_by_student(&self, student_id: i64) -> Result<u64>;
    async fn update_risk_factor(
        &self,
        id: i64,
        update: UpdateRiskFactorRequest,
    ) -> Result<Option<RiskFactor>>;
    async fn delete_risk_factor(&self, id: i64) -> Result<bool>;

    /// 科目管理方法
    async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject>;
    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>>;
    // 在 (name, program_id) 桶内查找科目，program_id 为空表示公共科目
    async fn find_subject(&self, name: &str, program_id: Option<i64>) -> Result<Option<Subject>>;
    async fn list_subjects_with_pagination(
        &self,
        scope: &AccessScope,
        search: Option<String>,
        pagination: PaginationQuery,
    ) -> Result<SubjectListResponse>;
    // 某专业可用的科目：本专业科目与公共科目
    async fn list_subjects_for_program(&self, program_id: Option<i64>) -> Result<Vec<Subject>>;
    async fn update_subject(&self, id: i64, update: UpdateSubjectRequest)
    -> Result<Option<Subject>>;
    async fn delete_subject(&self, id: i64) -> Result<bool>;

    /// 成绩管理方法
    async fn create_grade(&self, student_id: i64, req: CreateGradeRequest) -> Result<Grade>;
    async fn get_grade_by_id(&self, id: i64) -> Result<Option<Grade>>;
    async fn find_grade(
        &self,
        student_id: i64,
        subject_id: i64,
        period: &str,
    ) -> Result<Option<Grade>>;
    async fn list_grades_by_student(&self, student_id: i64) -> Result<Vec<Grade>>;
    async fn update_grade(&self, id: i64, update: UpdateGradeRequest) -> Result<Option<Grade>>;
    async fn delete_grade(&self, id: i64) -> Result<bool>;
    // 扁平化的成绩记录，用于导出
    async fn list_grade_records(
        &self,
        scope: &AccessScope,
        filter: GradeRecordFilter,
    ) -> Result<Vec<GradeRecord>>;

    /// 导入：在单个事务中写入校验通过的行
    async fn import_grade_rows(&self, rows: Vec<GradeImportRow>) -> Result<GradeImportOutcome>;

    /// 审计日志方法
    async fn create_audit_log(&self, log: NewAuditLog) -> Result<()>;
    async fn list_audit_logs_with_pagination(
        &self,
        entity: Option<String>,
        pagination: PaginationQuery,
    ) -> Result<AuditLogListResponse>;
    async fn list_audit_logs_for_entity(&self, entity: &str, entity_id: i64)
    -> Result<Vec<AuditLog>>;

    /// 图表数据方法
    async fn count_students(&self, scope: &AccessScope) -> Result<StudentCounts>;
    // (score, attendance) 对
    async fn list_score_attendance(&self, scope: &AccessScope) -> Result<Vec<(f64, f64)>>;
    // 风险因素类别列表（每条因素一项），可只统计辍学学生或某学期
    async fn list_risk_factor_kinds(
        &self,
        scope: &AccessScope,
        dropout_only: bool,
        semester: Option<i32>,
    ) -> Result<Vec<String>>;
    // 存在辍学学生的学期（升序去重）
    async fn list_dropout_semesters(&self, scope: &AccessScope) -> Result<Vec<i32>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
