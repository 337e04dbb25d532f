//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod audit_logs;
mod charts;
mod grades;
mod imports;
mod programs;
mod risk_factors;
mod students;
mod subjects;
mod users;

#[cfg(test)]
mod tests;

use crate::config::AppConfig;
use crate::errors::{EduStatsError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

use crate::models::PaginationInfo;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(&config.database.url, config.database.pool_size).await
    }

    /// 连接指定 URL 并运行迁移
    pub async fn connect(url: &str, pool_size: u32) -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, config.database.timeout).await?
        } else {
            Self::connect_generic(&db_url, pool_size, config.database.timeout).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| EduStatsError::database_operation(format!("Database migration failed: {e}")))?;

        info!("SeaORM storage initialized, database: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| EduStatsError::database_config(format!("Failed to parse SQLite URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        // 内存数据库只存在于单个连接中，连接不能被回收
        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { pool_size })
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout((!in_memory).then(|| Duration::from_secs(300)))
            .max_lifetime((!in_memory).then(|| Duration::from_secs(1800)))
            .connect_with(opt)
            .await
            .map_err(|e| EduStatsError::database_connection(format!("SQLite connection failed: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(pool_size.min(5))
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| EduStatsError::database_connection(format!("Unable to connect to database: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(EduStatsError::database_config(format!(
                "Cannot infer database type from URL: {url}. Supported: sqlite://, postgres://, mysql://, or a .db/.sqlite file path"
            )))
        }
    }
}

/// 将数据库错误转换为业务错误，唯一约束冲突单独归类
pub(crate) fn db_error(context: &str, err: DbErr) -> EduStatsError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        EduStatsError::conflict(format!("{context}: {err}"))
    } else {
        EduStatsError::database_operation(format!("{context}: {err}"))
    }
}

/// 分页元信息
pub(crate) fn pagination_info(page: u64, size: u64, total: u64, pages: u64) -> PaginationInfo {
    PaginationInfo {
        page: page as i64,
        page_size: size as i64,
        total: total as i64,
        total_pages: pages as i64,
    }
}

// Storage trait 实现
use crate::models::{
    AccessScope, PaginationQuery,
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
use crate::storage::{Storage, StudentCounts};
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users_by_role(&self, role: UserRole) -> Result<u64> {
        self.count_users_by_role_impl(role).await
    }

    // 专业模块
    async fn create_program(&self, req: CreateProgramRequest) -> Result<Program> {
        self.create_program_impl(req).await
    }

    async fn get_program_by_id(&self, id: i64) -> Result<Option<Program>> {
        self.get_program_by_id_impl(id).await
    }

    async fn get_program_by_name(&self, name: &str) -> Result<Option<Program>> {
        self.get_program_by_name_impl(name).await
    }

    async fn find_conflicting_program(
        &self,
        name: &str,
        code: Option<&str>,
        exclude_id: Option<i64>,
    ) -> Result<Option<Program>> {
        self.find_conflicting_program_impl(name, code, exclude_id)
            .await
    }

    async fn list_programs(&self) -> Result<Vec<Program>> {
        self.list_programs_impl().await
    }

    async fn update_program(
        &self,
        id: i64,
        update: UpdateProgramRequest,
    ) -> Result<Option<Program>> {
        self.update_program_impl(id, update).await
    }

    async fn delete_program(&self, id: i64) -> Result<bool> {
        self.delete_program_impl(id).await
    }

    // 学生模块
    async fn create_student(&self, student: NewStudent) -> Result<Student> {
        self.create_student_impl(student).await
    }

    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(id).await
    }

    async fn get_student_by_enrollment_id(&self, enrollment_id: &str) -> Result<Option<Student>> {
        self.get_student_by_enrollment_id_impl(enrollment_id).await
    }

    async fn list_students_with_pagination(
        &self,
        scope: &AccessScope,
        filter: StudentFilter,
        pagination: PaginationQuery,
    ) -> Result<StudentListResponse> {
        self.list_students_with_pagination_impl(scope, filter, pagination)
            .await
    }

    async fn list_students(
        &self,
        scope: &AccessScope,
        filter: StudentFilter,
    ) -> Result<Vec<Student>> {
        self.list_students_impl(scope, filter).await
    }

    async fn update_student(&self, id: i64, changes: StudentChanges) -> Result<Option<Student>> {
        self.update_student_impl(id, changes).await
    }

    async fn delete_student(&self, id: i64) -> Result<bool> {
        self.delete_student_impl(id).await
    }

    // 风险因素模块
    async fn create_risk_factor(
        &self,
        student_id: i64,
        req: CreateRiskFactorRequest,
    ) -> Result<RiskFactor> {
        self.create_risk_factor_impl(student_id, req).await
    }

    async fn get_risk_factor_by_id(&self, id: i64) -> Result<Option<RiskFactor>> {
        self.get_risk_factor_by_id_impl(id).await
    }

    async fn list_risk_factors_by_student(&self, student_id: i64) -> Result<Vec<RiskFactor>> {
        self.list_risk_factors_by_student_impl(student_id).await
    }

    async fn count_risk_factors_by_student(&self, student_id: i64) -> Result<u64> {
        self.count_risk_factors_by_student_impl(student_id).await
    }

    async fn update_risk_factor(
        &self,
        id: i64,
        update: UpdateRiskFactorRequest,
    ) -> Result<Option<RiskFactor>> {
        self.update_risk_factor_impl(id, update).await
    }

    async fn delete_risk_factor(&self, id: i64) -> Result<bool> {
        self.delete_risk_factor_impl(id).await
    }

    // 科目模块
    async fn create_subject(&self, req: CreateSubjectRequest) -> Result<Subject> {
        self.create_subject_impl(req).await
    }

    async fn get_subject_by_id(&self, id: i64) -> Result<Option<Subject>> {
        self.get_subject_by_id_impl(id).await
    }

    async fn find_subject(&self, name: &str, program_id: Option<i64>) -> Result<Option<Subject>> {
        self.find_subject_impl(name, program_id).await
    }

    async fn list_subjects_with_pagination(
        &self,
        scope: &AccessScope,
        search: Option<String>,
        pagination: PaginationQuery,
    ) -> Result<SubjectListResponse> {
        self.list_subjects_with_pagination_impl(scope, search, pagination)
            .await
    }

    async fn list_subjects_for_program(&self, program_id: Option<i64>) -> Result<Vec<Subject>> {
        self.list_subjects_for_program_impl(program_id).await
    }

    async fn update_subject(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>> {
        self.update_subject_impl(id, update).await
    }

    async fn delete_subject(&self, id: i64) -> Result<bool> {
        self.delete_subject_impl(id).await
    }

    // 成绩模块
    async fn create_grade(&self, student_id: i64, req: CreateGradeRequest) -> Result<Grade> {
        self.create_grade_impl(student_id, req).await
    }

    async fn get_grade_by_id(&self, id: i64) -> Result<Option<Grade>> {
        self.get_grade_by_id_impl(id).await
    }

    async fn find_grade(
        &self,
        student_id: i64,
        subject_id: i64,
        period: &str,
    ) -> Result<Option<Grade>> {
        self.find_grade_impl(student_id, subject_id, period).await
    }

    async fn list_grades_by_student(&self, student_id: i64) -> Result<Vec<Grade>> {
        self.list_grades_by_student_impl(student_id).await
    }

    async fn update_grade(&self, id: i64, update: UpdateGradeRequest) -> Result<Option<Grade>> {
        self.update_grade_impl(id, update).await
    }

    async fn delete_grade(&self, id: i64) -> Result<bool> {
        self.delete_grade_impl(id).await
    }

    async fn list_grade_records(
        &self,
        scope: &AccessScope,
        filter: GradeRecordFilter,
    ) -> Result<Vec<GradeRecord>> {
        self.list_grade_records_impl(scope, filter).await
    }

    // 导入模块
    async fn import_grade_rows(&self, rows: Vec<GradeImportRow>) -> Result<GradeImportOutcome> {
        self.import_grade_rows_impl(rows).await
    }

    // 审计模块
    async fn create_audit_log(&self, log: NewAuditLog) -> Result<()> {
        self.create_audit_log_impl(log).await
    }

    async fn list_audit_logs_with_pagination(
        &self,
        entity: Option<String>,
        pagination: PaginationQuery,
    ) -> Result<AuditLogListResponse> {
        self.list_audit_logs_with_pagination_impl(entity, pagination)
            .await
    }

    async fn list_audit_logs_for_entity(
        &self,
        entity: &str,
        entity_id: i64,
    ) -> Result<Vec<AuditLog>> {
        self.list_audit_logs_for_entity_impl(entity, entity_id).await
    }

    // 图表模块
    async fn count_students(&self, scope: &AccessScope) -> Result<StudentCounts> {
        self.count_students_impl(scope).await
    }

    async fn list_score_attendance(&self, scope: &AccessScope) -> Result<Vec<(f64, f64)>> {
        self.list_score_attendance_impl(scope).await
    }

    async fn list_risk_factor_kinds(
        &self,
        scope: &AccessScope,
        dropout_only: bool,
        semester: Option<i32>,
    ) -> Result<Vec<String>> {
        self.list_risk_factor_kinds_impl(scope, dropout_only, semester)
            .await
    }

    async fn list_dropout_semesters(&self, scope: &AccessScope) -> Result<Vec<i32>> {
        self.list_dropout_semesters_impl(scope).await
    }
}
