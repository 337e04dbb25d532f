//! 数据模型定义
//!
//! 请求、响应与业务实体，全部导出 TypeScript 类型。

pub mod audit;
pub mod auth;
pub mod charts;
pub mod common;
pub mod grades;
pub mod imports;
pub mod programs;
pub mod risk_factors;
pub mod students;
pub mod subjects;
pub mod system;
pub mod users;

pub use common::{AccessScope, ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 统一业务错误码
///
/// 0 表示成功；通用错误沿用 HTTP 状态码；其余按业务域分段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    Conflict = 409,
    PayloadTooLarge = 413,
    RateLimitExceeded = 429,
    InternalServerError = 500,

    // 认证 1xxx
    AuthFailed = 1000,
    RegisterFailed = 1001,
    TokenInvalid = 1002,
    RefreshTokenMissing = 1003,
    AdminRegistrationClosed = 1004,

    // 用户 2xxx
    UserNotFound = 2000,
    UserAlreadyExists = 2001,
    UserEmailInvalid = 2002,
    UserPasswordInvalid = 2003,
    UserNameInvalid = 2004,
    UserCreationFailed = 2005,
    UserUpdateFailed = 2006,
    UserDeleteFailed = 2007,
    CanNotDeleteCurrentUser = 2008,

    // 专业 3xxx
    ProgramNotFound = 3000,
    ProgramAlreadyExists = 3001,
    ProgramInvalid = 3002,

    // 学生 4xxx
    StudentNotFound = 4000,
    StudentAlreadyExists = 4001,
    StudentInvalid = 4002,
    StudentPermissionDenied = 4003,

    // 科目 5xxx
    SubjectNotFound = 5000,
    SubjectAlreadyExists = 5001,
    SubjectInvalid = 5002,
    SubjectPermissionDenied = 5003,

    // 成绩 6xxx
    GradeNotFound = 6000,
    GradeAlreadyExists = 6001,
    GradeInvalid = 6002,
    GradeSubjectNotAllowed = 6003,

    // 风险因素 7xxx
    RiskFactorNotFound = 7000,
    RiskFactorAlreadyExists = 7001,
    RiskFactorInvalid = 7002,
    StudentNotDropout = 7003,

    // 导入导出 8xxx
    ImportFileMissing = 8000,
    ImportFileTypeNotAllowed = 8001,
    ImportFileParseFailed = 8002,
    ImportFileMissingColumn = 8003,
    ImportTooManyRows = 8004,
    ExportNoData = 8005,
    ExportFailed = 8006,

    // 图表 9xxx
    ChartTypeInvalid = 9000,
    ChartRenderFailed = 9001,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success as i32, 0);
        assert_eq!(ErrorCode::Unauthorized as i32, 401);
        assert_eq!(ErrorCode::GradeAlreadyExists as i32, 6001);
        assert_eq!(ErrorCode::ImportFileMissingColumn as i32, 8003);
    }
}
