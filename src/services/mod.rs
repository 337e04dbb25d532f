pub mod audit;
pub mod auth;
pub mod charts;
pub mod exports;
pub mod grades;
pub mod imports;
pub mod programs;
pub mod risk_factors;
pub mod students;
pub mod subjects;
pub mod system;
pub mod users;

pub use audit::AuditService;
pub use auth::AuthService;
pub use charts::ChartService;
pub use exports::ExportService;
pub use grades::GradeService;
pub use imports::ImportService;
pub use programs::ProgramService;
pub use risk_factors::RiskFactorService;
pub use students::StudentService;
pub use subjects::SubjectService;
pub use system::SystemService;
pub use users::UserService;
