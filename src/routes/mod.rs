pub mod audit_logs;
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

#[cfg(test)]
mod tests;

pub use audit_logs::configure_audit_log_routes;
pub use auth::configure_auth_routes;
pub use charts::configure_chart_routes;
pub use exports::configure_export_routes;
pub use grades::configure_grade_routes;
pub use imports::configure_import_routes;
pub use programs::configure_program_routes;
pub use risk_factors::configure_risk_factor_routes;
pub use students::configure_student_routes;
pub use subjects::configure_subject_routes;
pub use system::configure_system_routes;
pub use users::configure_user_routes;

use actix_web::web;

/// 注册全部 API 路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_program_routes)
        .configure(configure_student_routes)
        .configure(configure_subject_routes)
        .configure(configure_grade_routes)
        .configure(configure_risk_factor_routes)
        .configure(configure_audit_log_routes)
        .configure(configure_import_routes)
        .configure(configure_export_routes)
        .configure(configure_chart_routes)
        .configure(configure_system_routes);
}
