use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::grades::requests::CreateGradeRequest;
use crate::models::risk_factors::requests::CreateRiskFactorRequest;
use crate::models::students::requests::{
    CreateStudentRequest, StudentListParams, UpdateStudentRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::{GradeService, RiskFactorService, StudentService};
use crate::utils::SafeIDI64;

static STUDENT_SERVICE: Lazy<StudentService> = Lazy::new(StudentService::new_lazy);
static GRADE_SERVICE: Lazy<GradeService> = Lazy::new(GradeService::new_lazy);
static RISK_FACTOR_SERVICE: Lazy<RiskFactorService> = Lazy::new(RiskFactorService::new_lazy);

pub async fn list_students(
    req: HttpRequest,
    query: web::Query<StudentListParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_students(query.into_inner(), &req).await
}

pub async fn create_student(
    req: HttpRequest,
    body: web::Json<CreateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.create_student(body.into_inner(), &req).await
}

pub async fn get_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.get_student(student_id.0, &req).await
}

pub async fn update_student(
    req: HttpRequest,
    student_id: SafeIDI64,
    body: web::Json<UpdateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .update_student(student_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.delete_student(student_id.0, &req).await
}

pub async fn list_grades(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    GRADE_SERVICE.list_student_grades(student_id.0, &req).await
}

pub async fn create_grade(
    req: HttpRequest,
    student_id: SafeIDI64,
    body: web::Json<CreateGradeRequest>,
) -> ActixResult<HttpResponse> {
    GRADE_SERVICE
        .create_grade(student_id.0, body.into_inner(), &req)
        .await
}

pub async fn list_risk_factors(
    req: HttpRequest,
    student_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    RISK_FACTOR_SERVICE
        .list_risk_factors(student_id.0, &req)
        .await
}

pub async fn create_risk_factor(
    req: HttpRequest,
    student_id: SafeIDI64,
    body: web::Json<CreateRiskFactorRequest>,
) -> ActixResult<HttpResponse> {
    RISK_FACTOR_SERVICE
        .create_risk_factor(student_id.0, body.into_inner(), &req)
        .await
}

// 配置路由
pub fn configure_student_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/students")
            .wrap(middlewares::RequireRole::new_any(UserRole::all_roles()))
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_students))
            .route("", web::post().to(create_student))
            .route("/{id}", web::get().to(get_student))
            .route("/{id}", web::put().to(update_student))
            .route("/{id}", web::delete().to(delete_student))
            .route("/{id}/grades", web::get().to(list_grades))
            .route("/{id}/grades", web::post().to(create_grade))
            .route("/{id}/risk-factors", web::get().to(list_risk_factors))
            .route("/{id}/risk-factors", web::post().to(create_risk_factor)),
    );
}
