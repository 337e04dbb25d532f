use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{GradeService, internal_error, student_program_id};
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, grades::responses::StudentGradesResponse};
use crate::services::students::load_student;

pub async fn list_student_grades(
    service: &GradeService,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let student = match load_student(&storage, &scope, student_id).await {
        Ok(student) => student,
        Err(response) => return Ok(response),
    };

    let items = match storage.list_grades_by_student(student_id).await {
        Ok(items) => items,
        Err(e) => return Ok(internal_error("Failed to retrieve grades", e)),
    };

    let program_id = match student_program_id(&storage, &student).await {
        Ok(program_id) => program_id,
        Err(response) => return Ok(response),
    };
    let available_subjects = match storage.list_subjects_for_program(program_id).await {
        Ok(subjects) => subjects,
        Err(e) => return Ok(internal_error("Failed to retrieve subjects", e)),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StudentGradesResponse {
            items,
            available_subjects,
        },
        "Grades retrieved successfully",
    )))
}
