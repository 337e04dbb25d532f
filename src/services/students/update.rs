use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{
    StudentService, invalid, load_student, permission_denied, resolve_program_name,
    validate_semester,
};
use crate::errors::EduStatsError;
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::students::entities::StudentStatus;
use crate::models::students::requests::{StudentChanges, UpdateStudentRequest};
use crate::models::students::responses::StudentUpdateResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};
use crate::utils::validate::require_text;

fn required(field: &str, value: Option<String>) -> Result<Option<String>, HttpResponse> {
    value
        .map(|v| require_text(field, &v))
        .transpose()
        .map_err(invalid)
}

pub async fn update_student(
    service: &StudentService,
    student_id: i64,
    update: UpdateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let existing = match load_student(&storage, &scope, student_id).await {
        Ok(student) => student,
        Err(response) => return Ok(response),
    };

    let enrollment_id = match required("enrollment_id", update.enrollment_id) {
        Ok(value) => value,
        Err(response) => return Ok(response),
    };
    let paternal_surname = match required("paternal_surname", update.paternal_surname) {
        Ok(value) => value,
        Err(response) => return Ok(response),
    };
    let maternal_surname = match required("maternal_surname", update.maternal_surname) {
        Ok(value) => value,
        Err(response) => return Ok(response),
    };
    let given_names = match required("given_names", update.given_names) {
        Ok(value) => value,
        Err(response) => return Ok(response),
    };

    if let Some(semester) = update.semester
        && let Err(response) = validate_semester(semester)
    {
        return Ok(response);
    }

    // 教师不能把学生转到其他专业
    let program = match update.program_id {
        Some(program_id) if !scope.is_all() && scope.program_id() != Some(program_id) => {
            return Ok(permission_denied());
        }
        Some(program_id) => match resolve_program_name(&storage, program_id).await {
            Ok(name) => Some(name),
            Err(response) => return Ok(response),
        },
        None => None,
    };

    if let Some(ref enrollment_id) = enrollment_id
        && *enrollment_id != existing.enrollment_id
    {
        match storage.get_student_by_enrollment_id(enrollment_id).await {
            Ok(Some(other)) if other.id != student_id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::StudentAlreadyExists,
                    "Enrollment id already exists",
                )));
            }
            Ok(_) => {}
            Err(e) => {
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        format!("Failed to check enrollment id: {e}"),
                    )),
                );
            }
        }
    }

    // 空串表示清除性别、修读方式
    let changes = StudentChanges {
        enrollment_id,
        paternal_surname,
        maternal_surname,
        given_names,
        gender: update.gender.map(|v| v.trim().to_string()),
        modality: update.modality.map(|v| v.trim().to_string()),
        program,
        semester: update.semester,
        status: update.status,
    };

    let student = match storage.update_student(student_id, changes).await {
        Ok(Some(student)) => student,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(EduStatsError::Conflict(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::StudentAlreadyExists,
                "Enrollment id already exists",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Student update failed: {e}"),
                )),
            );
        }
    };

    let requires_risk_factor = if student.status == StudentStatus::Dropout {
        match storage.count_risk_factors_by_student(student.id).await {
            Ok(count) => count == 0,
            Err(e) => {
                tracing::warn!("Failed to count risk factors for {}: {}", student.id, e);
                false
            }
        }
    } else {
        false
    };

    record(
        &storage,
        request,
        AuditEntry::new(
            AuditAction::Update,
            AuditEntity::Student,
            Some(student.id),
            format!("Updated student {}", student.enrollment_id),
        )
        .old(&existing)
        .new_data(&student),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StudentUpdateResponse {
            student,
            requires_risk_factor,
        },
        "Student updated",
    )))
}
