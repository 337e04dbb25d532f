use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{
    StudentService, invalid, optional_text, permission_denied, resolve_program_name,
    validate_semester,
};
use crate::errors::EduStatsError;
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::students::entities::StudentStatus;
use crate::models::students::requests::{CreateStudentRequest, NewStudent};
use crate::models::students::responses::StudentResponse;
use crate::models::{AccessScope, ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};
use crate::utils::validate::require_text;

type NameFields = (String, String, String, String);

fn required_fields(req: &CreateStudentRequest) -> Result<NameFields, String> {
    Ok((
        require_text("enrollment_id", &req.enrollment_id)?,
        require_text("paternal_surname", &req.paternal_surname)?,
        require_text("maternal_surname", &req.maternal_surname)?,
        require_text("given_names", &req.given_names)?,
    ))
}

pub async fn create_student(
    service: &StudentService,
    req: CreateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let (enrollment_id, paternal_surname, maternal_surname, given_names) =
        match required_fields(&req) {
            Ok(fields) => fields,
            Err(msg) => return Ok(invalid(msg)),
        };

    if let Err(response) = validate_semester(req.semester) {
        return Ok(response);
    }

    // 教师只能在本专业下创建学生
    let program = match &scope {
        AccessScope::Program { name, .. } => name.clone(),
        AccessScope::Nothing => return Ok(permission_denied()),
        AccessScope::All => {
            let Some(program_id) = req.program_id else {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::ProgramInvalid,
                    "program_id is required",
                )));
            };
            match resolve_program_name(&storage, program_id).await {
                Ok(name) => name,
                Err(response) => return Ok(response),
            }
        }
    };

    match storage.get_student_by_enrollment_id(&enrollment_id).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::StudentAlreadyExists,
                "Enrollment id already exists",
            )));
        }
        Ok(None) => {}
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to check enrollment id: {e}"),
                )),
            );
        }
    }

    let new_student = NewStudent {
        enrollment_id,
        paternal_surname,
        maternal_surname,
        given_names,
        gender: optional_text(req.gender),
        modality: optional_text(req.modality),
        program,
        semester: req.semester,
        status: StudentStatus::Active,
    };

    match storage.create_student(new_student).await {
        Ok(student) => {
            info!("Student created: {} ({})", student.enrollment_id, student.id);
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Create,
                    AuditEntity::Student,
                    Some(student.id),
                    format!("Created student {}", student.enrollment_id),
                )
                .new_data(&student),
            )
            .await;
            Ok(HttpResponse::Created().json(ApiResponse::success(
                StudentResponse { student },
                "Student created",
            )))
        }
        Err(EduStatsError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(
                ErrorCode::StudentAlreadyExists,
                "Enrollment id already exists",
            ),
        )),
        Err(e) => {
            error!("Student creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Student creation failed: {e}"),
                )),
            )
        }
    }
}
