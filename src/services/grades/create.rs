use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{
    GradeService, already_exists, ensure_unique, internal_error, invalid, load_allowed_subject,
    validate_scores,
};
use crate::errors::EduStatsError;
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::grades::requests::CreateGradeRequest;
use crate::models::grades::responses::GradeResponse;
use crate::models::ApiResponse;
use crate::services::audit::{AuditEntry, record};
use crate::services::students::load_student;
use crate::utils::validate::require_text;

pub async fn create_grade(
    service: &GradeService,
    student_id: i64,
    req: CreateGradeRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let student = match load_student(&storage, &scope, student_id).await {
        Ok(student) => student,
        Err(response) => return Ok(response),
    };

    if let Err(msg) = validate_scores(Some(req.score), Some(req.attendance)) {
        return Ok(invalid(msg));
    }
    let period = match require_text("period", &req.period) {
        Ok(period) => period,
        Err(msg) => return Ok(invalid(msg)),
    };

    let subject = match load_allowed_subject(&storage, &student, req.subject_id).await {
        Ok(subject) => subject,
        Err(response) => return Ok(response),
    };

    if let Err(response) = ensure_unique(&storage, student.id, subject.id, &period, None).await {
        return Ok(response);
    }

    let req = CreateGradeRequest {
        subject_id: subject.id,
        score: req.score,
        attendance: req.attendance,
        period,
    };

    match storage.create_grade(student.id, req).await {
        Ok(grade) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Create,
                    AuditEntity::Grade,
                    Some(grade.id),
                    format!(
                        "Recorded grade of student {} in {} ({})",
                        student.enrollment_id, subject.name, grade.period
                    ),
                )
                .new_data(&grade),
            )
            .await;
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(GradeResponse { grade }, "Grade recorded")))
        }
        Err(EduStatsError::Conflict(_)) => Ok(already_exists()),
        Err(e) => Ok(internal_error("Failed to record grade", e)),
    }
}
