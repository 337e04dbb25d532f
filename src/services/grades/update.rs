use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{
    GradeService, already_exists, ensure_unique, internal_error, invalid, load_allowed_subject,
    load_grade, validate_scores,
};
use crate::errors::EduStatsError;
use crate::middlewares::RequireJWT;
use crate::models::audit::entities::{AuditAction, AuditEntity};
use crate::models::grades::requests::UpdateGradeRequest;
use crate::models::grades::responses::GradeResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit::{AuditEntry, record};
use crate::utils::validate::require_text;

pub async fn update_grade(
    service: &GradeService,
    grade_id: i64,
    update: UpdateGradeRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let scope = RequireJWT::extract_scope(request);

    let (existing, student) = match load_grade(&storage, &scope, grade_id).await {
        Ok(loaded) => loaded,
        Err(response) => return Ok(response),
    };

    if let Err(msg) = validate_scores(update.score, update.attendance) {
        return Ok(invalid(msg));
    }
    let period = match update.period.map(|v| require_text("period", &v)).transpose() {
        Ok(period) => period,
        Err(msg) => return Ok(invalid(msg)),
    };

    if let Some(subject_id) = update.subject_id
        && subject_id != existing.subject_id
        && let Err(response) = load_allowed_subject(&storage, &student, subject_id).await
    {
        return Ok(response);
    }

    let subject_id = update.subject_id.unwrap_or(existing.subject_id);
    let effective_period = period.as_deref().unwrap_or(&existing.period);
    if let Err(response) =
        ensure_unique(&storage, student.id, subject_id, effective_period, Some(grade_id)).await
    {
        return Ok(response);
    }

    let update = UpdateGradeRequest {
        subject_id: update.subject_id,
        score: update.score,
        attendance: update.attendance,
        period,
    };

    match storage.update_grade(grade_id, update).await {
        Ok(Some(grade)) => {
            record(
                &storage,
                request,
                AuditEntry::new(
                    AuditAction::Update,
                    AuditEntity::Grade,
                    Some(grade.id),
                    format!("Updated a grade of student {}", student.enrollment_id),
                )
                .old(&existing)
                .new_data(&grade),
            )
            .await;
            Ok(HttpResponse::Ok()
                .json(ApiResponse::success(GradeResponse { grade }, "Grade updated")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::GradeNotFound,
            "Grade not found",
        ))),
        Err(EduStatsError::Conflict(_)) => Ok(already_exists()),
        Err(e) => Ok(internal_error("Failed to update grade", e)),
    }
}
