use super::SeaOrmStorage;
use crate::errors::EduStatsError;
use crate::models::grades::requests::{CreateGradeRequest, GradeRecordFilter};
use crate::models::imports::entities::GradeImportRow;
use crate::models::programs::requests::{CreateProgramRequest, UpdateProgramRequest};
use crate::models::risk_factors::{entities::RiskFactorKind, requests::CreateRiskFactorRequest};
use crate::models::students::{
    entities::StudentStatus,
    requests::{NewStudent, StudentChanges, StudentFilter},
};
use crate::models::subjects::requests::CreateSubjectRequest;
use crate::models::{AccessScope, PaginationQuery};

async fn storage() -> SeaOrmStorage {
    SeaOrmStorage::connect("sqlite::memory:", 1).await.unwrap()
}

fn new_student(enrollment_id: &str, program: &str, semester: i32) -> NewStudent {
    NewStudent {
        enrollment_id: enrollment_id.to_string(),
        paternal_surname: "García".to_string(),
        maternal_surname: "López".to_string(),
        given_names: "Ana".to_string(),
        gender: None,
        modality: None,
        program: program.to_string(),
        semester,
        status: StudentStatus::Active,
    }
}

fn import_row(row_num: usize, enrollment_id: &str, subject: &str, period: &str) -> GradeImportRow {
    GradeImportRow {
        row_num,
        enrollment_id: enrollment_id.to_string(),
        paternal_surname: "Pérez".to_string(),
        maternal_surname: "Ruiz".to_string(),
        given_names: "Luis".to_string(),
        program: "Sistemas".to_string(),
        semester: 2,
        subject: subject.to_string(),
        score: 85.0,
        attendance: 90.0,
        period: period.to_string(),
    }
}

#[actix_web::test]
async fn test_program_rename_updates_students() {
    let storage = storage().await;
    let program = storage
        .create_program_impl(CreateProgramRequest {
            name: "Sistemas".to_string(),
            code: Some("SIS".to_string()),
        })
        .await
        .unwrap();
    let student = storage
        .create_student_impl(new_student("A001", "Sistemas", 1))
        .await
        .unwrap();

    let clash = storage
        .find_conflicting_program_impl("Otro", Some("SIS"), None)
        .await
        .unwrap();
    assert_eq!(clash.map(|p| p.id), Some(program.id));
    assert!(
        storage
            .find_conflicting_program_impl("Sistemas", None, Some(program.id))
            .await
            .unwrap()
            .is_none()
    );

    storage
        .update_program_impl(
            program.id,
            UpdateProgramRequest {
                name: Some("Ingeniería en Sistemas".to_string()),
                code: None,
            },
        )
        .await
        .unwrap();

    let student = storage
        .get_student_by_id_impl(student.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(student.program, "Ingeniería en Sistemas");
}

#[actix_web::test]
async fn test_student_scope_and_filters() {
    let storage = storage().await;
    storage
        .create_student_impl(new_student("B002", "Sistemas", 1))
        .await
        .unwrap();
    storage
        .create_student_impl(new_student("B001", "Sistemas", 3))
        .await
        .unwrap();
    storage
        .create_student_impl(new_student("C001", "Derecho", 1))
        .await
        .unwrap();

    let teacher = AccessScope::Program {
        id: 1,
        name: "Sistemas".to_string(),
    };
    let page = storage
        .list_students_with_pagination_impl(
            &teacher,
            StudentFilter::default(),
            PaginationQuery::default(),
        )
        .await
        .unwrap();
    let ids: Vec<_> = page.items.iter().map(|s| s.enrollment_id.as_str()).collect();
    assert_eq!(ids, vec!["B001", "B002"]);
    assert_eq!(page.pagination.total, 2);

    let nothing = storage
        .list_students_impl(&AccessScope::Nothing, StudentFilter::default())
        .await
        .unwrap();
    assert!(nothing.is_empty());

    let searched = storage
        .list_students_impl(
            &AccessScope::All,
            StudentFilter {
                search: Some("c00".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].program, "Derecho");
}

#[actix_web::test]
async fn test_duplicate_enrollment_is_conflict() {
    let storage = storage().await;
    storage
        .create_student_impl(new_student("D001", "Sistemas", 1))
        .await
        .unwrap();
    let err = storage
        .create_student_impl(new_student("D001", "Derecho", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, EduStatsError::Conflict(_)));
}

#[actix_web::test]
async fn test_grades_and_cascade_delete() {
    let storage = storage().await;
    let student = storage
        .create_student_impl(new_student("E001", "Sistemas", 1))
        .await
        .unwrap();
    let subject = storage
        .create_subject_impl(CreateSubjectRequest {
            name: "Cálculo".to_string(),
            semester: 1,
            program_id: None,
        })
        .await
        .unwrap();

    let request = CreateGradeRequest {
        subject_id: subject.id,
        score: 65.0,
        attendance: 80.0,
        period: "2024-1".to_string(),
    };
    let grade = storage
        .create_grade_impl(student.id, request.clone())
        .await
        .unwrap();
    assert_eq!(grade.subject_name.as_deref(), Some("Cálculo"));
    assert!(grade.is_failing());

    let err = storage
        .create_grade_impl(student.id, request)
        .await
        .unwrap_err();
    assert!(matches!(err, EduStatsError::Conflict(_)));

    assert!(storage.delete_student_impl(student.id).await.unwrap());
    assert!(storage.get_grade_by_id_impl(grade.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_subject_buckets() {
    let storage = storage().await;
    let program = storage
        .create_program_impl(CreateProgramRequest {
            name: "Sistemas".to_string(),
            code: None,
        })
        .await
        .unwrap();
    storage
        .create_subject_impl(CreateSubjectRequest {
            name: "Álgebra".to_string(),
            semester: 1,
            program_id: None,
        })
        .await
        .unwrap();
    storage
        .create_subject_impl(CreateSubjectRequest {
            name: "Redes".to_string(),
            semester: 5,
            program_id: Some(program.id),
        })
        .await
        .unwrap();
    storage
        .create_subject_impl(CreateSubjectRequest {
            name: "Penal".to_string(),
            semester: 2,
            program_id: Some(program.id + 1000),
        })
        .await
        .unwrap_err();

    assert!(
        storage
            .find_subject_impl("Álgebra", None)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        storage
            .find_subject_impl("Álgebra", Some(program.id))
            .await
            .unwrap()
            .is_none()
    );

    let available = storage
        .list_subjects_for_program_impl(Some(program.id))
        .await
        .unwrap();
    let names: Vec<_> = available.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Álgebra", "Redes"]);

    let shared_only = storage.list_subjects_for_program_impl(None).await.unwrap();
    assert_eq!(shared_only.len(), 1);
}

#[actix_web::test]
async fn test_import_rows_creates_and_skips_duplicates() {
    let storage = storage().await;
    let rows = vec![
        import_row(2, "F001", "Cálculo", "2024-1"),
        import_row(3, "F001", "Física", "2024-1"),
        import_row(4, "F001", "Cálculo", "2024-1"),
        import_row(5, "F002", "Cálculo", "2024-1"),
    ];

    let outcome = storage.import_grade_rows_impl(rows.clone()).await.unwrap();
    assert_eq!(outcome.imported, 3);
    assert_eq!(outcome.duplicates, 1);
    assert_eq!(outcome.students_created, 2);
    assert_eq!(outcome.subjects_created, 2);

    // 再次导入全部视为重复
    let again = storage.import_grade_rows_impl(rows).await.unwrap();
    assert_eq!(again.imported, 0);
    assert_eq!(again.duplicates, 4);
    assert_eq!(again.students_created, 0);

    let records = storage
        .list_grade_records_impl(&AccessScope::All, GradeRecordFilter::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].enrollment_id, "F001");
    assert_eq!(records[0].subject, "Cálculo");
    assert_eq!(records[0].program, "Sistemas");
}

#[actix_web::test]
async fn test_chart_queries() {
    let storage = storage().await;
    let dropout = storage
        .create_student_impl(new_student("G001", "Sistemas", 3))
        .await
        .unwrap();
    storage
        .create_student_impl(new_student("G002", "Sistemas", 1))
        .await
        .unwrap();
    storage
        .update_student_impl(
            dropout.id,
            StudentChanges {
                status: Some(StudentStatus::Dropout),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    storage
        .create_risk_factor_impl(
            dropout.id,
            CreateRiskFactorRequest {
                kind: RiskFactorKind::Economic,
                label: "Trabajo".to_string(),
                period: "2024-1".to_string(),
            },
        )
        .await
        .unwrap();

    let counts = storage.count_students_impl(&AccessScope::All).await.unwrap();
    assert_eq!(counts.total, 2);
    assert_eq!(counts.dropouts, 1);

    let kinds = storage
        .list_risk_factor_kinds_impl(&AccessScope::All, true, Some(3))
        .await
        .unwrap();
    assert_eq!(kinds, vec!["economic".to_string()]);
    let other_semester = storage
        .list_risk_factor_kinds_impl(&AccessScope::All, true, Some(1))
        .await
        .unwrap();
    assert!(other_semester.is_empty());

    let semesters = storage
        .list_dropout_semesters_impl(&AccessScope::All)
        .await
        .unwrap();
    assert_eq!(semesters, vec![3]);

    let empty = storage
        .count_students_impl(&AccessScope::Nothing)
        .await
        .unwrap();
    assert_eq!(empty.total, 0);
    assert!(
        storage
            .list_score_attendance_impl(&AccessScope::All)
            .await
            .unwrap()
            .is_empty()
    );
}
