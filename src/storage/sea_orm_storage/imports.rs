//! 成绩导入写库

use std::collections::HashMap;

use super::{SeaOrmStorage, db_error};
use crate::entity::grades::{
    ActiveModel as GradeActiveModel, Column as GradeColumn, Entity as Grades,
};
use crate::entity::programs::{Column as ProgramColumn, Entity as Programs};
use crate::entity::students::{
    ActiveModel as StudentActiveModel, Column as StudentColumn, Entity as Students,
};
use crate::entity::subjects::{
    ActiveModel as SubjectActiveModel, Column as SubjectColumn, Entity as Subjects,
};
use crate::errors::Result;
use crate::models::imports::entities::{GradeImportOutcome, GradeImportRow};
use crate::models::students::entities::StudentStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::debug;

/// 导入过程中缓存的学生信息：(id, 专业名称)
type StudentEntry = (i64, String);

async fn resolve_student<C: ConnectionTrait>(
    conn: &C,
    row: &GradeImportRow,
    now: i64,
    outcome: &mut GradeImportOutcome,
) -> Result<StudentEntry> {
    if let Some(existing) = Students::find()
        .filter(StudentColumn::EnrollmentId.eq(row.enrollment_id.as_str()))
        .one(conn)
        .await
        .map_err(|e| db_error("Failed to query student", e))?
    {
        return Ok((existing.id, existing.program));
    }

    let created = StudentActiveModel {
        enrollment_id: Set(row.enrollment_id.clone()),
        paternal_surname: Set(row.paternal_surname.clone()),
        maternal_surname: Set(row.maternal_surname.clone()),
        given_names: Set(row.given_names.clone()),
        gender: Set(None),
        modality: Set(None),
        program: Set(row.program.clone()),
        semester: Set(row.semester),
        status: Set(StudentStatus::Active.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| db_error("Failed to create student", e))?;

    outcome.students_created += 1;
    Ok((created.id, created.program))
}

async fn resolve_program_id<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Option<i64>> {
    let program = Programs::find()
        .filter(ProgramColumn::Name.eq(name))
        .one(conn)
        .await
        .map_err(|e| db_error("Failed to query program", e))?;

    Ok(program.map(|p| p.id))
}

/// 先在学生所属专业内查找科目，再查公共科目，都没有则创建公共科目
async fn resolve_subject<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    program_id: Option<i64>,
    semester: i32,
    outcome: &mut GradeImportOutcome,
) -> Result<i64> {
    if let Some(program_id) = program_id
        && let Some(subject) = Subjects::find()
            .filter(SubjectColumn::Name.eq(name))
            .filter(SubjectColumn::ProgramId.eq(program_id))
            .one(conn)
            .await
            .map_err(|e| db_error("Failed to query subject", e))?
    {
        return Ok(subject.id);
    }

    if let Some(subject) = Subjects::find()
        .filter(SubjectColumn::Name.eq(name))
        .filter(SubjectColumn::ProgramId.is_null())
        .one(conn)
        .await
        .map_err(|e| db_error("Failed to query subject", e))?
    {
        return Ok(subject.id);
    }

    let created = SubjectActiveModel {
        name: Set(name.to_string()),
        semester: Set(semester),
        program_id: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| db_error("Failed to create subject", e))?;

    outcome.subjects_created += 1;
    Ok(created.id)
}

impl SeaOrmStorage {
    /// 在单个事务中写入校验通过的行，任何数据库错误都会回滚整批
    pub async fn import_grade_rows_impl(
        &self,
        rows: Vec<GradeImportRow>,
    ) -> Result<GradeImportOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let now = chrono::Utc::now().timestamp();
        let mut outcome = GradeImportOutcome::default();
        let mut students: HashMap<String, StudentEntry> = HashMap::new();
        let mut programs: HashMap<String, Option<i64>> = HashMap::new();
        let mut subjects: HashMap<(String, Option<i64>), i64> = HashMap::new();

        for row in &rows {
            let (student_id, program) = match students.get(&row.enrollment_id) {
                Some(entry) => entry.clone(),
                None => {
                    let entry = resolve_student(&txn, row, now, &mut outcome).await?;
                    students.insert(row.enrollment_id.clone(), entry.clone());
                    entry
                }
            };

            let program_id = match programs.get(&program) {
                Some(id) => *id,
                None => {
                    let id = resolve_program_id(&txn, &program).await?;
                    programs.insert(program.clone(), id);
                    id
                }
            };

            let subject_key = (row.subject.clone(), program_id);
            let subject_id = match subjects.get(&subject_key) {
                Some(id) => *id,
                None => {
                    let id =
                        resolve_subject(&txn, &row.subject, program_id, row.semester, &mut outcome)
                            .await?;
                    subjects.insert(subject_key, id);
                    id
                }
            };

            // 已存在 (学生, 科目, 学期) 视为重复，包括同一文件内的重复行
            let duplicate = Grades::find()
                .filter(GradeColumn::StudentId.eq(student_id))
                .filter(GradeColumn::SubjectId.eq(subject_id))
                .filter(GradeColumn::Period.eq(row.period.as_str()))
                .one(&txn)
                .await
                .map_err(|e| db_error("Failed to query grade", e))?
                .is_some();

            if duplicate {
                debug!(
                    "Row {} skipped: grade for {} / {} / {} already exists",
                    row.row_num, row.enrollment_id, row.subject, row.period
                );
                outcome.duplicates += 1;
                continue;
            }

            GradeActiveModel {
                student_id: Set(student_id),
                subject_id: Set(subject_id),
                score: Set(row.score),
                attendance: Set(row.attendance),
                period: Set(row.period.clone()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| db_error("Failed to write grade", e))?;

            outcome.imported += 1;
        }

        txn.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(outcome)
    }
}
