//! 成绩存储操作

use super::students::student_scope;
use super::{SeaOrmStorage, db_error};
use crate::entity::grades::{ActiveModel, Column, Entity as Grades, Model, Relation};
use crate::entity::students::Column as StudentColumn;
use crate::entity::subjects::{Column as SubjectColumn, Entity as Subjects, Model as SubjectModel};
use crate::errors::Result;
use crate::models::AccessScope;
use crate::models::grades::{
    entities::{Grade, GradeRecord},
    requests::{CreateGradeRequest, GradeRecordFilter, UpdateGradeRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

fn to_grade((model, subject): (Model, Option<SubjectModel>)) -> Grade {
    model.into_grade(subject.map(|s| s.name))
}

#[derive(Debug, FromQueryResult)]
struct GradeRecordRow {
    enrollment_id: String,
    paternal_surname: String,
    maternal_surname: String,
    given_names: String,
    program: String,
    semester: i32,
    subject: String,
    score: f64,
    attendance: f64,
    period: String,
}

impl From<GradeRecordRow> for GradeRecord {
    fn from(row: GradeRecordRow) -> Self {
        GradeRecord {
            enrollment_id: row.enrollment_id,
            paternal_surname: row.paternal_surname,
            maternal_surname: row.maternal_surname,
            given_names: row.given_names,
            program: row.program,
            semester: row.semester,
            subject: row.subject,
            score: row.score,
            attendance: row.attendance,
            period: row.period,
        }
    }
}

impl SeaOrmStorage {
    /// 录入成绩
    pub async fn create_grade_impl(
        &self,
        student_id: i64,
        req: CreateGradeRequest,
    ) -> Result<Grade> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            student_id: Set(student_id),
            subject_id: Set(req.subject_id),
            score: Set(req.score),
            attendance: Set(req.attendance),
            period: Set(req.period),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| db_error("Failed to insert grade", e))?;

        self.get_grade_by_id_impl(result.id)
            .await?
            .ok_or_else(|| crate::errors::EduStatsError::not_found("Grade not found after insert"))
    }

    /// 通过 ID 获取成绩
    pub async fn get_grade_by_id_impl(&self, id: i64) -> Result<Option<Grade>> {
        let result = Grades::find_by_id(id)
            .find_also_related(Subjects)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query grade", e))?;

        Ok(result.map(to_grade))
    }

    /// 按 (学生, 科目, 学期) 查找成绩
    pub async fn find_grade_impl(
        &self,
        student_id: i64,
        subject_id: i64,
        period: &str,
    ) -> Result<Option<Grade>> {
        let result = Grades::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::SubjectId.eq(subject_id))
            .filter(Column::Period.eq(period))
            .find_also_related(Subjects)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query grade", e))?;

        Ok(result.map(to_grade))
    }

    /// 列出学生的全部成绩
    pub async fn list_grades_by_student_impl(&self, student_id: i64) -> Result<Vec<Grade>> {
        let grades = Grades::find()
            .filter(Column::StudentId.eq(student_id))
            .find_also_related(Subjects)
            .order_by_desc(Column::Period)
            .order_by_asc(SubjectColumn::Name)
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to list grades", e))?;

        Ok(grades.into_iter().map(to_grade).collect())
    }

    /// 更新成绩
    pub async fn update_grade_impl(
        &self,
        id: i64,
        update: UpdateGradeRequest,
    ) -> Result<Option<Grade>> {
        let Some(existing) = Grades::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query grade", e))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(chrono::Utc::now().timestamp());

        if let Some(subject_id) = update.subject_id {
            model.subject_id = Set(subject_id);
        }
        if let Some(score) = update.score {
            model.score = Set(score);
        }
        if let Some(attendance) = update.attendance {
            model.attendance = Set(attendance);
        }
        if let Some(period) = update.period {
            model.period = Set(period);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| db_error("Failed to update grade", e))?;

        self.get_grade_by_id_impl(id).await
    }

    /// 删除成绩
    pub async fn delete_grade_impl(&self, id: i64) -> Result<bool> {
        let result = Grades::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| db_error("Failed to delete grade", e))?;

        Ok(result.rows_affected > 0)
    }

    /// 学生 + 科目 + 成绩的扁平记录
    pub async fn list_grade_records_impl(
        &self,
        scope: &AccessScope,
        filter: GradeRecordFilter,
    ) -> Result<Vec<GradeRecord>> {
        let Some(condition) = student_scope(scope) else {
            return Ok(Vec::new());
        };

        let mut select = Grades::find()
            .select_only()
            .column_as(StudentColumn::EnrollmentId, "enrollment_id")
            .column_as(StudentColumn::PaternalSurname, "paternal_surname")
            .column_as(StudentColumn::MaternalSurname, "maternal_surname")
            .column_as(StudentColumn::GivenNames, "given_names")
            .column_as(StudentColumn::Program, "program")
            .column_as(StudentColumn::Semester, "semester")
            .column_as(SubjectColumn::Name, "subject")
            .column_as(Column::Score, "score")
            .column_as(Column::Attendance, "attendance")
            .column_as(Column::Period, "period")
            .join(JoinType::InnerJoin, Relation::Student.def())
            .join(JoinType::InnerJoin, Relation::Subject.def())
            .filter(condition);

        if let Some(program) = filter.program {
            select = select.filter(StudentColumn::Program.eq(program));
        }
        if let Some(subject_id) = filter.subject_id {
            select = select.filter(Column::SubjectId.eq(subject_id));
        }
        if let Some(period) = filter.period.filter(|p| !p.trim().is_empty()) {
            select = select.filter(Column::Period.eq(period.trim()));
        }

        let rows = select
            .order_by_asc(StudentColumn::EnrollmentId)
            .order_by_asc(Column::Period)
            .order_by_asc(SubjectColumn::Name)
            .into_model::<GradeRecordRow>()
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to query grade records", e))?;

        Ok(rows.into_iter().map(GradeRecord::from).collect())
    }
}
