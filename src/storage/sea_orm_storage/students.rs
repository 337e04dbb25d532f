//! 学生存储操作

use super::{SeaOrmStorage, db_error, pagination_info};
use crate::entity::grades::{Column as GradeColumn, Entity as Grades};
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::errors::Result;
use crate::models::students::{
    entities::Student,
    requests::{NewStudent, StudentChanges, StudentFilter},
    responses::StudentListResponse,
};
use crate::models::{AccessScope, PaginationQuery};
use crate::utils::contains_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set, sea_query::Query,
};

/// 按可见范围限定学生；范围为空时返回 None
pub(super) fn student_scope(scope: &AccessScope) -> Option<Condition> {
    match scope {
        AccessScope::All => Some(Condition::all()),
        AccessScope::Program { name, .. } => {
            Some(Condition::all().add(Column::Program.eq(name.as_str())))
        }
        AccessScope::Nothing => None,
    }
}

fn filtered_students(scope: &AccessScope, filter: StudentFilter) -> Option<Select<Students>> {
    let mut select = Students::find().filter(student_scope(scope)?);

    if let Some(program) = filter.program {
        select = select.filter(Column::Program.eq(program));
    }

    if let Some(status) = filter.status {
        select = select.filter(Column::Status.eq(status.to_string()));
    }

    // 只保留在该科目有成绩的学生
    if let Some(subject_id) = filter.subject_id {
        select = select.filter(
            Column::Id.in_subquery(
                Query::select()
                    .column(GradeColumn::StudentId)
                    .from(Grades)
                    .and_where(GradeColumn::SubjectId.eq(subject_id))
                    .to_owned(),
            ),
        );
    }

    if let Some(ref search) = filter.search
        && !search.trim().is_empty()
    {
        let pattern = contains_pattern(search.trim());
        select = select.filter(
            Condition::any()
                .add(Column::EnrollmentId.like(pattern.clone()))
                .add(Column::PaternalSurname.like(pattern.clone()))
                .add(Column::MaternalSurname.like(pattern.clone()))
                .add(Column::GivenNames.like(pattern)),
        );
    }

    Some(select.order_by_asc(Column::EnrollmentId))
}

impl SeaOrmStorage {
    /// 创建学生
    pub async fn create_student_impl(&self, student: NewStudent) -> Result<Student> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            enrollment_id: Set(student.enrollment_id),
            paternal_surname: Set(student.paternal_surname),
            maternal_surname: Set(student.maternal_surname),
            given_names: Set(student.given_names),
            gender: Set(student.gender),
            modality: Set(student.modality),
            program: Set(student.program),
            semester: Set(student.semester),
            status: Set(student.status.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| db_error("Failed to create student", e))?;

        Ok(result.into_student())
    }

    /// 通过 ID 获取学生
    pub async fn get_student_by_id_impl(&self, id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query student", e))?;

        Ok(result.map(|m| m.into_student()))
    }

    /// 通过学号获取学生
    pub async fn get_student_by_enrollment_id_impl(
        &self,
        enrollment_id: &str,
    ) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::EnrollmentId.eq(enrollment_id))
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query student", e))?;

        Ok(result.map(|m| m.into_student()))
    }

    /// 分页列出学生
    pub async fn list_students_with_pagination_impl(
        &self,
        scope: &AccessScope,
        filter: StudentFilter,
        pagination: PaginationQuery,
    ) -> Result<StudentListResponse> {
        let (page, size) = pagination.normalized();

        let Some(select) = filtered_students(scope, filter) else {
            return Ok(StudentListResponse {
                items: Vec::new(),
                pagination: pagination_info(page, size, 0, 0),
            });
        };

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| db_error("Failed to count students", e))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| db_error("Failed to count student pages", e))?;

        let students = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| db_error("Failed to list students", e))?;

        Ok(StudentListResponse {
            items: students.into_iter().map(|m| m.into_student()).collect(),
            pagination: pagination_info(page, size, total, pages),
        })
    }

    /// 列出全部符合条件的学生
    pub async fn list_students_impl(
        &self,
        scope: &AccessScope,
        filter: StudentFilter,
    ) -> Result<Vec<Student>> {
        let Some(select) = filtered_students(scope, filter) else {
            return Ok(Vec::new());
        };

        let students = select
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to list students", e))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    /// 更新学生
    pub async fn update_student_impl(
        &self,
        id: i64,
        changes: StudentChanges,
    ) -> Result<Option<Student>> {
        let Some(existing) = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query student", e))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.updated_at = Set(chrono::Utc::now().timestamp());

        if let Some(enrollment_id) = changes.enrollment_id {
            model.enrollment_id = Set(enrollment_id);
        }
        if let Some(paternal_surname) = changes.paternal_surname {
            model.paternal_surname = Set(paternal_surname);
        }
        if let Some(maternal_surname) = changes.maternal_surname {
            model.maternal_surname = Set(maternal_surname);
        }
        if let Some(given_names) = changes.given_names {
            model.given_names = Set(given_names);
        }
        if let Some(gender) = changes.gender {
            model.gender = Set(Some(gender).filter(|g| !g.is_empty()));
        }
        if let Some(modality) = changes.modality {
            model.modality = Set(Some(modality).filter(|m| !m.is_empty()));
        }
        if let Some(program) = changes.program {
            model.program = Set(program);
        }
        if let Some(semester) = changes.semester {
            model.semester = Set(semester);
        }
        if let Some(status) = changes.status {
            model.status = Set(status.to_string());
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| db_error("Failed to update student", e))?;

        Ok(Some(updated.into_student()))
    }

    /// 删除学生，成绩与风险因素由外键级联删除
    pub async fn delete_student_impl(&self, id: i64) -> Result<bool> {
        let result = Students::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| db_error("Failed to delete student", e))?;

        Ok(result.rows_affected > 0)
    }
}
