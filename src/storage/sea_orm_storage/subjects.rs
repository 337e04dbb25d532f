//! 科目存储操作

use super::{SeaOrmStorage, db_error, pagination_info};
use crate::entity::subjects::{ActiveModel, Column, Entity as Subjects};
use crate::errors::Result;
use crate::models::subjects::{
    entities::Subject,
    requests::{CreateSubjectRequest, UpdateSubjectRequest},
    responses::SubjectListResponse,
};
use crate::models::{AccessScope, PaginationQuery};
use crate::utils::contains_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

/// 某专业可用的科目：本专业科目与公共科目
fn program_or_shared(program_id: Option<i64>) -> Condition {
    let shared = Condition::any().add(Column::ProgramId.is_null());
    match program_id {
        Some(id) => shared.add(Column::ProgramId.eq(id)),
        None => shared,
    }
}

/// 按可见范围限定科目；范围为空时返回 None
pub(super) fn subject_scope(scope: &AccessScope) -> Option<Condition> {
    match scope {
        AccessScope::All => Some(Condition::all()),
        AccessScope::Program { id, .. } => Some(program_or_shared(Some(*id))),
        AccessScope::Nothing => None,
    }
}

impl SeaOrmStorage {
    /// 创建科目
    pub async fn create_subject_impl(&self, req: CreateSubjectRequest) -> Result<Subject> {
        let model = ActiveModel {
            name: Set(req.name),
            semester: Set(req.semester),
            program_id: Set(req.program_id),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| db_error("Failed to create subject", e))?;

        Ok(result.into_subject())
    }

    /// 通过 ID 获取科目
    pub async fn get_subject_by_id_impl(&self, id: i64) -> Result<Option<Subject>> {
        let result = Subjects::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query subject", e))?;

        Ok(result.map(|m| m.into_subject()))
    }

    /// 在 (name, program_id) 桶内查找科目
    pub async fn find_subject_impl(
        &self,
        name: &str,
        program_id: Option<i64>,
    ) -> Result<Option<Subject>> {
        let mut select = Subjects::find().filter(Column::Name.eq(name));
        select = match program_id {
            Some(id) => select.filter(Column::ProgramId.eq(id)),
            None => select.filter(Column::ProgramId.is_null()),
        };

        let result = select
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query subject", e))?;

        Ok(result.map(|m| m.into_subject()))
    }

    /// 分页列出科目
    pub async fn list_subjects_with_pagination_impl(
        &self,
        scope: &AccessScope,
        search: Option<String>,
        pagination: PaginationQuery,
    ) -> Result<SubjectListResponse> {
        let (page, size) = pagination.normalized();

        let Some(condition) = subject_scope(scope) else {
            return Ok(SubjectListResponse {
                items: Vec::new(),
                pagination: pagination_info(page, size, 0, 0),
            });
        };

        let mut select = Subjects::find().filter(condition);

        if let Some(ref search) = search
            && !search.trim().is_empty()
        {
            select = select.filter(Column::Name.like(contains_pattern(search.trim())));
        }

        let paginator = select
            .order_by_asc(Column::Semester)
            .order_by_asc(Column::Name)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| db_error("Failed to count subjects", e))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| db_error("Failed to count subject pages", e))?;

        let subjects = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| db_error("Failed to list subjects", e))?;

        Ok(SubjectListResponse {
            items: subjects.into_iter().map(|m| m.into_subject()).collect(),
            pagination: pagination_info(page, size, total, pages),
        })
    }

    /// 列出某专业可用的科目
    pub async fn list_subjects_for_program_impl(
        &self,
        program_id: Option<i64>,
    ) -> Result<Vec<Subject>> {
        let subjects = Subjects::find()
            .filter(program_or_shared(program_id))
            .order_by_asc(Column::Semester)
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to list subjects", e))?;

        Ok(subjects.into_iter().map(|m| m.into_subject()).collect())
    }

    /// 更新科目
    pub async fn update_subject_impl(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>> {
        let Some(existing) = Subjects::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query subject", e))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(semester) = update.semester {
            model.semester = Set(semester);
        }
        if update.make_shared {
            model.program_id = Set(None);
        } else if let Some(program_id) = update.program_id {
            model.program_id = Set(Some(program_id));
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| db_error("Failed to update subject", e))?;

        Ok(Some(updated.into_subject()))
    }

    /// 删除科目，相关成绩级联删除
    pub async fn delete_subject_impl(&self, id: i64) -> Result<bool> {
        let result = Subjects::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| db_error("Failed to delete subject", e))?;

        Ok(result.rows_affected > 0)
    }
}
