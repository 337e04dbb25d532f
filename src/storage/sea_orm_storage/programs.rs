//! 专业存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::programs::{ActiveModel, Column, Entity as Programs};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::Result;
use crate::models::programs::{
    entities::Program,
    requests::{CreateProgramRequest, UpdateProgramRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};

impl SeaOrmStorage {
    /// 创建专业
    pub async fn create_program_impl(&self, req: CreateProgramRequest) -> Result<Program> {
        let model = ActiveModel {
            name: Set(req.name),
            code: Set(req.code),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| db_error("Failed to create program", e))?;

        Ok(result.into_program())
    }

    /// 通过 ID 获取专业
    pub async fn get_program_by_id_impl(&self, id: i64) -> Result<Option<Program>> {
        let result = Programs::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query program", e))?;

        Ok(result.map(|m| m.into_program()))
    }

    /// 通过名称获取专业
    pub async fn get_program_by_name_impl(&self, name: &str) -> Result<Option<Program>> {
        let result = Programs::find()
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query program", e))?;

        Ok(result.map(|m| m.into_program()))
    }

    /// 查找名称或代码冲突的专业
    pub async fn find_conflicting_program_impl(
        &self,
        name: &str,
        code: Option<&str>,
        exclude_id: Option<i64>,
    ) -> Result<Option<Program>> {
        let mut clash = Condition::any().add(Column::Name.eq(name));
        if let Some(code) = code {
            clash = clash.add(Column::Code.eq(code));
        }

        let mut select = Programs::find().filter(clash);
        if let Some(id) = exclude_id {
            select = select.filter(Column::Id.ne(id));
        }

        let result = select
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query program", e))?;

        Ok(result.map(|m| m.into_program()))
    }

    /// 按名称列出全部专业
    pub async fn list_programs_impl(&self) -> Result<Vec<Program>> {
        let programs = Programs::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to list programs", e))?;

        Ok(programs.into_iter().map(|m| m.into_program()).collect())
    }

    /// 更新专业，改名时在同一事务内同步学生的专业名称
    pub async fn update_program_impl(
        &self,
        id: i64,
        update: UpdateProgramRequest,
    ) -> Result<Option<Program>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let Some(existing) = Programs::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| db_error("Failed to query program", e))?
        else {
            return Ok(None);
        };

        let old_name = existing.name.clone();
        let mut model: ActiveModel = existing.into();

        if let Some(ref name) = update.name {
            model.name = Set(name.clone());
        }
        if let Some(code) = update.code {
            model.code = Set(Some(code).filter(|c| !c.is_empty()));
        }

        let updated = model
            .update(&txn)
            .await
            .map_err(|e| db_error("Failed to update program", e))?;

        if updated.name != old_name {
            Students::update_many()
                .col_expr(StudentColumn::Program, Expr::value(updated.name.clone()))
                .filter(StudentColumn::Program.eq(old_name))
                .exec(&txn)
                .await
                .map_err(|e| db_error("Failed to sync student programs", e))?;
        }

        txn.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(Some(updated.into_program()))
    }

    /// 删除专业
    pub async fn delete_program_impl(&self, id: i64) -> Result<bool> {
        let result = Programs::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| db_error("Failed to delete program", e))?;

        Ok(result.rows_affected > 0)
    }
}
