//! 用户存储操作

use super::{SeaOrmStorage, db_error, pagination_info};
use crate::entity::programs::{Entity as Programs, Model as ProgramModel};
use crate::entity::users::{ActiveModel, Column, Entity as Users, Model};
use crate::errors::Result;
use crate::models::users::{
    entities::{User, UserRole},
    requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
    responses::UserListResponse,
};
use crate::utils::contains_pattern;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

fn to_user((model, program): (Model, Option<ProgramModel>)) -> User {
    model.into_user(program.map(|p| p.name))
}

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            email: Set(req.email),
            password_hash: Set(req.password),
            display_name: Set(req.display_name),
            role: Set(req.role.to_string()),
            program_id: Set(req.program_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| db_error("Failed to create user", e))?;

        self.get_user_by_id_impl(result.id)
            .await?
            .ok_or_else(|| crate::errors::EduStatsError::not_found("User not found after insert"))
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .find_also_related(Programs)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query user", e))?;

        Ok(result.map(to_user))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .find_also_related(Programs)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query user", e))?;

        Ok(result.map(to_user))
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Users::find();

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let pattern = contains_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Email.like(pattern.clone()))
                    .add(Column::DisplayName.like(pattern)),
            );
        }

        // 角色筛选
        if let Some(ref role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        // 排序
        select = select.order_by_desc(Column::CreatedAt).order_by_asc(Column::Id);

        // 分页查询
        let paginator = select.find_also_related(Programs).paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| db_error("Failed to count users", e))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| db_error("Failed to count user pages", e))?;

        let users = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| db_error("Failed to list users", e))?;

        Ok(UserListResponse {
            items: users.into_iter().map(to_user).collect(),
            pagination: pagination_info(page, size, total, pages),
        })
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| db_error("Failed to update last login time", e))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        // 先检查用户是否存在
        if Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query user", e))?
            .is_none()
        {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(display_name) = update.display_name {
            model.display_name = Set(display_name);
        }

        if let Some(password) = update.password {
            model.password_hash = Set(password);
        }

        if let Some(role) = update.role {
            model.role = Set(role.to_string());
        }

        model.program_id = match (update.clear_program, update.program_id) {
            (true, _) => Set(None),
            (false, Some(program_id)) => Set(Some(program_id)),
            (false, None) => NotSet,
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| db_error("Failed to update user", e))?;

        self.get_user_by_id_impl(id).await
    }

    /// 删除用户
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| db_error("Failed to delete user", e))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计指定角色的用户数量
    pub async fn count_users_by_role_impl(&self, role: UserRole) -> Result<u64> {
        let count = Users::find()
            .filter(Column::Role.eq(role.to_string()))
            .count(&self.db)
            .await
            .map_err(|e| db_error("Failed to count users by role", e))?;

        Ok(count)
    }
}
