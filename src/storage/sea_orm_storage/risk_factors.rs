//! 风险因素存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::risk_factors::{ActiveModel, Column, Entity as RiskFactors};
use crate::errors::Result;
use crate::models::risk_factors::{
    entities::RiskFactor,
    requests::{CreateRiskFactorRequest, UpdateRiskFactorRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 登记风险因素
    pub async fn create_risk_factor_impl(
        &self,
        student_id: i64,
        req: CreateRiskFactorRequest,
    ) -> Result<RiskFactor> {
        let model = ActiveModel {
            student_id: Set(student_id),
            kind: Set(req.kind.to_string()),
            label: Set(req.label),
            period: Set(req.period),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| db_error("Failed to record risk factor", e))?;

        Ok(result.into_risk_factor())
    }

    pub async fn get_risk_factor_by_id_impl(&self, id: i64) -> Result<Option<RiskFactor>> {
        let result = RiskFactors::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query risk factor", e))?;

        Ok(result.map(|m| m.into_risk_factor()))
    }

    /// 列出学生的风险因素（学期倒序）
    pub async fn list_risk_factors_by_student_impl(
        &self,
        student_id: i64,
    ) -> Result<Vec<RiskFactor>> {
        let factors = RiskFactors::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::Period)
            .order_by_asc(Column::Kind)
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to list risk factors", e))?;

        Ok(factors.into_iter().map(|m| m.into_risk_factor()).collect())
    }

    pub async fn count_risk_factors_by_student_impl(&self, student_id: i64) -> Result<u64> {
        RiskFactors::find()
            .filter(Column::StudentId.eq(student_id))
            .count(&self.db)
            .await
            .map_err(|e| db_error("Failed to count risk factors", e))
    }

    /// 更新风险因素
    pub async fn update_risk_factor_impl(
        &self,
        id: i64,
        update: UpdateRiskFactorRequest,
    ) -> Result<Option<RiskFactor>> {
        let Some(existing) = RiskFactors::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| db_error("Failed to query risk factor", e))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();

        if let Some(kind) = update.kind {
            model.kind = Set(kind.to_string());
        }
        if let Some(label) = update.label {
            model.label = Set(label);
        }
        if let Some(period) = update.period {
            model.period = Set(period);
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| db_error("Failed to update risk factor", e))?;

        Ok(Some(updated.into_risk_factor()))
    }

    pub async fn delete_risk_factor_impl(&self, id: i64) -> Result<bool> {
        let result = RiskFactors::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| db_error("Failed to delete risk factor", e))?;

        Ok(result.rows_affected > 0)
    }
}
