//! 辍学风险因素实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "risk_factors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub kind: String,
    pub label: String,
    pub period: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_risk_factor(self) -> crate::models::risk_factors::entities::RiskFactor {
        use crate::models::risk_factors::entities::{RiskFactor, RiskFactorKind};

        RiskFactor {
            id: self.id,
            student_id: self.student_id,
            kind: self
                .kind
                .parse::<RiskFactorKind>()
                .unwrap_or(RiskFactorKind::Contextual),
            label: self.label,
            period: self.period,
            created_at: super::timestamp_to_datetime(self.created_at),
        }
    }
}
