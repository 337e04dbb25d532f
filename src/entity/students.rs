//! 学生实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub enrollment_id: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub given_names: String,
    pub gender: Option<String>,
    pub modality: Option<String>,
    /// 专业名称（与 programs.name 对应）
    pub program: String,
    pub semester: i32,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::grades::Entity")]
    Grades,
    #[sea_orm(has_many = "super::risk_factors::Entity")]
    RiskFactors,
}

impl Related<super::grades::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grades.def()
    }
}

impl Related<super::risk_factors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RiskFactors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_student(self) -> crate::models::students::entities::Student {
        use super::timestamp_to_datetime;
        use crate::models::students::entities::{Student, StudentStatus};

        Student {
            id: self.id,
            enrollment_id: self.enrollment_id,
            paternal_surname: self.paternal_surname,
            maternal_surname: self.maternal_surname,
            given_names: self.given_names,
            gender: self.gender,
            modality: self.modality,
            program: self.program,
            semester: self.semester,
            status: self
                .status
                .parse::<StudentStatus>()
                .unwrap_or(StudentStatus::Active),
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        }
    }
}
