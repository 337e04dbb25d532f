//! 图表数据查询

use super::students::student_scope;
use super::{SeaOrmStorage, db_error};
use crate::entity::grades::{Column as GradeColumn, Entity as Grades, Relation as GradeRelation};
use crate::entity::risk_factors::{
    Column as RiskFactorColumn, Entity as RiskFactors, Relation as RiskFactorRelation,
};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::Result;
use crate::models::AccessScope;
use crate::models::students::entities::StudentStatus;
use crate::storage::StudentCounts;
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};

impl SeaOrmStorage {
    /// 学生总数与辍学人数
    pub async fn count_students_impl(&self, scope: &AccessScope) -> Result<StudentCounts> {
        let Some(condition) = student_scope(scope) else {
            return Ok(StudentCounts::default());
        };

        let total = Students::find()
            .filter(condition.clone())
            .count(&self.db)
            .await
            .map_err(|e| db_error("Failed to count students", e))?;

        let dropouts = Students::find()
            .filter(condition)
            .filter(StudentColumn::Status.eq(StudentStatus::DROPOUT))
            .count(&self.db)
            .await
            .map_err(|e| db_error("Failed to count dropouts", e))?;

        Ok(StudentCounts { total, dropouts })
    }

    /// 全部成绩的 (score, attendance)
    pub async fn list_score_attendance_impl(&self, scope: &AccessScope) -> Result<Vec<(f64, f64)>> {
        let Some(condition) = student_scope(scope) else {
            return Ok(Vec::new());
        };

        Grades::find()
            .select_only()
            .column(GradeColumn::Score)
            .column(GradeColumn::Attendance)
            .join(JoinType::InnerJoin, GradeRelation::Student.def())
            .filter(condition)
            .order_by_asc(GradeColumn::Id)
            .into_tuple::<(f64, f64)>()
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to query score distribution", e))
    }

    /// 风险因素类别，每条因素一项
    pub async fn list_risk_factor_kinds_impl(
        &self,
        scope: &AccessScope,
        dropout_only: bool,
        semester: Option<i32>,
    ) -> Result<Vec<String>> {
        let Some(condition) = student_scope(scope) else {
            return Ok(Vec::new());
        };

        let mut select = RiskFactors::find()
            .select_only()
            .column(RiskFactorColumn::Kind)
            .join(JoinType::InnerJoin, RiskFactorRelation::Student.def())
            .filter(condition);

        if dropout_only {
            select = select.filter(StudentColumn::Status.eq(StudentStatus::DROPOUT));
        }
        if let Some(semester) = semester {
            select = select.filter(StudentColumn::Semester.eq(semester));
        }

        select
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to query risk factor", e))
    }

    /// 存在辍学学生的学期（升序）
    pub async fn list_dropout_semesters_impl(&self, scope: &AccessScope) -> Result<Vec<i32>> {
        let Some(condition) = student_scope(scope) else {
            return Ok(Vec::new());
        };

        Students::find()
            .select_only()
            .column(StudentColumn::Semester)
            .distinct()
            .filter(condition)
            .filter(StudentColumn::Status.eq(StudentStatus::DROPOUT))
            .order_by_asc(StudentColumn::Semester)
            .into_tuple::<i32>()
            .all(&self.db)
            .await
            .map_err(|e| db_error("Failed to query dropout semesters", e))
    }
}
