//! 预导入模块，方便使用

pub use super::audit_logs::{
    ActiveModel as AuditLogActiveModel, Entity as AuditLogs, Model as AuditLogModel,
};
pub use super::grades::{ActiveModel as GradeActiveModel, Entity as Grades, Model as GradeModel};
pub use super::programs::{
    ActiveModel as ProgramActiveModel, Entity as Programs, Model as ProgramModel,
};
pub use super::risk_factors::{
    ActiveModel as RiskFactorActiveModel, Entity as RiskFactors, Model as RiskFactorModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
pub use super::subjects::{
    ActiveModel as SubjectActiveModel, Entity as Subjects, Model as SubjectModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
