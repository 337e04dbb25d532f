use super::entities::RiskFactorKind;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "risk_factor.ts")]
pub struct CreateRiskFactorRequest {
    pub kind: RiskFactorKind,
    pub label: String,
    pub period: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "risk_factor.ts")]
pub struct UpdateRiskFactorRequest {
    pub kind: Option<RiskFactorKind>,
    pub label: Option<String>,
    pub period: Option<String>,
}
