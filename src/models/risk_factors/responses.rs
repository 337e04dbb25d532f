use super::entities::RiskFactor;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "risk_factor.ts")]
pub struct RiskFactorListResponse {
    pub items: Vec<RiskFactor>,
}
