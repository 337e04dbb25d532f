use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 风险因素类别
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "risk_factor.ts")]
pub enum RiskFactorKind {
    Academic,      // 学业
    Contextual,    // 环境
    Economic,      // 经济
    Institutional, // 院校
    Psychosocial,  // 心理社会
}

impl RiskFactorKind {
    // 按名称字母序排列，与派生的 Ord 一致
    pub const ALL: [RiskFactorKind; 5] = [
        RiskFactorKind::Academic,
        RiskFactorKind::Contextual,
        RiskFactorKind::Economic,
        RiskFactorKind::Institutional,
        RiskFactorKind::Psychosocial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactorKind::Academic => "academic",
            RiskFactorKind::Psychosocial => "psychosocial",
            RiskFactorKind::Economic => "economic",
            RiskFactorKind::Institutional => "institutional",
            RiskFactorKind::Contextual => "contextual",
        }
    }
}

impl<'de> Deserialize<'de> for RiskFactorKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<RiskFactorKind>().map_err(|_| {
            serde::de::Error::custom(format!(
                "Invalid risk factor kind: '{s}'. Supported: academic, contextual, economic, institutional, psychosocial"
            ))
        })
    }
}

impl std::fmt::Display for RiskFactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskFactorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskFactorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Invalid risk factor kind: {s}"))
    }
}

// 辍学风险因素
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "risk_factor.ts")]
pub struct RiskFactor {
    pub id: i64,
    pub student_id: i64,
    pub kind: RiskFactorKind,
    /// 具体描述
    pub label: String,
    pub period: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            "economic".parse::<RiskFactorKind>().unwrap(),
            RiskFactorKind::Economic
        );
        assert!("Economic".parse::<RiskFactorKind>().is_err());
    }

    #[test]
    fn test_kind_order_is_alphabetical() {
        let mut names: Vec<_> = RiskFactorKind::ALL.iter().map(|k| k.as_str()).collect();
        let sorted = {
            let mut n = names.clone();
            n.sort();
            n
        };
        names.sort_by_key(|n| n.parse::<RiskFactorKind>().unwrap());
        assert_eq!(names, sorted);
    }
}
