use serde::Serialize;
use ts_rs::TS;

// 直方图分箱，区间为 [lower, upper)，最后一箱包含 100
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct HistogramResponse {
    pub bins: Vec<HistogramBin>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct ParetoBar {
    pub kind: String,
    pub count: u64,
    /// 累计百分比（0-100）
    pub cumulative_percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct ParetoResponse {
    pub semester: Option<i32>,
    pub bars: Vec<ParetoBar>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct ScatterPoint {
    pub attendance: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct ScatterResponse {
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct CategoryCount {
    pub kind: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct IshikawaResponse {
    pub categories: Vec<CategoryCount>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct DashboardResponse {
    pub total_students: u64,
    pub total_grades: u64,
    pub failing_rate: f64,
    pub dropout_rate: f64,
    pub histogram: HistogramResponse,
    /// 存在辍学学生的学期，供 Pareto 图筛选
    pub dropout_semesters: Vec<i32>,
}
