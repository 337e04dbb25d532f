use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "chart.ts")]
pub struct ParetoQuery {
    /// 无法解析为整数时忽略
    pub semester: Option<String>,
}

impl ParetoQuery {
    pub fn semester(&self) -> Option<i32> {
        self.semester
            .as_deref()
            .and_then(|s| s.trim().parse::<i32>().ok())
    }
}

/// 可导出为图片的图表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Pareto,
    Histogram,
    Scatter,
    Ishikawa,
}

impl ChartKind {
    /// 下载文件名（不含扩展名）
    pub fn file_stem(&self) -> &'static str {
        match self {
            ChartKind::Pareto => "pareto",
            ChartKind::Histogram => "histograma",
            ChartKind::Scatter => "dispersion",
            ChartKind::Ishikawa => "ishikawa",
        }
    }
}

impl std::str::FromStr for ChartKind {
    type Err = String;

    // 前端沿用西班牙语名称，英文名作为别名
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pareto" => Ok(ChartKind::Pareto),
            "histograma" | "histogram" => Ok(ChartKind::Histogram),
            "dispersion" | "scatter" => Ok(ChartKind::Scatter),
            "ishikawa" => Ok(ChartKind::Ishikawa),
            other => Err(format!(
                "Unknown chart type '{other}'. Supported: pareto, histograma, dispersion, ishikawa"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_kind_accepts_aliases() {
        assert_eq!("histograma".parse::<ChartKind>(), Ok(ChartKind::Histogram));
        assert_eq!("Scatter".parse::<ChartKind>(), Ok(ChartKind::Scatter));
        assert_eq!("dispersion".parse::<ChartKind>(), Ok(ChartKind::Scatter));
        assert!("radar".parse::<ChartKind>().is_err());
    }

    #[test]
    fn test_pareto_semester_ignores_garbage() {
        let query = ParetoQuery {
            semester: Some("abc".to_string()),
        };
        assert_eq!(query.semester(), None);
        let query = ParetoQuery {
            semester: Some(" 3 ".to_string()),
        };
        assert_eq!(query.semester(), Some(3));
    }
}
