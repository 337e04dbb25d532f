//! 图表数据聚合，纯函数

use std::collections::BTreeMap;

use crate::models::charts::responses::{
    CategoryCount, HistogramBin, HistogramResponse, ParetoBar, ScatterPoint,
};

const BIN_COUNT: usize = 10;
const BIN_WIDTH: f64 = 10.0;

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 百分比：分母为 0 时按 1 计算
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    round2(100.0 * numerator as f64 / denominator.max(1) as f64)
}

/// 10 个宽度为 10 的分箱；第 i 箱统计 10i <= score < 10(i+1)，最后一箱包含 100
pub fn histogram(scores: &[f64]) -> HistogramResponse {
    let mut counts = [0u64; BIN_COUNT];
    for &score in scores {
        if !(0.0..=100.0).contains(&score) {
            continue;
        }
        let idx = ((score / BIN_WIDTH).floor() as usize).min(BIN_COUNT - 1);
        counts[idx] += 1;
    }

    let bins = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| HistogramBin {
            lower: i as f64 * BIN_WIDTH,
            upper: (i + 1) as f64 * BIN_WIDTH,
            count,
        })
        .collect();

    HistogramResponse {
        bins,
        total: counts.iter().sum(),
    }
}

/// 按类别计数，结果按类别名升序
fn count_by_kind(kinds: &[String]) -> BTreeMap<&str, u64> {
    let mut counts = BTreeMap::new();
    for kind in kinds {
        *counts.entry(kind.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Pareto：按数量降序（相同数量按类别升序），附累计百分比
pub fn pareto(kinds: &[String]) -> Vec<ParetoBar> {
    let mut counts: Vec<(&str, u64)> = count_by_kind(kinds).into_iter().collect();
    // BTreeMap 已按类别升序，稳定排序保留并列时的顺序
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = kinds.len() as u64;
    let mut running = 0;
    counts
        .into_iter()
        .map(|(kind, count)| {
            running += count;
            ParetoBar {
                kind: kind.to_string(),
                count,
                cumulative_percentage: percentage(running, total),
            }
        })
        .collect()
}

/// Ishikawa：各类别数量，按类别升序
pub fn ishikawa(kinds: &[String]) -> Vec<CategoryCount> {
    count_by_kind(kinds)
        .into_iter()
        .map(|(kind, count)| CategoryCount {
            kind: kind.to_string(),
            count,
        })
        .collect()
}

/// (score, attendance) 转为散点
pub fn scatter(pairs: &[(f64, f64)]) -> Vec<ScatterPoint> {
    pairs
        .iter()
        .map(|&(score, attendance)| ScatterPoint { attendance, score })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_percentage_and_rounding() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 500.0);
    }

    #[test]
    fn test_histogram_bins() {
        let result = histogram(&[0.0, 9.99, 10.0, 69.9, 70.0, 99.9, 100.0]);
        assert_eq!(result.bins.len(), 10);
        assert_eq!(result.total, 7);
        let counts: Vec<u64> = result.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 0, 0, 0, 1, 1, 0, 2]);
        assert_eq!(result.bins[9].lower, 90.0);
        assert_eq!(result.bins[9].upper, 100.0);
    }

    #[test]
    fn test_histogram_empty() {
        let result = histogram(&[]);
        assert_eq!(result.total, 0);
        assert!(result.bins.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_pareto_order_and_cumulative() {
        let bars = pareto(&kinds(&[
            "economic",
            "academic",
            "economic",
            "psychosocial",
            "academic",
            "economic",
            "contextual",
        ]));
        let order: Vec<(&str, u64)> = bars.iter().map(|b| (b.kind.as_str(), b.count)).collect();
        assert_eq!(
            order,
            vec![
                ("economic", 3),
                ("academic", 2),
                ("contextual", 1),
                ("psychosocial", 1)
            ]
        );
        assert_eq!(bars[0].cumulative_percentage, 42.86);
        assert_eq!(bars[1].cumulative_percentage, 71.43);
        assert_eq!(bars[3].cumulative_percentage, 100.0);
    }

    #[test]
    fn test_pareto_empty() {
        assert!(pareto(&[]).is_empty());
    }

    #[test]
    fn test_ishikawa_sorted_by_kind() {
        let categories = ishikawa(&kinds(&["psychosocial", "academic", "psychosocial"]));
        assert_eq!(
            categories,
            vec![
                CategoryCount {
                    kind: "academic".to_string(),
                    count: 1
                },
                CategoryCount {
                    kind: "psychosocial".to_string(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_scatter_swaps_axes() {
        let points = scatter(&[(55.0, 80.0)]);
        assert_eq!(
            points,
            vec![ScatterPoint {
                attendance: 80.0,
                score: 55.0
            }]
        );
    }
}
