//! 图表 PNG 渲染
//!
//! 使用 plotters 的位图后端绘制到内存缓冲区，再编码为 PNG。
//! 不绘制文字（不依赖系统字体），坐标轴与图例由前端负责。

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::prelude::*;

use crate::errors::{EduStatsError, Result};
use crate::models::charts::responses::{CategoryCount, HistogramResponse, ParetoBar, ScatterPoint};
use crate::models::grades::entities::PASSING_SCORE;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;
const MARGIN: u32 = 24;

const GRID: RGBColor = RGBColor(225, 225, 225);
const BAR: RGBColor = RGBColor(52, 101, 164);
const ACCENT: RGBColor = RGBColor(204, 0, 0);

/// 待渲染的图表数据，与 JSON 接口使用同一份聚合结果
#[derive(Debug, Clone)]
pub enum ChartData {
    Pareto(Vec<ParetoBar>),
    Histogram(HistogramResponse),
    Scatter(Vec<ScatterPoint>),
    Ishikawa(Vec<CategoryCount>),
}

fn render_error(e: impl std::fmt::Display) -> EduStatsError {
    EduStatsError::chart_render(format!("Chart rendering failed: {e}"))
}

/// 渲染为 PNG 字节
pub fn render_png(data: &ChartData) -> Result<Vec<u8>> {
    let mut pixels = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        match data {
            ChartData::Pareto(bars) => draw_pareto(&root, bars)?,
            ChartData::Histogram(histogram) => draw_histogram(&root, histogram)?,
            ChartData::Scatter(points) => draw_scatter(&root, points)?,
            ChartData::Ishikawa(categories) => draw_ishikawa(&root, categories)?,
        }
        root.present().map_err(render_error)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, WIDTH, HEIGHT, ExtendedColorType::Rgb8)
        .map_err(render_error)?;
    Ok(png)
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

/// 纵轴上限留 10% 余量，至少为 1
fn y_ceiling(max: u64) -> f64 {
    (max.max(1) as f64) * 1.1
}

/// 柱状为数量，折线为累计百分比（按同一纵轴比例缩放），灰线标出 80%
fn draw_pareto(root: &Area<'_>, bars: &[ParetoBar]) -> Result<()> {
    let max_count = bars.iter().map(|b| b.count).max().unwrap_or(0);
    let y_max = y_ceiling(max_count);
    let x_max = bars.len().max(1) as f64;

    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(render_error)?;

    let scale = |percentage: f64| percentage / 100.0 * max_count.max(1) as f64;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(0.0, scale(80.0)), (x_max, scale(80.0))],
            GRID.stroke_width(2),
        )))
        .map_err(render_error)?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let x = i as f64;
            Rectangle::new([(x + 0.1, 0.0), (x + 0.9, bar.count as f64)], BAR.filled())
        }))
        .map_err(render_error)?;

    let cumulative: Vec<(f64, f64)> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| (i as f64 + 0.5, scale(bar.cumulative_percentage)))
        .collect();
    chart
        .draw_series(std::iter::once(PathElement::new(
            cumulative.clone(),
            ACCENT.stroke_width(2),
        )))
        .map_err(render_error)?;
    chart
        .draw_series(
            cumulative
                .into_iter()
                .map(|point| Circle::new(point, 4, ACCENT.filled())),
        )
        .map_err(render_error)?;

    Ok(())
}

/// 成绩分布，红线标出及格线
fn draw_histogram(root: &Area<'_>, histogram: &HistogramResponse) -> Result<()> {
    let max_count = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0);
    let y_max = y_ceiling(max_count);

    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .build_cartesian_2d(0f64..100f64, 0f64..y_max)
        .map_err(render_error)?;

    chart
        .draw_series(histogram.bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.lower + 0.5, 0.0), (bin.upper - 0.5, bin.count as f64)],
                BAR.filled(),
            )
        }))
        .map_err(render_error)?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(PASSING_SCORE, 0.0), (PASSING_SCORE, y_max)],
            ACCENT.stroke_width(2),
        )))
        .map_err(render_error)?;

    Ok(())
}

/// 横轴出勤率，纵轴成绩，两者都是 0-100
fn draw_scatter(root: &Area<'_>, points: &[ScatterPoint]) -> Result<()> {
    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .build_cartesian_2d(0f64..100f64, 0f64..100f64)
        .map_err(render_error)?;

    chart
        .draw_series((0..=10).flat_map(|i| {
            let v = i as f64 * 10.0;
            [
                PathElement::new(vec![(v, 0.0), (v, 100.0)], GRID.stroke_width(1)),
                PathElement::new(vec![(0.0, v), (100.0, v)], GRID.stroke_width(1)),
            ]
        }))
        .map_err(render_error)?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(0.0, PASSING_SCORE), (100.0, PASSING_SCORE)],
            ACCENT.stroke_width(2),
        )))
        .map_err(render_error)?;

    chart
        .draw_series(points.iter().map(|p| {
            Circle::new(
                (p.attendance.clamp(0.0, 100.0), p.score.clamp(0.0, 100.0)),
                4,
                BAR.mix(0.7).filled(),
            )
        }))
        .map_err(render_error)?;

    Ok(())
}

/// 鱼骨图：主干指向右侧鱼头，每个类别一根鱼骨，上下交替，线宽随数量增加
fn draw_ishikawa(root: &Area<'_>, categories: &[CategoryCount]) -> Result<()> {
    let mut chart = ChartBuilder::on(root)
        .margin(MARGIN)
        .build_cartesian_2d(0f64..100f64, 0f64..100f64)
        .map_err(render_error)?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(5.0, 50.0), (85.0, 50.0)],
            BLACK.stroke_width(3),
        )))
        .map_err(render_error)?;
    chart
        .draw_series(std::iter::once(Polygon::new(
            vec![(85.0, 40.0), (85.0, 60.0), (97.0, 50.0)],
            ACCENT.filled(),
        )))
        .map_err(render_error)?;

    let max_count = categories.iter().map(|c| c.count).max().unwrap_or(0).max(1);
    let step = 75.0 / categories.len().max(1) as f64;

    chart
        .draw_series(categories.iter().enumerate().map(|(i, category)| {
            let joint = 15.0 + step * (i as f64 + 0.5);
            let tip_y = if i % 2 == 0 { 90.0 } else { 10.0 };
            let width = 1 + (6 * category.count / max_count) as u32;
            PathElement::new(
                vec![(joint - 12.0, tip_y), (joint, 50.0)],
                BAR.stroke_width(width),
            )
        }))
        .map_err(render_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::charts::aggregate;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_every_chart_renders_png() {
        let kinds: Vec<String> = ["economic", "academic", "economic"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let pairs = [(55.0, 80.0), (92.5, 100.0)];

        for data in [
            ChartData::Pareto(aggregate::pareto(&kinds)),
            ChartData::Histogram(aggregate::histogram(&[55.0, 92.5])),
            ChartData::Scatter(aggregate::scatter(&pairs)),
            ChartData::Ishikawa(aggregate::ishikawa(&kinds)),
        ] {
            let png = render_png(&data).unwrap();
            assert!(png.starts_with(PNG_SIGNATURE), "{data:?}");
        }
    }

    #[test]
    fn test_empty_series_still_render() {
        let png = render_png(&ChartData::Pareto(Vec::new())).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));
        let png = render_png(&ChartData::Ishikawa(Vec::new())).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));
    }
}
