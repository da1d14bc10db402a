use std::f64::consts::TAU;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Polygon};

// ---------------------------------------------------------------------------
// Chart helpers shared by the tabs
// ---------------------------------------------------------------------------

const CHART_HEIGHT: f32 = 280.0;

/// Max angle of one polygon piece; egui fills convex shapes only.
const PIECE: f64 = TAU / 96.0;

/// A labelled, coloured value (one bar, one pie slice).
pub struct Slice {
    pub label: String,
    pub value: f64,
    pub color: Color32,
}

impl Slice {
    pub fn new(label: impl Into<String>, value: f64, color: Color32) -> Self {
        Slice {
            label: label.into(),
            value,
            color,
        }
    }
}

/// A series of bars drawn in one colour, one bar per category.
pub struct BarGroup {
    pub name: String,
    pub color: Color32,
    pub values: Vec<(String, f64)>,
}

fn base_plot(id: &str) -> Plot<'_> {
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .allow_scroll(false)
}

/// One bar per slice, each in its own colour with its own legend entry.
pub fn category_bars(ui: &mut Ui, id: &str, value_label: &str, slices: &[Slice], horizontal: bool) {
    let plot = base_plot(id);
    let plot = if horizontal {
        plot.x_axis_label(value_label)
    } else {
        plot.y_axis_label(value_label)
    };
    plot.show(ui, |plot_ui| {
        for (i, s) in slices.iter().enumerate() {
            let bar = Bar::new(i as f64, s.value).name(&s.label).width(0.7);
            let chart = BarChart::new(vec![bar]).name(&s.label).color(s.color);
            plot_ui.bar_chart(if horizontal { chart.horizontal() } else { chart });
        }
    });
}

/// Side-by-side bars: every group gets a slot next to the others.
pub fn grouped_bars(ui: &mut Ui, id: &str, value_label: &str, groups: Vec<BarGroup>) {
    let n = groups.len().max(1) as f64;
    let width = 0.8 / n;
    base_plot(id).y_axis_label(value_label).show(ui, |plot_ui| {
        for (g, group) in groups.into_iter().enumerate() {
            let offset = -0.4 + width * (g as f64 + 0.5);
            let bars = group
                .values
                .iter()
                .enumerate()
                .map(|(i, (label, v))| Bar::new(i as f64 + offset, *v).name(label).width(width))
                .collect();
            plot_ui.bar_chart(BarChart::new(bars).name(&group.name).color(group.color));
        }
    });
}

/// One line per series. `fill` shades the area down to zero.
pub fn lines(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    y_label: &str,
    series: Vec<(String, Color32, Vec<[f64; 2]>)>,
    fill: bool,
) {
    base_plot(id)
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            for (name, color, points) in series {
                let line = Line::new(PlotPoints::new(points))
                    .name(name)
                    .color(color)
                    .width(1.5_f32);
                plot_ui.line(if fill { line.fill(0.0_f32) } else { line });
            }
        });
}

/// Ring sector between two radii, split into convex quads.
fn sector(inner: f64, outer: f64, start: f64, end: f64) -> Vec<Vec<[f64; 2]>> {
    let pieces = ((end - start) / PIECE - 1e-9).ceil().max(1.0) as usize;
    let step = (end - start) / pieces as f64;
    let at = |r: f64, a: f64| [r * a.cos(), r * a.sin()];
    (0..pieces)
        .map(|k| {
            let a0 = start + step * k as f64;
            let a1 = a0 + step;
            vec![at(inner, a0), at(outer, a0), at(outer, a1), at(inner, a1)]
        })
        .collect()
}

fn ring_plot(id: &str) -> Plot<'_> {
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
}

fn draw_ring(
    plot_ui: &mut egui_plot::PlotUi,
    slices: &[Slice],
    inner: f64,
    outer: f64,
    start: f64,
    span: f64,
) {
    let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
    if total <= 0.0 {
        return;
    }
    let mut angle = start;
    for s in slices {
        let sweep = span * s.value.max(0.0) / total;
        let legend = format!("{} ({:.1}%)", s.label, 100.0 * s.value / total);
        for quad in sector(inner, outer, angle, angle + sweep) {
            plot_ui.polygon(
                Polygon::new(PlotPoints::new(quad))
                    .name(&legend)
                    .fill_color(s.color)
                    .stroke(Stroke::new(0.5_f32, s.color)),
            );
        }
        angle += sweep;
    }
}

/// Pie chart; legend entries carry the percentage of each slice.
pub fn pie(ui: &mut Ui, id: &str, slices: &[Slice]) {
    ring_plot(id).show(ui, |plot_ui| {
        draw_ring(plot_ui, slices, 0.0, 1.0, 0.0, TAU);
    });
}

/// Two-level sunburst: inner ring per parent, outer ring splits every parent
/// into its children.
pub fn sunburst(ui: &mut Ui, id: &str, parents: &[(Slice, Vec<Slice>)]) {
    let total: f64 = parents.iter().map(|(p, _)| p.value.max(0.0)).sum();
    ring_plot(id).show(ui, |plot_ui| {
        if total <= 0.0 {
            return;
        }
        let inner: Vec<Slice> = parents
            .iter()
            .map(|(p, _)| Slice::new(p.label.clone(), p.value, p.color))
            .collect();
        draw_ring(plot_ui, &inner, 0.0, 0.55, 0.0, TAU);

        let mut angle = 0.0;
        for (parent, children) in parents {
            let span = TAU * parent.value.max(0.0) / total;
            draw_ring(plot_ui, children, 0.6, 1.0, angle, span);
            angle += span;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_pieces_are_small_and_cover_the_span() {
        let pieces = sector(0.0, 1.0, 0.0, TAU);
        assert_eq!(pieces.len(), 96);
        let last = pieces.last().unwrap();
        assert!((last[2][0] - 1.0).abs() < 1e-9 && last[2][1].abs() < 1e-9);

        let tiny = sector(0.5, 1.0, 0.0, 0.01);
        assert_eq!(tiny.len(), 1);
        assert_eq!(tiny[0].len(), 4);
    }
}
