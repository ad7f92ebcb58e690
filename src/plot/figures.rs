// src/plot/figures.rs

use std::str::FromStr;

use log::debug;
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{
    finish, palette_color, tick_spacing, with_margins, Annotation, Chart, ChartAxis, Display,
    LegendPosition, Marker, Rgb, Series, SeriesKind,
};
use crate::error::{Result, SpectraError};
use crate::pca::{CUMULATIVE_EXPLAINED_VARIANCE_RATIO, EXPLAINED_VARIANCE_RATIO};
use crate::table::LabeledTable;

const SCREE_Y_RANGE: (f64, f64) = (-2.5, 110.0);
const MAX_TICKS: usize = 8;
const ANNOTATION_FONT_SIZE: u32 = 10;
const DEFAULT_SIZE: (u32, u32) = (640, 480);

/// Which curves a scree plot shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreeShow {
    /// Explained variance ratio and its running sum.
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "exp_var")]
    ExplainedVariance,
    #[serde(rename = "cum_exp_var")]
    Cumulative,
}

impl FromStr for ScreeShow {
    type Err = SpectraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(ScreeShow::All),
            "exp_var" => Ok(ScreeShow::ExplainedVariance),
            "cum_exp_var" => Ok(ScreeShow::Cumulative),
            other => Err(SpectraError::invalid(format!(
                "show must be 'all', 'exp_var' or 'cum_exp_var', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeOptions {
    pub size: (u32, u32),
    pub show: ScreeShow,
    /// Colour of the ratio curve (or of the only curve in single-curve modes).
    pub color: Option<Rgb>,
    /// Colour of the cumulative curve when `show` is [`ScreeShow::All`].
    pub cumulative_color: Option<Rgb>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend: bool,
    pub legend_position: LegendPosition,
    pub display: Display,
}

impl Default for ScreeOptions {
    fn default() -> Self {
        ScreeOptions {
            size: DEFAULT_SIZE,
            show: ScreeShow::All,
            color: None,
            cumulative_color: None,
            title: "Scree plot".to_string(),
            x_label: "Principal components".to_string(),
            y_label: "Explained variance".to_string(),
            legend: true,
            legend_position: LegendPosition::UpperRight,
            display: Display::Return,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoresOptions {
    pub size: (u32, u32),
    /// 1-indexed components on the x and y axes.
    pub pc: (usize, usize),
    /// Marker radius in pixels.
    pub marker_size: u32,
    pub marker: Marker,
    /// One colour for every sample.
    pub color: Option<Rgb>,
    /// One colour per sample, in score-table order. Takes precedence over `color`.
    pub colors: Option<Vec<Rgb>>,
    pub title: String,
    /// Draw each sample label above its marker.
    pub text: bool,
    /// Vertical label offset in data units; 0.15 of the y tick spacing when `None`.
    pub text_offset: Option<f64>,
    pub display: Display,
}

impl Default for ScoresOptions {
    fn default() -> Self {
        ScoresOptions {
            size: DEFAULT_SIZE,
            pc: (1, 2),
            marker_size: 6,
            marker: Marker::Circle,
            color: None,
            colors: None,
            title: "Scores plot".to_string(),
            text: true,
            text_offset: None,
            display: Display::Return,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingsOptions {
    pub size: (u32, u32),
    /// 1-indexed component to plot.
    pub pc: usize,
    pub color: Option<Rgb>,
    pub marker: Marker,
    pub title: String,
    pub x_label: String,
    /// `PC{pc}` when `None`.
    pub y_label: Option<String>,
    pub legend: bool,
    /// Legend entry; `PC{pc}` when `None`.
    pub label: Option<String>,
    pub display: Display,
}

impl Default for LoadingsOptions {
    fn default() -> Self {
        LoadingsOptions {
            size: DEFAULT_SIZE,
            pc: 1,
            color: None,
            marker: Marker::None,
            title: "Loadings plot".to_string(),
            x_label: "Raman shift (cm⁻¹)".to_string(),
            y_label: None,
            legend: false,
            label: None,
            display: Display::Return,
        }
    }
}

/// Options of [`line_plot`]. Per-series lists hold either one value, applied
/// to every series, or exactly one value per series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineOptions {
    pub size: (u32, u32),
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Legend entries, one per series (or none).
    pub labels: Vec<String>,
    pub colors: Vec<Rgb>,
    pub markers: Vec<Marker>,
    pub x_lim: Option<(f64, f64)>,
    pub y_lim: Option<(f64, f64)>,
    pub legend: bool,
    pub display: Display,
}

impl Default for LineOptions {
    fn default() -> Self {
        LineOptions {
            size: DEFAULT_SIZE,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            labels: Vec::new(),
            colors: Vec::new(),
            markers: Vec::new(),
            x_lim: None,
            y_lim: None,
            legend: false,
            display: Display::Return,
        }
    }
}

fn required_row<'a>(table: &'a LabeledTable, label: &str) -> Result<ArrayView1<'a, f64>> {
    table.row(label).ok_or_else(|| {
        SpectraError::invalid(format!(
            "explained variance table has no '{}' row",
            label
        ))
    })
}

fn finite_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> (f64, f64) {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |range: Option<(f64, f64)>, &v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0.0, 1.0))
}

fn percent_label(value: f64) -> String {
    format!("{:.2}%", value)
}

fn percent_series(label: &str, color: Rgb, marker: Marker, percents: &[f64]) -> Series {
    Series {
        kind: SeriesKind::Line,
        label: Some(label.to_string()),
        color,
        marker,
        marker_size: 4,
        alpha: 1.0,
        points: percents.iter().enumerate().map(|(i, &p)| (i as f64, p)).collect(),
    }
}

fn percent_annotations(percents: &[f64], skip: usize, offset: f64) -> Vec<Annotation> {
    percents
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, &p)| Annotation {
            x: i as f64,
            y: p + offset,
            text: percent_label(p),
            font_size: ANNOTATION_FONT_SIZE,
            alpha: 1.0,
        })
        .collect()
}

/// Scree plot of the explained variance ratio, in percent, per component.
///
/// `explained` is the table returned by [`crate::Pca::explain`]. The y axis is
/// fixed to `[-2.5, 110]` and every plotted point carries its value as a
/// `"12.34%"` label.
pub fn scree_plot(explained: &LabeledTable, options: &ScreeOptions) -> Result<Chart> {
    let ratio: Vec<f64> = required_row(explained, EXPLAINED_VARIANCE_RATIO)?
        .iter()
        .map(|r| r * 100.0)
        .collect();
    let cumulative: Vec<f64> = required_row(explained, CUMULATIVE_EXPLAINED_VARIANCE_RATIO)?
        .iter()
        .map(|r| r * 100.0)
        .collect();
    let k = ratio.len();
    if k == 0 {
        return Err(SpectraError::invalid("cannot draw a scree plot without components"));
    }

    let offset = 0.1 * tick_spacing(SCREE_Y_RANGE.1 - SCREE_Y_RANGE.0, MAX_TICKS);
    let first_color = options.color.unwrap_or_else(|| palette_color(0));

    let (series, annotations) = match options.show {
        ScreeShow::All => {
            let second_color = options.cumulative_color.unwrap_or_else(|| palette_color(1));
            let series = vec![
                percent_series("Explained variance", first_color, Marker::Circle, &ratio),
                percent_series(
                    "Cumulative explained variance",
                    second_color,
                    Marker::Square,
                    &cumulative,
                ),
            ];
            // the first cumulative point coincides with the first ratio point
            let mut annotations = percent_annotations(&ratio, 0, offset);
            annotations.extend(percent_annotations(&cumulative, 1, offset));
            (series, annotations)
        }
        ScreeShow::ExplainedVariance => (
            vec![percent_series("Explained variance", first_color, Marker::Circle, &ratio)],
            percent_annotations(&ratio, 0, offset),
        ),
        ScreeShow::Cumulative => (
            vec![percent_series(
                "Cumulative explained variance",
                first_color,
                Marker::Circle,
                &cumulative,
            )],
            percent_annotations(&cumulative, 0, offset),
        ),
    };

    debug!("Scree plot of {} components ({:?}).", k, options.show);
    let chart = Chart {
        title: options.title.clone(),
        size: options.size,
        x_axis: ChartAxis {
            label: options.x_label.clone(),
            range: with_margins(0.0, (k - 1) as f64, 0.05),
            tick_labels: Some(explained.columns().to_vec()),
        },
        y_axis: ChartAxis::numeric(options.y_label.clone(), SCREE_Y_RANGE),
        series,
        annotations,
        legend: options.legend.then_some(options.legend_position),
    };
    finish(chart, options.display)
}

/// Scatter plot of the samples in the plane of two components.
///
/// `scores` is [`crate::Pca::scores`] and `explained` is [`crate::Pca::explain`];
/// the axis labels read `PC{i} (ratio%)` for the plotted components.
pub fn scores_plot(
    scores: &LabeledTable,
    explained: &LabeledTable,
    options: &ScoresOptions,
) -> Result<Chart> {
    let (pc_x, pc_y) = options.pc;
    let k = scores.columns().len();
    for pc in [pc_x, pc_y] {
        if pc == 0 || pc > k {
            return Err(SpectraError::invalid(format!(
                "pc must be between 1 and {}, got {}",
                k, pc
            )));
        }
    }
    let ratio = required_row(explained, EXPLAINED_VARIANCE_RATIO)?;
    if ratio.len() < pc_x.max(pc_y) {
        return Err(SpectraError::invalid(format!(
            "explained variance table has {} components, scores have {}",
            ratio.len(),
            k
        )));
    }

    let names = scores.index();
    let colors: Vec<Rgb> = match (&options.colors, options.color) {
        (Some(colors), _) if colors.len() != names.len() => {
            return Err(SpectraError::invalid(format!(
                "expected one colour per sample ({}), got {}",
                names.len(),
                colors.len()
            )))
        }
        (Some(colors), _) => colors.clone(),
        (None, Some(color)) => vec![color; names.len()],
        (None, None) => (0..names.len()).map(palette_color).collect(),
    };

    let values = scores.values();
    let xs = values.column(pc_x - 1);
    let ys = values.column(pc_y - 1);
    let (x_lo, x_hi) = finite_range(xs.iter());
    let (y_lo, y_hi) = finite_range(ys.iter());
    let x_range = with_margins(x_lo, x_hi, 0.1);
    let y_range = with_margins(y_lo, y_hi, 0.1);

    let series = names
        .iter()
        .enumerate()
        .map(|(i, _)| Series {
            kind: SeriesKind::Scatter,
            label: None,
            color: colors[i],
            marker: options.marker,
            marker_size: options.marker_size,
            alpha: 0.75,
            points: vec![(xs[i], ys[i])],
        })
        .collect();

    let annotations = if options.text {
        let offset = options
            .text_offset
            .unwrap_or_else(|| 0.15 * tick_spacing(y_range.1 - y_range.0, MAX_TICKS));
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Annotation {
                x: xs[i],
                y: ys[i] + offset,
                text: name.clone(),
                font_size: ANNOTATION_FONT_SIZE,
                alpha: 0.75,
            })
            .collect()
    } else {
        Vec::new()
    };

    let chart = Chart {
        title: options.title.clone(),
        size: options.size,
        x_axis: ChartAxis::numeric(
            format!("PC{} ({:.2}%)", pc_x, ratio[pc_x - 1] * 100.0),
            x_range,
        ),
        y_axis: ChartAxis::numeric(
            format!("PC{} ({:.2}%)", pc_y, ratio[pc_y - 1] * 100.0),
            y_range,
        ),
        series,
        annotations,
        legend: None,
    };
    finish(chart, options.display)
}

/// Line plot of one component's loadings against the spectral axis.
///
/// `loadings` is [`crate::Pca::loadings`]; `axis` holds one position per
/// loadings row.
pub fn loadings_plot(
    loadings: &LabeledTable,
    axis: ArrayView1<'_, f64>,
    options: &LoadingsOptions,
) -> Result<Chart> {
    let k = loadings.columns().len();
    let pc = options.pc;
    if pc == 0 || pc > k {
        return Err(SpectraError::invalid(format!(
            "pc must be between 1 and {}, got {}",
            k, pc
        )));
    }
    let values = loadings.values();
    if axis.len() != values.nrows() {
        return Err(SpectraError::invalid(format!(
            "axis has {} positions but loadings have {} rows",
            axis.len(),
            values.nrows()
        )));
    }

    let column = values.column(pc - 1);
    let (x_lo, x_hi) = finite_range(axis.iter());
    let (y_lo, y_hi) = finite_range(column.iter());
    let component = format!("PC{}", pc);

    let chart = Chart {
        title: options.title.clone(),
        size: options.size,
        x_axis: ChartAxis::numeric(options.x_label.clone(), with_margins(x_lo, x_hi, 0.05)),
        y_axis: ChartAxis::numeric(
            options.y_label.clone().unwrap_or_else(|| component.clone()),
            with_margins(y_lo, y_hi, 0.05),
        ),
        series: vec![Series {
            kind: SeriesKind::Line,
            label: options
                .legend
                .then(|| options.label.clone().unwrap_or(component)),
            color: options.color.unwrap_or_else(|| palette_color(0)),
            marker: options.marker,
            marker_size: 3,
            alpha: 1.0,
            points: axis.iter().copied().zip(column.iter().copied()).collect(),
        }],
        annotations: Vec::new(),
        legend: options.legend.then_some(LegendPosition::UpperRight),
    };
    finish(chart, options.display)
}

/// One [`loadings_plot`] per component, in component order. `options.pc` is ignored.
pub fn loadings_plot_all(
    loadings: &LabeledTable,
    axis: ArrayView1<'_, f64>,
    options: &LoadingsOptions,
) -> Result<Vec<Chart>> {
    (1..=loadings.columns().len())
        .map(|pc| {
            let per_component = LoadingsOptions {
                pc,
                ..options.clone()
            };
            loadings_plot(loadings, axis, &per_component)
        })
        .collect()
}

fn broadcast<T: Clone>(values: &[T], n: usize, what: &str) -> Result<Option<Vec<T>>> {
    match values.len() {
        0 => Ok(None),
        1 => Ok(Some(vec![values[0].clone(); n])),
        len if len == n => Ok(Some(values.to_vec())),
        len => Err(SpectraError::invalid(format!(
            "expected 1 or {} {}, got {}",
            n, what, len
        ))),
    }
}

/// Plots every row of `ys` as a line against `x`.
///
/// A single spectrum is a one-row `ys` (`y.insert_axis(Axis(0))`).
pub fn line_plot(
    x: ArrayView1<'_, f64>,
    ys: ArrayView2<'_, f64>,
    options: &LineOptions,
) -> Result<Chart> {
    let n_series = ys.nrows();
    if ys.ncols() != x.len() {
        return Err(SpectraError::invalid(format!(
            "x has {} values but each series has {}",
            x.len(),
            ys.ncols()
        )));
    }
    if !options.labels.is_empty() && options.labels.len() != n_series {
        return Err(SpectraError::invalid(format!(
            "expected {} labels, got {}",
            n_series,
            options.labels.len()
        )));
    }
    let colors = broadcast(&options.colors, n_series, "colours")?;
    let markers = broadcast(&options.markers, n_series, "markers")?;

    let series = ys
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, y)| Series {
            kind: SeriesKind::Line,
            label: options.labels.get(i).cloned(),
            color: colors.as_ref().map_or_else(|| palette_color(i), |c| c[i]),
            marker: markers.as_ref().map_or(Marker::None, |m| m[i]),
            marker_size: 3,
            alpha: 1.0,
            points: x.iter().copied().zip(y.iter().copied()).collect(),
        })
        .collect();

    let x_range = options.x_lim.unwrap_or_else(|| {
        let (lo, hi) = finite_range(x.iter());
        with_margins(lo, hi, 0.05)
    });
    let y_range = options.y_lim.unwrap_or_else(|| {
        let (lo, hi) = finite_range(ys.iter());
        with_margins(lo, hi, 0.05)
    });

    let chart = Chart {
        title: options.title.clone(),
        size: options.size,
        x_axis: ChartAxis::numeric(options.x_label.clone(), x_range),
        y_axis: ChartAxis::numeric(options.y_label.clone(), y_range),
        series,
        annotations: Vec::new(),
        legend: options.legend.then_some(LegendPosition::UpperRight),
    };
    finish(chart, options.display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2, Axis};

    fn explained(ratios: &[f64]) -> LabeledTable {
        let k = ratios.len();
        let mut cumulative = 0.0;
        let mut values = Array2::zeros((4, k));
        for (c, r) in ratios.iter().enumerate() {
            cumulative += r;
            values[[0, c]] = r * 10.0;
            values[[1, c]] = cumulative * 10.0;
            values[[2, c]] = *r;
            values[[3, c]] = cumulative;
        }
        LabeledTable::new(
            vec![
                "Explained variance".to_string(),
                "Cumulative explained variance".to_string(),
                "Explained variance ratio".to_string(),
                "Cumulative explained variance ratio".to_string(),
            ],
            (1..=k).map(|c| format!("PC{}", c)).collect(),
            values,
        )
        .unwrap()
    }

    fn scores() -> LabeledTable {
        LabeledTable::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec!["PC1".into(), "PC2".into(), "PC3".into()],
            array![[1.0, -2.0, 0.5], [0.0, 4.0, 0.1], [-1.0, -2.0, -0.6]],
        )
        .unwrap()
    }

    #[test]
    fn test_scree_show_parsing() {
        assert_eq!("all".parse::<ScreeShow>().unwrap(), ScreeShow::All);
        assert_eq!("exp_var".parse::<ScreeShow>().unwrap(), ScreeShow::ExplainedVariance);
        assert_eq!("cum_exp_var".parse::<ScreeShow>().unwrap(), ScreeShow::Cumulative);
        match "bogus".parse::<ScreeShow>() {
            Err(SpectraError::InvalidInput(message)) => {
                assert!(message.contains("'all'") && message.contains("'cum_exp_var'"));
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_scree_all_draws_two_curves_and_skips_first_cumulative_label() {
        let chart = scree_plot(&explained(&[0.6, 0.3, 0.1]), &ScreeOptions::default()).unwrap();
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].marker, Marker::Circle);
        assert_eq!(chart.series[1].marker, Marker::Square);
        assert_eq!(chart.series[1].label.as_deref(), Some("Cumulative explained variance"));
        assert_eq!(chart.annotations.len(), 3 + 2);
        assert_eq!(chart.annotations[0].text, "60.00%");
        assert_eq!(chart.annotations[3].text, "90.00%");
        // tick spacing over [-2.5, 110] is 20, so labels sit 2 units above the point
        assert_abs_diff_eq!(chart.annotations[0].y, 62.0, epsilon = 1e-9);
        assert_eq!(chart.y_axis.range, (-2.5, 110.0));
        assert_eq!(
            chart.x_axis.tick_labels.as_deref(),
            Some(&["PC1".to_string(), "PC2".to_string(), "PC3".to_string()][..])
        );
        assert_eq!(chart.legend, Some(LegendPosition::UpperRight));
    }

    #[test]
    fn test_scree_single_curve_modes_annotate_every_point() {
        let options = ScreeOptions { show: ScreeShow::Cumulative, legend: false, ..Default::default() };
        let chart = scree_plot(&explained(&[0.5, 0.25]), &options).unwrap();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].points, vec![(0.0, 50.0), (1.0, 75.0)]);
        let texts: Vec<&str> = chart.annotations.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["50.00%", "75.00%"]);
        assert_eq!(chart.legend, None);
    }

    #[test]
    fn test_scores_plot_labels_use_plotted_components() {
        let options = ScoresOptions { pc: (2, 3), ..Default::default() };
        let chart = scores_plot(&scores(), &explained(&[0.5, 0.3, 0.2]), &options).unwrap();
        assert_eq!(chart.x_axis.label, "PC2 (30.00%)");
        assert_eq!(chart.y_axis.label, "PC3 (20.00%)");
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series[1].points, vec![(4.0, 0.1)]);
        assert_eq!(chart.annotations[2].text, "c");
        // x data spans [-2, 4]; 10 % margins
        assert_abs_diff_eq!(chart.x_axis.range.0, -2.6, epsilon = 1e-12);
        assert_abs_diff_eq!(chart.x_axis.range.1, 4.6, epsilon = 1e-12);
    }

    #[test]
    fn test_scores_plot_text_offset_and_colours() {
        let options = ScoresOptions {
            text_offset: Some(0.25),
            color: Some(Rgb(1, 2, 3)),
            ..Default::default()
        };
        let chart = scores_plot(&scores(), &explained(&[0.5, 0.3, 0.2]), &options).unwrap();
        assert_abs_diff_eq!(chart.annotations[0].y, -1.75, epsilon = 1e-12);
        assert!(chart.series.iter().all(|s| s.color == Rgb(1, 2, 3)));

        let no_text = ScoresOptions { text: false, ..Default::default() };
        let chart = scores_plot(&scores(), &explained(&[0.5, 0.3, 0.2]), &no_text).unwrap();
        assert!(chart.annotations.is_empty());
        assert_ne!(chart.series[0].color, chart.series[1].color);
    }

    #[test]
    fn test_scores_plot_rejects_bad_requests() {
        let table = explained(&[0.5, 0.3, 0.2]);
        let bad_pc = ScoresOptions { pc: (1, 4), ..Default::default() };
        assert!(matches!(scores_plot(&scores(), &table, &bad_pc), Err(SpectraError::InvalidInput(_))));
        let bad_colors = ScoresOptions { colors: Some(vec![Rgb(0, 0, 0)]), ..Default::default() };
        assert!(matches!(scores_plot(&scores(), &table, &bad_colors), Err(SpectraError::InvalidInput(_))));
    }

    #[test]
    fn test_loadings_plot_defaults() {
        let loadings = scores();
        let axis = array![400.0, 500.0, 600.0];
        let chart = loadings_plot(&loadings, axis.view(), &LoadingsOptions { pc: 2, ..Default::default() }).unwrap();
        assert_eq!(chart.title, "Loadings plot");
        assert_eq!(chart.x_axis.label, "Raman shift (cm⁻¹)");
        assert_eq!(chart.y_axis.label, "PC2");
        assert_eq!(chart.series[0].points, vec![(400.0, -2.0), (500.0, 4.0), (600.0, -2.0)]);
        assert_eq!(chart.legend, None);
        assert!(chart.series[0].label.is_none());
    }

    #[test]
    fn test_loadings_plot_all_returns_one_chart_per_component() {
        let axis = array![400.0, 500.0, 600.0];
        let charts = loadings_plot_all(&scores(), axis.view(), &LoadingsOptions::default()).unwrap();
        let labels: Vec<&str> = charts.iter().map(|c| c.y_axis.label.as_str()).collect();
        assert_eq!(labels, vec!["PC1", "PC2", "PC3"]);
    }

    #[test]
    fn test_loadings_plot_validates_pc_and_axis() {
        let axis = array![400.0, 500.0, 600.0];
        let zero = LoadingsOptions { pc: 0, ..Default::default() };
        assert!(matches!(loadings_plot(&scores(), axis.view(), &zero), Err(SpectraError::InvalidInput(_))));
        let short_axis = array![1.0, 2.0];
        assert!(matches!(
            loadings_plot(&scores(), short_axis.view(), &LoadingsOptions::default()),
            Err(SpectraError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_line_plot_broadcasts_single_values() {
        let x = array![0.0, 1.0, 2.0];
        let ys = array![[1.0, 2.0, 3.0], [3.0, 2.0, 1.0]];
        let options = LineOptions {
            labels: vec!["up".into(), "down".into()],
            colors: vec![Rgb(9, 9, 9)],
            markers: vec![Marker::Triangle, Marker::Cross],
            legend: true,
            y_lim: Some((0.0, 5.0)),
            ..Default::default()
        };
        let chart = line_plot(x.view(), ys.view(), &options).unwrap();
        assert_eq!(chart.series.len(), 2);
        assert!(chart.series.iter().all(|s| s.color == Rgb(9, 9, 9)));
        assert_eq!(chart.series[1].marker, Marker::Cross);
        assert_eq!(chart.series[1].label.as_deref(), Some("down"));
        assert_eq!(chart.y_axis.range, (0.0, 5.0));
        assert_abs_diff_eq!(chart.x_axis.range.0, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_line_plot_single_spectrum_and_mismatches() {
        let x = array![0.0, 1.0];
        let y = array![5.0, 6.0];
        let chart = line_plot(x.view(), y.view().insert_axis(Axis(0)), &LineOptions::default()).unwrap();
        assert_eq!(chart.series.len(), 1);
        assert!(chart.series[0].label.is_none());

        let ys = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let two_colors = LineOptions { colors: vec![Rgb(0, 0, 0), Rgb(1, 1, 1)], ..Default::default() };
        assert!(matches!(line_plot(x.view(), ys.view(), &two_colors), Err(SpectraError::InvalidInput(_))));
        let long_x = array![0.0, 1.0, 2.0];
        assert!(matches!(
            line_plot(long_x.view(), ys.view(), &LineOptions::default()),
            Err(SpectraError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ScreeOptions = serde_json::from_str(r#"{"show":"exp_var","legend":false}"#).unwrap();
        assert_eq!(options.show, ScreeShow::ExplainedVariance);
        assert_eq!(options.title, "Scree plot");
        let scores: ScoresOptions = serde_json::from_str(r#"{"pc":[1,3]}"#).unwrap();
        assert_eq!(scores.pc, (1, 3));
        assert!(scores.text);
    }
}
