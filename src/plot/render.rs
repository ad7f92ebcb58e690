// src/plot/render.rs

use std::fmt;
use std::io::{self, Write};
use std::ops::Range;

use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{Chart, LegendPosition, Marker, Rgb, SeriesKind};
use crate::error::{Result, SpectraError};

const LEGEND_SAMPLE_WIDTH: i32 = 20;

fn render_error<E: fmt::Display>(error: E) -> SpectraError {
    SpectraError::Render(error.to_string())
}

fn axis_range((lo, hi): (f64, f64)) -> Range<f64> {
    if hi > lo {
        lo..hi
    } else {
        (lo - 0.5)..(lo + 0.5)
    }
}

fn color_of(rgb: Rgb, alpha: f64) -> RGBAColor {
    RGBColor(rgb.0, rgb.1, rgb.2).mix(alpha.clamp(0.0, 1.0))
}

fn categorical_label(labels: &[String], value: f64) -> String {
    let position = value.round();
    if (value - position).abs() > 1e-6 || position < 0.0 {
        return String::new();
    }
    labels.get(position as usize).cloned().unwrap_or_default()
}

fn numeric_label(value: f64) -> String {
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

impl From<LegendPosition> for SeriesLabelPosition {
    fn from(position: LegendPosition) -> Self {
        match position {
            LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
            LegendPosition::LowerLeft => SeriesLabelPosition::LowerLeft,
            LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
        }
    }
}

impl Chart {
    /// Renders the chart as an SVG document.
    pub fn to_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.size).into_drawing_area();
            self.draw_on(&root)?;
            root.present().map_err(render_error)?;
        }
        debug!(
            "Rendered chart '{}' ({} series, {} annotations) to {} bytes of SVG.",
            self.title,
            self.series.len(),
            self.annotations.len(),
            svg.len()
        );
        Ok(svg)
    }

    /// Writes the chart to stdout as an `image/svg+xml` block understood by the
    /// evcxr Jupyter kernel.
    pub fn evcxr_display(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.write_evcxr(&mut handle)
    }

    pub(crate) fn write_evcxr<W: Write>(&self, out: &mut W) -> Result<()> {
        let svg = self.to_svg()?;
        writeln!(out, "EVCXR_BEGIN_CONTENT image/svg+xml")?;
        writeln!(out, "{}", svg)?;
        writeln!(out, "EVCXR_END_CONTENT")?;
        out.flush()?;
        Ok(())
    }

    fn draw_on<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE).map_err(render_error)?;

        let mut chart = ChartBuilder::on(root)
            .caption(self.title.as_str(), ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(65)
            .build_cartesian_2d(axis_range(self.x_axis.range), axis_range(self.y_axis.range))
            .map_err(render_error)?;

        let categorical_x = |value: &f64| {
            categorical_label(self.x_axis.tick_labels.as_deref().unwrap_or(&[]), *value)
        };
        let numeric = |value: &f64| numeric_label(*value);

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(self.x_axis.label.as_str())
            .y_desc(self.y_axis.label.as_str())
            .y_label_formatter(&numeric);
        match &self.x_axis.tick_labels {
            Some(labels) => {
                mesh.x_labels(labels.len().max(1) * 2 + 1)
                    .x_label_formatter(&categorical_x);
            }
            None => {
                mesh.x_label_formatter(&numeric);
            }
        }
        mesh.draw().map_err(render_error)?;

        for series in &self.series {
            let color = color_of(series.color, series.alpha);
            let line_style = ShapeStyle::from(&color).stroke_width(2);
            let fill_style = color.filled();
            let size = series.marker_size as i32;

            if series.kind == SeriesKind::Line {
                chart
                    .draw_series(LineSeries::new(series.points.iter().copied(), line_style))
                    .map_err(render_error)?;
            }

            let marker = match (series.kind, series.marker) {
                (SeriesKind::Scatter, Marker::None) => Marker::Circle,
                (_, marker) => marker,
            };
            let points = series.points.iter().copied();
            match marker {
                Marker::None => Ok(()),
                Marker::Circle => chart
                    .draw_series(points.map(|p| Circle::new(p, size, fill_style)))
                    .map(|_| ()),
                Marker::Square => chart
                    .draw_series(points.map(|p| {
                        EmptyElement::at(p) + Rectangle::new([(-size, -size), (size, size)], fill_style)
                    }))
                    .map(|_| ()),
                Marker::Triangle => chart
                    .draw_series(points.map(|p| TriangleMarker::new(p, size, fill_style)))
                    .map(|_| ()),
                Marker::Cross => chart
                    .draw_series(points.map(|p| Cross::new(p, size, line_style)))
                    .map(|_| ()),
            }
            .map_err(render_error)?;

            if let Some(label) = &series.label {
                let entry = chart
                    .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
                    .map_err(render_error)?
                    .label(label.as_str());
                match series.kind {
                    SeriesKind::Line => {
                        entry.legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + LEGEND_SAMPLE_WIDTH, y)], line_style)
                        });
                    }
                    SeriesKind::Scatter => {
                        entry.legend(move |(x, y)| {
                            Circle::new((x + LEGEND_SAMPLE_WIDTH / 2, y), 4, fill_style)
                        });
                    }
                }
            }
        }

        for annotation in &self.annotations {
            let style = ("sans-serif", f64::from(annotation.font_size))
                .into_font()
                .color(&BLACK.mix(annotation.alpha.clamp(0.0, 1.0)))
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            chart
                .draw_series(std::iter::once(Text::new(
                    annotation.text.clone(),
                    (annotation.x, annotation.y),
                    style,
                )))
                .map_err(render_error)?;
        }

        if let Some(position) = self.legend {
            if self.series.iter().any(|s| s.label.is_some()) {
                chart
                    .configure_series_labels()
                    .position(position.into())
                    .background_style(WHITE.mix(0.75))
                    .border_style(BLACK)
                    .draw()
                    .map_err(render_error)?;
            }
        }

        Ok(())
    }
}
