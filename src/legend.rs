//! Vertical legend: an axis labelled at each bucket edge plus one colored
//! rectangle per bucket.

use crate::config::LegendLayout;
use crate::scale::{ColorScale, BUCKETS};
use std::fmt::{self, Write};

/// Offset subtracted from an edge before sampling the scale for a swatch.
pub const SWATCH_EPSILON: f64 = 0.1;

const TICK_SIZE: f64 = 6.0;
const TICK_PADDING: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Swatch {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: &'static str,
}

#[derive(Debug, Clone)]
pub struct Legend {
    layout: LegendLayout,
    ticks: Vec<Tick>,
    swatches: Vec<Swatch>,
}

impl Legend {
    pub fn new(scale: &ColorScale, layout: &LegendLayout) -> Self {
        let axis = AxisScale::new(scale.max(), scale.min(), layout.height);

        let ticks = scale
            .boundaries()
            .iter()
            .map(|&b| Tick {
                y: axis.apply(b),
                label: format!("{}%", b.round() as i64),
            })
            .collect();

        // One swatch per bucket, anchored at the bucket's upper edge so it
        // spans down to the lower edge; listed top to bottom
        let upper_edges = std::iter::once(scale.max())
            .chain(scale.boundaries()[1..].iter().rev().copied());
        let swatches = upper_edges
            .map(|upper| Swatch {
                x: layout.left - layout.width,
                y: axis.apply(upper) + layout.top,
                width: layout.width,
                height: layout.height / BUCKETS as f64,
                fill: scale.color(upper - SWATCH_EPSILON),
            })
            .collect();

        Self {
            layout: *layout,
            ticks,
            swatches,
        }
    }

    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    pub fn write_svg(&self, out: &mut String) -> fmt::Result {
        writeln!(out, r#"<g id="legend">"#)?;

        // Axis, right-oriented with no outer ticks
        writeln!(
            out,
            r#"<g transform="translate({}, {})" fill="none" font-size="10" font-family="sans-serif" text-anchor="start">"#,
            self.layout.left, self.layout.top
        )?;
        writeln!(
            out,
            r#"<path class="domain" stroke="currentColor" d="M0,0.5H0.5V{}H0"></path>"#,
            self.layout.height + 0.5
        )?;
        for tick in &self.ticks {
            writeln!(
                out,
                r#"<g class="tick" opacity="1" transform="translate(0,{})"><line stroke="currentColor" x2="{}"></line><text fill="currentColor" x="{}" dy="0.32em">{}</text></g>"#,
                tick.y + 0.5,
                TICK_SIZE,
                TICK_SIZE + TICK_PADDING,
                tick.label
            )?;
        }
        writeln!(out, "</g>")?;

        for s in &self.swatches {
            writeln!(
                out,
                r#"<rect class="legend-rect" width="{}" height="{}" fill="{}" y="{}" x="{}"></rect>"#,
                s.width, s.height, s.fill, s.y, s.x
            )?;
        }

        writeln!(out, "</g>")
    }
}

/// Linear map from `[d0, d1]` onto `[0, range]`.
struct AxisScale {
    d0: f64,
    d1: f64,
    range: f64,
}

impl AxisScale {
    fn new(d0: f64, d1: f64, range: f64) -> Self {
        Self { d0, d1, range }
    }

    fn apply(&self, v: f64) -> f64 {
        let span = self.d1 - self.d0;
        // Degenerate domain maps everything to the middle
        let t = if span == 0.0 { 0.5 } else { (v - self.d0) / span };
        t * self.range
    }
}
