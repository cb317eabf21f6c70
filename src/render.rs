use crate::config::{AppConfig, LayoutConfig};
use crate::data::MapData;
use crate::legend::Legend;
use crate::tooltip::{self, POINTER_OFFSET_Y, VISIBLE_OPACITY};
use anyhow::{Context, Result};
use geo::{LineString, MultiPolygon};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::fs;
use tracing::info;

pub const TITLE: &str = "United States Educational Attainment";
pub const DESCRIPTION: &str =
    "Percentage of adults age 25 and older with a bachelor's degree or higher (2010-2014)";
pub const SOURCE_LABEL: &str = "USDA Economic Research Service";
pub const SOURCE_URL: &str =
    "https://www.ers.usda.gov/data-products/county-level-data-sets/download-data.aspx";

/// One drawable county with its join already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyPath {
    pub fips: Option<u32>,
    /// Raw attribute value, empty when the county has no record
    pub education: String,
    pub fill: &'static str,
    pub d: String,
}

#[derive(Serialize)]
struct HoverEntry {
    text: String,
    education: f64,
}

/// Resolves every feature against the index, in input order.
pub fn county_paths(data: &MapData) -> Result<Vec<CountyPath>, fmt::Error> {
    data.features
        .par_iter()
        .map(|feature| -> Result<CountyPath, fmt::Error> {
            let record = data.record_for(feature);
            Ok(CountyPath {
                fips: feature.id,
                education: record
                    .map(|r| r.bachelors_or_higher.to_string())
                    .unwrap_or_default(),
                fill: record
                    .map(|r| data.scale.color(r.bachelors_or_higher))
                    .unwrap_or(""),
                d: path_data(&feature.geometry)?,
            })
        })
        .collect()
}

/// SVG path data with an identity projection: one `M..L..Z` run per ring.
pub fn path_data(geometry: &MultiPolygon<f64>) -> Result<String, fmt::Error> {
    let mut d = String::new();
    for polygon in &geometry.0 {
        write_ring(&mut d, polygon.exterior())?;
        for interior in polygon.interiors() {
            write_ring(&mut d, interior)?;
        }
    }
    Ok(d)
}

fn write_ring(d: &mut String, ring: &LineString<f64>) -> fmt::Result {
    let coords = &ring.0;
    // Closed rings repeat their first point; `Z` already covers it
    let open = match coords.split_last() {
        Some((last, rest)) if !rest.is_empty() && rest[0] == *last => rest,
        _ => coords.as_slice(),
    };
    for (i, c) in open.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        write!(d, "{}{},{}", cmd, c.x, c.y)?;
    }
    if !open.is_empty() {
        d.push('Z');
    }
    Ok(())
}

pub fn render_svg(data: &MapData, layout: &LayoutConfig, out: &mut String) -> fmt::Result {
    writeln!(
        out,
        r#"<svg width="{}" height="{}">"#,
        layout.width, layout.height
    )?;
    writeln!(
        out,
        r#"<text x="{}" y="60" text-anchor="middle" font-size="36px" font-weight="500" id="title">{}</text>"#,
        layout.width / 2.0,
        xml_escape(TITLE)
    )?;
    writeln!(
        out,
        r#"<text x="{}" y="90" text-anchor="middle" font-size="18px" id="description" style="fill: gray;" font-weight="300">{}</text>"#,
        layout.width / 2.0,
        xml_escape(DESCRIPTION)
    )?;

    Legend::new(&data.scale, &layout.legend).write_svg(out)?;

    writeln!(
        out,
        r#"<g class="counties" transform="translate(0, {})">"#,
        layout.padding_top
    )?;
    for county in county_paths(data)? {
        let fips = county.fips.map(|f| f.to_string()).unwrap_or_default();
        writeln!(
            out,
            r#"<path class="county" data-fips="{}" data-education="{}" d="{}" fill="{}"></path>"#,
            fips, county.education, county.d, county.fill
        )?;
    }
    writeln!(out, "</g>")?;
    writeln!(out, "</svg>")
}

/// Self-contained page: map, tooltip element, citation and hover script.
pub fn render_page(data: &MapData, layout: &LayoutConfig) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, r#"<html lang="en">"#)?;
    writeln!(out, "<head>")?;
    writeln!(out, r#"<meta charset="utf-8">"#)?;
    writeln!(out, "<title>{}</title>", xml_escape(TITLE))?;
    writeln!(
        out,
        "<style>body {{ font-family: sans-serif; }} #tooltip {{ color: white; pointer-events: none; }}</style>"
    )?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, r#"<div id="wrapper">"#)?;

    render_svg(data, layout, &mut out)?;

    writeln!(
        out,
        r#"<div id="tooltip" data-education="" style="position: absolute; background-color: black; padding: 8px; opacity: 0;"></div>"#
    )?;
    writeln!(
        out,
        r#"<p>Source: <a href="{}" target="_blank">{}</a></p>"#,
        xml_escape(SOURCE_URL),
        xml_escape(SOURCE_LABEL)
    )?;
    writeln!(out, "</div>")?;
    writeln!(out, "<script>")?;
    writeln!(out, "{}", hover_script(data)?)?;
    writeln!(out, "</script>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

/// Browser side of the tooltip transitions. Labels come precomputed so the
/// page only toggles visibility; counties without a record never show one.
fn hover_script(data: &MapData) -> Result<String> {
    let entries: BTreeMap<u32, HoverEntry> = data
        .features
        .iter()
        .filter_map(|f| {
            let record = data.record_for(f)?;
            Some((
                record.fips,
                HoverEntry {
                    text: tooltip::label(record),
                    education: record.bachelors_or_higher,
                },
            ))
        })
        .collect();

    // Keep `</script>` out of the embedded JSON
    let json = serde_json::to_string(&entries)?.replace('<', "\\u003c");

    Ok(format!(
        r#"const LABELS = {json};
const tooltip = document.getElementById("tooltip");
document.querySelectorAll(".county").forEach((path) => {{
  path.addEventListener("mouseover", (e) => {{
    const entry = LABELS[path.dataset.fips];
    if (!entry) return;
    tooltip.setAttribute("data-education", entry.education);
    tooltip.textContent = entry.text;
    tooltip.style.top = `${{e.pageY - {offset}}}px`;
    tooltip.style.left = `${{e.pageX}}px`;
    tooltip.style.opacity = {opacity};
  }});
  path.addEventListener("mouseout", () => {{
    tooltip.style.opacity = 0;
    tooltip.textContent = "";
    tooltip.setAttribute("data-education", "");
  }});
}});"#,
        offset = POINTER_OFFSET_Y,
        opacity = VISIBLE_OPACITY,
    ))
}

pub fn generate_page(config: &AppConfig, data: &MapData) -> Result<()> {
    let page = render_page(data, &config.layout)?;

    let path = &config.output.html;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    fs::write(path, page).with_context(|| format!("Failed to write {:?}", path))?;

    info!(path = %path.display(), counties = data.features.len(), "wrote map");
    Ok(())
}

fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
