//! TopoJSON decoding.
//!
//! Turns a named geometry object of a `Topology` into one [`TopologyFeature`]
//! per geometry. Arcs are shared between neighbouring regions and may be
//! quantized (delta-encoded integers plus a `transform`); every arc is decoded
//! to absolute coordinates once and rings are stitched from those.

use crate::error::ChoroplethError;
use crate::types::TopologyFeature;
use anyhow::{anyhow, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: HashMap<String, GeometryObject>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
pub struct GeometryObject {
    /// `None` for TopoJSON null geometries
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub arcs: Option<serde_json::Value>,
    #[serde(default)]
    pub geometries: Vec<GeometryObject>,
}

impl Topology {
    /// Decode the object `name` into features, in input order.
    pub fn features(&self, name: &str) -> Result<Vec<TopologyFeature>> {
        let object = self
            .objects
            .get(name)
            .ok_or_else(|| ChoroplethError::MissingObject(name.to_string()))?;

        let arcs = self.decode_arcs()?;

        match object.kind.as_deref() {
            Some("GeometryCollection") => object
                .geometries
                .iter()
                .map(|g| feature(&arcs, g))
                .collect(),
            _ => Ok(vec![feature(&arcs, object)?]),
        }
    }

    fn decode_arcs(&self) -> Result<Vec<Vec<Coord<f64>>>> {
        self.arcs
            .iter()
            .enumerate()
            .map(|(n, arc)| {
                let mut x = 0.0;
                let mut y = 0.0;
                arc.iter()
                    .map(|position| {
                        let (px, py) = match position.as_slice() {
                            [px, py, ..] => (*px, *py),
                            _ => return Err(anyhow!("arc {} has a position with fewer than two values", n)),
                        };
                        Ok(match self.transform {
                            Some(t) => {
                                x += px;
                                y += py;
                                Coord {
                                    x: x * t.scale[0] + t.translate[0],
                                    y: y * t.scale[1] + t.translate[1],
                                }
                            }
                            None => Coord { x: px, y: py },
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }
}

fn feature(arcs: &[Vec<Coord<f64>>], object: &GeometryObject) -> Result<TopologyFeature> {
    let id = object.id.as_ref().and_then(parse_id);
    let mut polygons = Vec::new();
    collect_polygons(arcs, object, &mut polygons)
        .with_context(|| format!("Failed to decode geometry {:?}", id))?;
    Ok(TopologyFeature {
        id,
        geometry: MultiPolygon::new(polygons),
    })
}

fn parse_id(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn collect_polygons(
    arcs: &[Vec<Coord<f64>>],
    object: &GeometryObject,
    out: &mut Vec<Polygon<f64>>,
) -> Result<()> {
    match object.kind.as_deref() {
        Some("Polygon") => {
            let rings: Vec<Vec<i64>> = arc_refs(object)?;
            if let Some(p) = polygon(arcs, &rings)? {
                out.push(p);
            }
        }
        Some("MultiPolygon") => {
            let polys: Vec<Vec<Vec<i64>>> = arc_refs(object)?;
            for rings in &polys {
                if let Some(p) = polygon(arcs, rings)? {
                    out.push(p);
                }
            }
        }
        Some("GeometryCollection") => {
            for g in &object.geometries {
                collect_polygons(arcs, g, out)?;
            }
        }
        // Null geometries and point/line types carry no fillable area
        _ => {}
    }
    Ok(())
}

fn arc_refs<T: serde::de::DeserializeOwned + Default>(object: &GeometryObject) -> Result<T> {
    match &object.arcs {
        Some(v) => serde_json::from_value(v.clone()).context("Malformed arc references"),
        None => Ok(T::default()),
    }
}

fn polygon(arcs: &[Vec<Coord<f64>>], rings: &[Vec<i64>]) -> Result<Option<Polygon<f64>>> {
    let mut rings = rings
        .iter()
        .map(|r| ring(arcs, r))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter(|r| !r.0.is_empty());

    Ok(rings.next().map(|exterior| Polygon::new(exterior, rings.collect())))
}

fn ring(arcs: &[Vec<Coord<f64>>], refs: &[i64]) -> Result<LineString<f64>> {
    let mut points: Vec<Coord<f64>> = Vec::new();

    for &i in refs {
        let index = if i < 0 { !i } else { i };
        let arc = usize::try_from(index)
            .ok()
            .and_then(|idx| arcs.get(idx))
            .ok_or(ChoroplethError::ArcOutOfRange { index: i, len: arcs.len() })?;

        // Consecutive arcs share their joining point
        points.pop();
        let start = points.len();
        points.extend_from_slice(arc);
        if i < 0 {
            points[start..].reverse();
        }
    }

    if !points.is_empty() && points.len() < 4 {
        points.push(points[0]);
    }

    Ok(LineString::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(poly: &Polygon<f64>) -> Vec<(f64, f64)> {
        poly.exterior().0.iter().map(|c| (c.x, c.y)).collect()
    }

    fn square_topology(transform: &str, geometries: &str) -> Topology {
        let json = format!(
            r#"{{
                "type": "Topology",
                {transform}
                "arcs": [
                    [[0, 0], [2, 0], [0, 2]],
                    [[2, 2], [-2, 0], [0, -2]]
                ],
                "objects": {{
                    "counties": {{
                        "type": "GeometryCollection",
                        "geometries": [{geometries}]
                    }}
                }}
            }}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    const IDENTITY: &str = r#""transform": {"scale": [1, 1], "translate": [0, 0]},"#;

    #[test]
    fn stitches_arcs_into_closed_ring() {
        let topo = square_topology(IDENTITY, r#"{"type": "Polygon", "id": 1001, "arcs": [[0, 1]]}"#);
        let features = topo.features("counties").unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, Some(1001));
        let poly = &features[0].geometry.0[0];
        assert_eq!(
            coords(poly),
            vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]
        );
    }

    #[test]
    fn negative_indices_reverse_arcs() {
        let topo = square_topology(IDENTITY, r#"{"type": "Polygon", "id": "01003", "arcs": [[-2, -1]]}"#);
        let features = topo.features("counties").unwrap();

        assert_eq!(features[0].id, Some(1003));
        assert_eq!(
            coords(&features[0].geometry.0[0]),
            vec![(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0), (0.0, 0.0)]
        );
    }

    #[test]
    fn applies_quantization_transform() {
        let topo = square_topology(
            r#""transform": {"scale": [0.5, 0.25], "translate": [10, 20]},"#,
            r#"{"type": "MultiPolygon", "id": 5, "arcs": [[[0, 1]]]}"#,
        );
        let features = topo.features("counties").unwrap();
        let pts = coords(&features[0].geometry.0[0]);
        assert_eq!(pts[0], (10.0, 20.0));
        assert_eq!(pts[1], (11.0, 20.0));
        assert_eq!(pts[2], (11.0, 20.5));
    }

    #[test]
    fn untransformed_arcs_are_absolute() {
        let json = r#"{
            "type": "Topology",
            "arcs": [[[1, 1], [4, 1], [4, 5], [1, 1]]],
            "objects": {"land": {"type": "Polygon", "arcs": [[0]]}}
        }"#;
        let topo: Topology = serde_json::from_str(json).unwrap();
        let features = topo.features("land").unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, None);
        assert_eq!(
            coords(&features[0].geometry.0[0]),
            vec![(1.0, 1.0), (4.0, 1.0), (4.0, 5.0), (1.0, 1.0)]
        );
    }

    #[test]
    fn null_geometry_yields_empty_feature() {
        let topo = square_topology(IDENTITY, r#"{"type": null, "id": 42}"#);
        let features = topo.features("counties").unwrap();
        assert_eq!(features[0].id, Some(42));
        assert!(features[0].geometry.0.is_empty());
    }

    #[test]
    fn keeps_feature_order() {
        let topo = square_topology(
            IDENTITY,
            r#"{"type": "Polygon", "id": 3, "arcs": [[0, 1]]},
               {"type": "Polygon", "id": 1, "arcs": [[0, 1]]},
               {"type": "Polygon", "id": 2, "arcs": [[0, 1]]}"#,
        );
        let ids: Vec<_> = topo.features("counties").unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn missing_object_is_an_error() {
        let topo = square_topology(IDENTITY, "");
        let err = topo.features("states").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChoroplethError>(),
            Some(ChoroplethError::MissingObject(name)) if name == "states"
        ));
    }

    #[test]
    fn out_of_range_arc_is_an_error() {
        let topo = square_topology(IDENTITY, r#"{"type": "Polygon", "id": 1, "arcs": [[0, 7]]}"#);
        let err = topo.features("counties").unwrap_err();
        assert!(err
            .chain()
            .any(|e| matches!(e.downcast_ref::<ChoroplethError>(), Some(ChoroplethError::ArcOutOfRange { index: 7, len: 2 }))));
    }
}
