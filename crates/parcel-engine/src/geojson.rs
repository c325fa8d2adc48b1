//! GeoJSON FeatureCollection import/export.
//!
//! Working coordinates are mapped into the output CRS through an affine
//! `CrsTransform` on export and back on import. Exported features carry a
//! `kind` tag (`boundary`, `parcel`, `hedgerow`, `watercourse`), their `id`,
//! the computed `area_sqm` or `length_m`, and any free-form metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::geom::{close_in_place, Affine2, Coord, GeomCfg};
use crate::model::{
    Boundary, Document, FeatureId, LinearFeature, LinearKind, Metadata, Parcel, RefGeometry,
    ReferenceFeature,
};

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feature {0} has no `kind` property")]
    MissingKind(usize),
    #[error("feature {index}: unknown kind `{kind}`")]
    UnknownKind { index: usize, kind: String },
    #[error("feature {index}: expected a {expected} geometry")]
    BadGeometry { index: usize, expected: &'static str },
    #[error("more than one boundary feature")]
    TwoBoundaries,
    #[error("CRS transform is not invertible")]
    SingularTransform,
}

/// Affine map from working coordinates to the output CRS, plus its name.
#[derive(Clone, Debug, PartialEq)]
pub struct CrsTransform {
    pub name: Option<String>,
    to_output: Affine2,
    from_output: Affine2,
}

impl Default for CrsTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl CrsTransform {
    pub fn identity() -> Self {
        Self {
            name: None,
            to_output: Affine2::identity(),
            from_output: Affine2::identity(),
        }
    }

    pub fn new(name: Option<String>, to_output: Affine2) -> Result<Self, GeoJsonError> {
        let from_output = to_output.inverse().ok_or(GeoJsonError::SingularTransform)?;
        Ok(Self {
            name,
            to_output,
            from_output,
        })
    }

    pub fn to_output(&self, c: Coord) -> [f64; 2] {
        let p = self.to_output.apply(c);
        [p.x, p.y]
    }

    pub fn from_output(&self, p: [f64; 2]) -> Coord {
        self.from_output.apply(Coord::new(p[0], p[1]))
    }
}

pub type Position = [f64; 2];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPoint { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CollectionTag {
    #[default]
    FeatureCollection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub tag: FeatureTag,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub tag: CollectionTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<Value>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_json_str(s: &str) -> Result<Self, GeoJsonError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> Result<String, GeoJsonError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

const KIND: &str = "kind";
const ID: &str = "id";
const COLOR: &str = "colorIndex";
const AREA: &str = "area_sqm";
const LENGTH: &str = "length_m";

fn properties(metadata: &Metadata, kind: &str, id: Option<FeatureId>) -> Map<String, Value> {
    let mut props = metadata.clone();
    props.insert(KIND.into(), Value::from(kind));
    if let Some(id) = id {
        props.insert(ID.into(), Value::from(id.0));
    }
    props
}

fn strip_reserved(mut props: Map<String, Value>) -> Metadata {
    for key in [KIND, ID, COLOR, AREA, LENGTH] {
        props.remove(key);
    }
    props
}

fn polygon(ring: &[Coord], crs: &CrsTransform) -> Geometry {
    Geometry::Polygon {
        coordinates: vec![ring.iter().map(|&c| crs.to_output(c)).collect()],
    }
}

/// Export every editable feature.
pub fn export_document(doc: &Document, crs: &CrsTransform) -> FeatureCollection {
    let mut features = Vec::new();
    if let Some(b) = &doc.boundary {
        let mut props = properties(&b.metadata, "boundary", None);
        props.insert(AREA.into(), Value::from(b.area()));
        features.push(Feature {
            tag: FeatureTag::Feature,
            geometry: Some(polygon(&b.ring, crs)),
            properties: props,
        });
    }
    for p in &doc.parcels {
        let mut props = properties(&p.metadata, "parcel", Some(p.id));
        props.insert(COLOR.into(), Value::from(p.color_index));
        props.insert(AREA.into(), Value::from(p.area()));
        features.push(Feature {
            tag: FeatureTag::Feature,
            geometry: Some(polygon(&p.ring, crs)),
            properties: props,
        });
    }
    for f in doc.hedgerows.iter().chain(doc.watercourses.iter()) {
        let mut props = properties(&f.metadata, f.kind.as_str(), Some(f.id));
        props.insert(LENGTH.into(), Value::from(f.length()));
        features.push(Feature {
            tag: FeatureTag::Feature,
            geometry: Some(Geometry::LineString {
                coordinates: f.coordinates.iter().map(|&c| crs.to_output(c)).collect(),
            }),
            properties: props,
        });
    }
    debug!(features = features.len(), "document exported");
    FeatureCollection {
        tag: CollectionTag::FeatureCollection,
        crs: crs.name.as_ref().map(|name| {
            serde_json::json!({ "type": "name", "properties": { "name": name } })
        }),
        features,
    }
}

fn exterior(
    index: usize,
    g: Option<&Geometry>,
    crs: &CrsTransform,
    cfg: GeomCfg,
) -> Result<Vec<Coord>, GeoJsonError> {
    match g {
        Some(Geometry::Polygon { coordinates }) if !coordinates.is_empty() => {
            if coordinates.len() > 1 {
                warn!(index, holes = coordinates.len() - 1, "polygon holes dropped on import");
            }
            let mut ring = convert(&coordinates[0], crs);
            close_in_place(&mut ring, cfg.eps);
            Ok(ring)
        }
        _ => Err(GeoJsonError::BadGeometry {
            index,
            expected: "Polygon",
        }),
    }
}

/// Rebuild a document from an export. Ids are kept; features without one get fresh ids.
pub fn import_document(
    fc: &FeatureCollection,
    crs: &CrsTransform,
    cfg: GeomCfg,
) -> Result<Document, GeoJsonError> {
    let mut doc = Document::new();
    // ids first, so that fresh ids never collide with imported ones
    for f in &fc.features {
        if let Some(id) = f.properties.get(ID).and_then(Value::as_u64) {
            doc.reserve_id(FeatureId(id));
        }
    }
    for (index, f) in fc.features.iter().enumerate() {
        let kind = f
            .properties
            .get(KIND)
            .and_then(Value::as_str)
            .ok_or(GeoJsonError::MissingKind(index))?;
        let id = f.properties.get(ID).and_then(Value::as_u64).map(FeatureId);
        let metadata = strip_reserved(f.properties.clone());
        match kind {
            "boundary" => {
                if doc.boundary.is_some() {
                    return Err(GeoJsonError::TwoBoundaries);
                }
                let ring = exterior(index, f.geometry.as_ref(), crs, cfg)?;
                doc.boundary = Some(Boundary { ring, metadata });
            }
            "parcel" => {
                let ring = exterior(index, f.geometry.as_ref(), crs, cfg)?;
                let color_index = f
                    .properties
                    .get(COLOR)
                    .and_then(Value::as_u64)
                    .map_or(doc.parcels.len(), |c| c as usize);
                let id = id.unwrap_or_else(|| doc.allocate_id());
                doc.restore_parcel(Parcel {
                    id,
                    ring,
                    color_index,
                    metadata,
                });
            }
            "hedgerow" | "watercourse" => {
                let kind = if kind == "hedgerow" {
                    LinearKind::Hedgerow
                } else {
                    LinearKind::Watercourse
                };
                let Some(Geometry::LineString { coordinates }) = &f.geometry else {
                    return Err(GeoJsonError::BadGeometry {
                        index,
                        expected: "LineString",
                    });
                };
                let coordinates = convert(coordinates, crs);
                let id = id.unwrap_or_else(|| doc.allocate_id());
                doc.linear_mut(kind).push(LinearFeature {
                    id,
                    kind,
                    coordinates,
                    metadata,
                });
            }
            other => {
                return Err(GeoJsonError::UnknownKind {
                    index,
                    kind: other.to_string(),
                })
            }
        }
    }
    debug!(
        parcels = doc.parcels.len(),
        boundary = doc.boundary.is_some(),
        "document imported"
    );
    Ok(doc)
}

fn convert(ps: &[Position], crs: &CrsTransform) -> Vec<Coord> {
    ps.iter().map(|&p| crs.from_output(p)).collect()
}

/// Reference features from a plain FeatureCollection. The layer type is read
/// from the `layer` property, else `default_layer`. Features without geometry
/// are skipped.
pub fn read_reference_features(
    fc: &FeatureCollection,
    crs: &CrsTransform,
    default_layer: &str,
) -> Vec<ReferenceFeature> {
    fc.features
        .iter()
        .enumerate()
        .filter_map(|(i, f)| {
            let geometry = match f.geometry.as_ref()? {
                Geometry::Point { coordinates } => {
                    RefGeometry::Point(crs.from_output(*coordinates))
                }
                Geometry::LineString { coordinates } => {
                    RefGeometry::LineString(convert(coordinates, crs))
                }
                Geometry::Polygon { coordinates } => {
                    RefGeometry::Polygon(convert(coordinates.first()?, crs))
                }
                Geometry::MultiPoint { coordinates } => {
                    RefGeometry::MultiPoint(convert(coordinates, crs))
                }
                Geometry::MultiLineString { coordinates } => RefGeometry::MultiLineString(
                    coordinates.iter().map(|l| convert(l, crs)).collect(),
                ),
                Geometry::MultiPolygon { coordinates } => RefGeometry::MultiPolygon(
                    coordinates
                        .iter()
                        .filter_map(|poly| poly.first().map(|r| convert(r, crs)))
                        .collect(),
                ),
            };
            let layer = f
                .properties
                .get("layer")
                .and_then(Value::as_str)
                .unwrap_or(default_layer)
                .to_string();
            let id = f
                .properties
                .get(ID)
                .and_then(Value::as_u64)
                .unwrap_or(i as u64 + 1);
            Some(ReferenceFeature {
                id: FeatureId(id),
                layer,
                geometry,
            })
        })
        .collect()
}

/// Area and length totals of an export, as written in its properties.
pub fn summarize(fc: &FeatureCollection) -> (f64, f64) {
    fc.features.iter().fold((0.0, 0.0), |(area, len), f| {
        let kind = f.properties.get(KIND).and_then(Value::as_str);
        let a = match kind {
            Some("parcel") => f.properties.get(AREA).and_then(Value::as_f64).unwrap_or(0.0),
            _ => 0.0,
        };
        let l = f.properties.get(LENGTH).and_then(Value::as_f64).unwrap_or(0.0);
        (area + a, len + l)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{line_length, ring_area};
    use nalgebra::vector;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.boundary = Some(Boundary::new(vec![
            vector![0.0, 0.0],
            vector![10.0, 0.0],
            vector![10.0, 10.0],
            vector![0.0, 10.0],
            vector![0.0, 0.0],
        ]));
        let mut meta = Metadata::new();
        meta.insert("crop".into(), Value::from("wheat"));
        doc.push_parcel(
            vec![
                vector![0.0, 0.0],
                vector![5.0, 0.0],
                vector![5.0, 10.0],
                vector![0.0, 10.0],
                vector![0.0, 0.0],
            ],
            meta,
            8,
        );
        let id = doc.allocate_id();
        doc.hedgerows.push(LinearFeature {
            id,
            kind: LinearKind::Hedgerow,
            coordinates: vec![vector![6.0, 1.0], vector![6.0, 9.0]],
            metadata: Metadata::new(),
        });
        doc
    }

    #[test]
    fn export_carries_measures_and_crs() {
        let crs = CrsTransform::new(
            Some("EPSG:27700".into()),
            Affine2::scale_translate(1.0, vector![400_000.0, 300_000.0]),
        )
        .unwrap();
        let fc = export_document(&sample(), &crs);
        assert_eq!(fc.features.len(), 3);
        let parcel = &fc.features[1];
        assert_eq!(parcel.properties["kind"], "parcel");
        assert_eq!(parcel.properties["area_sqm"], 50.0);
        assert_eq!(parcel.properties["crop"], "wheat");
        let Some(Geometry::Polygon { coordinates }) = &parcel.geometry else {
            panic!("parcel exported without polygon");
        };
        assert_eq!(coordinates[0][1], [400_005.0, 300_000.0]);
        assert_eq!(summarize(&fc), (50.0, 8.0));
        let json = fc.to_json_string().unwrap();
        assert!(json.contains("\"EPSG:27700\""));
        assert!(json.contains("\"type\": \"FeatureCollection\""));
    }

    #[test]
    fn import_restores_ids_and_metadata() {
        let doc = sample();
        let crs =
            CrsTransform::new(None, Affine2::scale_translate(2.0, vector![1.0, 1.0])).unwrap();
        let json = export_document(&doc, &crs).to_json_string().unwrap();
        let fc = FeatureCollection::from_json_str(&json).unwrap();
        let mut back = import_document(&fc, &crs, GeomCfg::default()).unwrap();
        assert_eq!(back.parcels[0].id, doc.parcels[0].id);
        assert_eq!(back.parcels[0].metadata.get("crop"), Some(&Value::from("wheat")));
        assert!(back.parcels[0].metadata.get("area_sqm").is_none());
        assert!((back.parcels[0].ring[2] - vector![5.0, 10.0]).norm() < 1e-9);
        assert_eq!(back.hedgerows.len(), 1);
        assert!((ring_area(&back.boundary.as_ref().unwrap().ring) - 100.0).abs() < 1e-9);
        assert!((line_length(&back.hedgerows[0].coordinates) - 8.0).abs() < 1e-9);
        let fresh = back.allocate_id();
        assert!(fresh > doc.hedgerows[0].id);
    }

    #[test]
    fn import_rejects_unknown_kind() {
        let fc = FeatureCollection::from_json_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":null,"properties":{"kind":"pond"}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            import_document(&fc, &CrsTransform::identity(), GeomCfg::default()),
            Err(GeoJsonError::UnknownKind { index: 0, .. })
        ));
    }

    #[test]
    fn reference_layers_from_properties() {
        let fc = FeatureCollection::from_json_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"layer":"field"},
                 "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
                {"type":"Feature","properties":{},
                 "geometry":{"type":"MultiLineString","coordinates":[[[0,0],[1,1]],[[2,2],[3,3]]]}},
                {"type":"Feature","properties":{},"geometry":null}]}"#,
        )
        .unwrap();
        let refs = read_reference_features(&fc, &CrsTransform::identity(), "misc");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].layer, "field");
        assert_eq!(refs[1].layer, "misc");
        assert_eq!(refs[1].geometry.parts().len(), 2);
    }
}
