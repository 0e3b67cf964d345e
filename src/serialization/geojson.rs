//! Mapping between geometries and GeoJSON-shaped `serde_json::Value` trees.
//!
//! Only the value tree is handled here; turning it into JSON text is left to `serde_json`.
//! Positions are copied in order and never reprojected.
use serde_json::{Map, Value, json};

use crate::core::{GeomResult, GeometryError};
use crate::geometry::{Geometry, Properties, Shape};
use crate::points::{Coord, Dimension};
use crate::registry::GeometryType;

use super::MAX_DEPTH;

/// Options for the GeoJSON writer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeoJsonOptions {
    /// Emit a named `"crs"` member (`EPSG:<srid>`) when the geometry has an SRID
    pub write_crs: bool,
}

/// Build a geometry from a GeoJSON geometry object or Feature.
///
/// A `"crs"` member naming an EPSG code sets the SRID; any other CRS is ignored.
///
/// Examples
/// ```rust
/// use geoformat::{Coord, Shape};
/// use geoformat::serialization::read_geojson;
/// use serde_json::json;
///
/// let pt = read_geojson(&json!({"type": "Point", "coordinates": [100.0, 0.0]})).unwrap();
/// assert_eq!(pt.shape(), &Shape::Point(Some(Coord::new(100.0, 0.0))));
/// assert_eq!(pt.srid(), None);
/// ```
pub fn read_geojson(value: &Value) -> GeomResult<Geometry> {
    let res = read_object(value, 0);
    if let Err(err) = &res {
        log::debug!("Rejected GeoJSON input: {err}");
    }
    res
}

/// Build the GeoJSON geometry object for a geometry.
///
/// XYM positions are written as three numbers and read back as XYZ, since GeoJSON has no
/// measure ordinate. Non-finite ordinates become `null`.
pub fn write_geojson(geom: &Geometry, options: &GeoJsonOptions) -> Value {
    let mut obj = geometry_object(geom);
    if let (true, Some(srid)) = (options.write_crs, geom.srid()) {
        obj.insert(
            "crs".to_string(),
            json!({"type": "name", "properties": {"name": format!("EPSG:{srid}")}}),
        );
    }
    Value::Object(obj)
}

fn geometry_object(geom: &Geometry) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("type".to_string(), json!(geom.geometry_type().geojson_name()));
    match geom.shape() {
        Shape::GeometryCollection(members) => {
            let geoms = members
                .iter()
                .map(|m| Value::Object(geometry_object(m)))
                .collect();
            obj.insert("geometries".to_string(), Value::Array(geoms));
        }
        shape => {
            obj.insert("coordinates".to_string(), coordinates(shape));
        }
    }
    if !geom.properties().is_empty() {
        obj.insert(
            "properties".to_string(),
            Value::Object(geom.properties().clone()),
        );
    }
    obj
}

fn position(c: &Coord) -> Value {
    Value::Array(c.ordinates().into_iter().map(Value::from).collect())
}

fn positions(pts: &[Coord]) -> Value {
    Value::Array(pts.iter().map(position).collect())
}

fn rings(rings: &[Vec<Coord>]) -> Value {
    Value::Array(rings.iter().map(|r| positions(r)).collect())
}

fn coordinates(shape: &Shape) -> Value {
    match shape {
        Shape::Point(Some(c)) => position(c),
        Shape::Point(None) => Value::Array(Vec::new()),
        Shape::LineString(pts) | Shape::MultiPoint(pts) => positions(pts),
        Shape::Polygon(r) | Shape::MultiLineString(r) => rings(r),
        Shape::MultiPolygon(polys) => Value::Array(polys.iter().map(|p| rings(p)).collect()),
        Shape::GeometryCollection(_) => Value::Null,
    }
}

fn read_object(value: &Value, depth: usize) -> GeomResult<Geometry> {
    if depth > MAX_DEPTH {
        return Err(GeometryError::shape("geometry nesting too deep"));
    }
    let obj = value
        .as_object()
        .ok_or_else(|| GeometryError::shape("expected a GeoJSON object"))?;
    let type_name = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryError::shape("missing \"type\" member"))?;

    if type_name == "Feature" {
        let inner = match obj.get("geometry") {
            Some(Value::Null) | None => {
                return Err(GeometryError::shape("Feature without a geometry"));
            }
            Some(inner) => inner,
        };
        let geom = read_object(inner, depth + 1)?;
        let srid = geom.srid().or_else(|| obj.get("crs").and_then(srid_from_crs));
        let properties = read_properties(obj.get("properties"))?;
        return Ok(geom.with_srid(srid).with_properties(properties));
    }

    let ty = GeometryType::from_geojson_name(type_name)
        .ok_or_else(|| GeometryError::UnsupportedType(type_name.to_string()))?;

    let mut geom = if ty == GeometryType::GeometryCollection {
        let members = obj
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or_else(|| GeometryError::shape("GeometryCollection needs a \"geometries\" array"))?;
        let members = members
            .iter()
            .map(|m| read_object(m, depth + 1))
            .collect::<GeomResult<Vec<_>>>()?;
        Geometry::collection(members)
    } else {
        let coords = obj
            .get("coordinates")
            .ok_or_else(|| GeometryError::shape(format!("{ty} needs a \"coordinates\" member")))?;
        read_coordinates(ty, coords)?
    };

    if let Some(srid) = obj.get("crs").and_then(srid_from_crs) {
        geom = geom.with_srid(srid);
    }
    Ok(geom.with_properties(read_properties(obj.get("properties"))?))
}

fn read_properties(value: Option<&Value>) -> GeomResult<Properties> {
    match value {
        None | Some(Value::Null) => Ok(Properties::new()),
        Some(Value::Object(props)) => Ok(props.clone()),
        Some(_) => Err(GeometryError::shape("\"properties\" must be an object")),
    }
}

/// Read an EPSG code from a named CRS, e.g. `EPSG:4326` or `urn:ogc:def:crs:EPSG::4326`
fn srid_from_crs(crs: &Value) -> Option<u32> {
    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str);
    let Some(name) = name else {
        log::debug!("Ignoring CRS without a name: {crs}");
        return None;
    };
    if name.ends_with("CRS84") {
        return Some(4326);
    }
    let srid = name
        .to_ascii_uppercase()
        .contains("EPSG")
        .then(|| name.rsplit(':').next())
        .flatten()
        .and_then(|code| code.parse::<u32>().ok());
    if srid.is_none() {
        log::debug!("Ignoring unrecognised CRS name: {name}");
    }
    srid
}

/// Tracks the dimension shared by all positions of one geometry
struct PositionReader {
    dim: Option<Dimension>,
}

impl PositionReader {
    fn array<'v>(&self, value: &'v Value, what: &str) -> GeomResult<&'v Vec<Value>> {
        value
            .as_array()
            .ok_or_else(|| GeometryError::shape(format!("expected an array of {what}")))
    }

    fn position(&mut self, value: &Value) -> GeomResult<Coord> {
        let items = self.array(value, "numbers")?;
        let values = items
            .iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| GeometryError::shape(format!("expected a number, found {v}")))
            })
            .collect::<GeomResult<Vec<f64>>>()?;
        let found = Dimension::from_arity(values.len()).ok_or_else(|| {
            GeometryError::shape(format!(
                "position has {} numbers, expected 2 to 4",
                values.len()
            ))
        })?;
        let dim = *self.dim.get_or_insert(found);
        Coord::from_ordinates(&values, dim).ok_or_else(|| {
            GeometryError::shape(format!("mixed {dim} and {found} positions in one geometry"))
        })
    }

    fn positions(&mut self, value: &Value) -> GeomResult<Vec<Coord>> {
        self.array(value, "positions")?
            .iter()
            .map(|p| self.position(p))
            .collect()
    }

    fn rings(&mut self, value: &Value) -> GeomResult<Vec<Vec<Coord>>> {
        self.array(value, "position arrays")?
            .iter()
            .map(|r| self.positions(r))
            .collect()
    }
}

fn read_coordinates(ty: GeometryType, coords: &Value) -> GeomResult<Geometry> {
    let mut reader = PositionReader { dim: None };
    let shape = match ty {
        GeometryType::Point if reader.array(coords, "numbers")?.is_empty() => Shape::Point(None),
        GeometryType::Point => Shape::Point(Some(reader.position(coords)?)),
        GeometryType::LineString => Shape::LineString(reader.positions(coords)?),
        GeometryType::MultiPoint => Shape::MultiPoint(reader.positions(coords)?),
        GeometryType::Polygon => Shape::Polygon(reader.rings(coords)?),
        GeometryType::MultiLineString => Shape::MultiLineString(reader.rings(coords)?),
        GeometryType::MultiPolygon => {
            let polys = reader
                .array(coords, "polygons")?
                .iter()
                .map(|p| reader.rings(p))
                .collect::<GeomResult<Vec<_>>>()?;
            Shape::MultiPolygon(polys)
        }
        GeometryType::GeometryCollection => {
            return Err(GeometryError::shape(
                "GeometryCollection has no \"coordinates\"",
            ));
        }
    };
    Geometry::new(shape, reader.dim.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, rng};

    #[test]
    fn test_point_round_trip() {
        let value = json!({"type": "Point", "coordinates": [100.0, 0.0]});
        let pt = read_geojson(&value).unwrap();
        assert_eq!(pt.shape(), &Shape::Point(Some(Coord::new(100.0, 0.0))));
        assert_eq!(pt.srid(), None);
        assert_eq!(write_geojson(&pt, &GeoJsonOptions::default()), value);
    }

    #[test]
    fn test_polygon_with_properties() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [
                [[100.0, 0.0], [101.0, 0.0], [101.0, 1.0], [100.0, 1.0], [100.0, 0.0]],
                [[100.2, 0.2], [100.8, 0.2], [100.8, 0.8], [100.2, 0.2]]
            ],
            "properties": {"name": "square", "tags": [1, 2]}
        });
        let poly = read_geojson(&value).unwrap();
        assert_eq!(poly.shape().size(), 2);
        assert_eq!(poly.properties().get("name"), Some(&json!("square")));
        assert_eq!(write_geojson(&poly, &GeoJsonOptions::default()), value);
    }

    #[test]
    fn test_collection() {
        let value = json!({
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [1.0, 2.0, 3.0]},
                {"type": "MultiLineString", "coordinates": [[[0.0, 0.0], [1.0, 1.0]], []]}
            ]
        });
        let gc = read_geojson(&value).unwrap();
        match gc.shape() {
            Shape::GeometryCollection(members) => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[0].dimension(), Dimension::Xyz);
                assert_eq!(members[1].shape().size(), 2);
            }
            other => panic!("Expected a collection, got {other:?}"),
        }
        assert_eq!(gc.dimension(), Dimension::Xyz);
        assert_eq!(write_geojson(&gc, &GeoJsonOptions::default()), value);
    }

    #[test]
    fn test_feature_and_crs() {
        let value = json!({
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]},
            "properties": {"id": 7},
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}}
        });
        let ls = read_geojson(&value).unwrap();
        assert_eq!(ls.srid(), Some(3857));
        assert_eq!(ls.properties().get("id"), Some(&json!(7)));

        let options = GeoJsonOptions { write_crs: true };
        let out = write_geojson(&ls, &options);
        assert_eq!(out["crs"]["properties"]["name"], json!("EPSG:3857"));
        let back = read_geojson(&out).unwrap();
        assert_eq!(back, ls);
    }

    #[test]
    fn test_unknown_crs_is_ignored() {
        let value = json!({
            "type": "Point",
            "coordinates": [1.0, 2.0],
            "crs": {"type": "link", "properties": {"href": "http://example.com/crs"}}
        });
        assert_eq!(read_geojson(&value).unwrap().srid(), None);

        let value = json!({
            "type": "Point",
            "coordinates": [1.0, 2.0],
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:OGC:1.3:CRS84"}}
        });
        assert_eq!(read_geojson(&value).unwrap().srid(), Some(4326));
    }

    #[test]
    fn test_invalid_shapes() {
        let bad = [
            json!({"type": "Point", "coordinates": [[1.0, 2.0]]}),
            json!({"type": "Point", "coordinates": [1.0]}),
            json!({"type": "LineString", "coordinates": [1.0, 2.0]}),
            json!({"type": "LineString", "coordinates": [[1.0, 2.0], [1.0, 2.0, 3.0]]}),
            json!({"type": "Polygon", "coordinates": [[1.0, 2.0]]}),
            json!({"type": "MultiPolygon", "coordinates": [[[1.0, 2.0]]]}),
            json!({"type": "Point", "coordinates": ["a", "b"]}),
            json!({"type": "Point"}),
            json!({"type": "GeometryCollection"}),
            json!({"coordinates": [1.0, 2.0]}),
            json!({"type": "Point", "coordinates": [1.0, 2.0], "properties": 3}),
            json!({"type": "Feature", "geometry": null}),
            json!([1.0, 2.0]),
        ];
        for value in bad {
            match read_geojson(&value) {
                Err(GeometryError::InvalidShapeConfiguration(_)) => (),
                other => panic!("Accepted invalid GeoJSON {value}: {other:?}"),
            }
        }
        assert!(matches!(
            read_geojson(&json!({"type": "Circle", "coordinates": [0.0, 0.0]})),
            Err(GeometryError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let mut value = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        for _ in 0..MAX_DEPTH {
            value = json!({"type": "GeometryCollection", "geometries": [value]});
        }
        let gc = read_geojson(&value).unwrap();
        assert_eq!(gc.geometry_type(), GeometryType::GeometryCollection);

        for _ in 0..200 {
            value = json!({"type": "GeometryCollection", "geometries": [value]});
        }
        match read_geojson(&value) {
            Err(GeometryError::InvalidShapeConfiguration(msg)) => {
                assert_eq!(msg, "geometry nesting too deep")
            }
            other => panic!("Expected nesting to be rejected: {other:?}"),
        }
    }

    #[test]
    fn test_measure_is_lossy() {
        let pt = Geometry::point(Coord::xym(1.0, 2.0, 3.0));
        let out = write_geojson(&pt, &GeoJsonOptions::default());
        assert_eq!(out["coordinates"], json!([1.0, 2.0, 3.0]));
        assert_eq!(read_geojson(&out).unwrap().dimension(), Dimension::Xyz);
    }

    #[test]
    fn test_random_multipolygon() {
        let mut random = rng();
        let polys: Vec<Vec<Vec<Coord>>> = (0..5)
            .map(|_| {
                (0..3)
                    .map(|_| {
                        (0..6)
                            .map(|_| Coord::new(random.random::<f64>() * 180.0, random.random()))
                            .collect()
                    })
                    .collect()
            })
            .collect();
        let mp = Geometry::multi_polygon(polys).unwrap();
        let back = read_geojson(&write_geojson(&mp, &GeoJsonOptions::default())).unwrap();
        assert_eq!(back, mp);
    }
}
