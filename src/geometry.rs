use super::core::{GeomResult, GeometryError, display_for_geom};
use super::points::{Coord, Dimension};
use super::registry::GeometryType;
use super::serialization::wkt::{WktOptions, write_wkt};

/// Open property bag carried through the GeoJSON mapping
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Coordinate payload of a geometry, one variant per geometry type.
///
/// Polygon rings are stored exterior ring first. Closure and winding order are not checked.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// A point; None is the empty point
    Point(Option<Coord>),
    LineString(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Shape {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Shape::Point(_) => GeometryType::Point,
            Shape::LineString(_) => GeometryType::LineString,
            Shape::Polygon(_) => GeometryType::Polygon,
            Shape::MultiPoint(_) => GeometryType::MultiPoint,
            Shape::MultiLineString(_) => GeometryType::MultiLineString,
            Shape::MultiPolygon(_) => GeometryType::MultiPolygon,
            Shape::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    /// Empty payload for the given type
    pub fn empty(ty: GeometryType) -> Self {
        match ty {
            GeometryType::Point => Shape::Point(None),
            GeometryType::LineString => Shape::LineString(Vec::new()),
            GeometryType::Polygon => Shape::Polygon(Vec::new()),
            GeometryType::MultiPoint => Shape::MultiPoint(Vec::new()),
            GeometryType::MultiLineString => Shape::MultiLineString(Vec::new()),
            GeometryType::MultiPolygon => Shape::MultiPolygon(Vec::new()),
            GeometryType::GeometryCollection => Shape::GeometryCollection(Vec::new()),
        }
    }

    /// Number of top-level members: points, rings, or member geometries. 1 for a point.
    pub fn size(&self) -> usize {
        match self {
            Shape::Point(c) => usize::from(c.is_some()),
            Shape::LineString(pts) | Shape::MultiPoint(pts) => pts.len(),
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => rings.len(),
            Shape::MultiPolygon(polys) => polys.len(),
            Shape::GeometryCollection(geoms) => geoms.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // Coordinates owned directly by this shape (collection members excluded)
    fn own_coords(&self) -> Vec<&Coord> {
        match self {
            Shape::Point(c) => c.iter().collect(),
            Shape::LineString(pts) | Shape::MultiPoint(pts) => pts.iter().collect(),
            Shape::Polygon(rings) | Shape::MultiLineString(rings) => rings.iter().flatten().collect(),
            Shape::MultiPolygon(polys) => polys.iter().flatten().flatten().collect(),
            Shape::GeometryCollection(_) => Vec::new(),
        }
    }
}

/// A geometry value: shape, dimension, optional SRID and a property bag.
///
/// Values are immutable once built; the `with_*` methods return a new value.
///
/// Examples
/// ```rust
/// use geoformat::{Coord, Dimension, Geometry, GeometryType};
///
/// let line = Geometry::line_string(vec![Coord::xyz(0.0, 0.0, 1.0), Coord::xyz(1.0, 1.0, 2.0)])
///     .unwrap()
///     .with_srid(4326);
/// assert_eq!(line.geometry_type(), GeometryType::LineString);
/// assert_eq!(line.dimension(), Dimension::Xyz);
/// assert_eq!(line.srid(), Some(4326));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    shape: Shape,
    dimension: Dimension,
    srid: Option<u32>,
    properties: Properties,
}

impl Geometry {
    /// Instantiate a geometry from a shape and its declared dimension.
    ///
    /// Every coordinate of the shape must have the declared dimension. Members of a geometry
    /// collection keep their own dimension and are not checked.
    pub fn new(shape: Shape, dimension: Dimension) -> GeomResult<Self> {
        if let Some(found) = shape
            .own_coords()
            .into_iter()
            .map(Coord::dimension)
            .find(|d| *d != dimension)
        {
            return Err(GeometryError::DimensionMismatch {
                expected: dimension,
                found,
                offset: 0,
            });
        }
        Ok(Self {
            shape,
            dimension,
            srid: None,
            properties: Properties::new(),
        })
    }

    // Dimension taken from the first coordinate, XY if there is none
    fn inferred(shape: Shape) -> GeomResult<Self> {
        let dim = shape
            .own_coords()
            .first()
            .map(|c| c.dimension())
            .unwrap_or_default();
        Self::new(shape, dim)
    }

    /// An empty geometry of the given type and dimension
    pub fn empty(ty: GeometryType, dimension: Dimension) -> Self {
        Self {
            shape: Shape::empty(ty),
            dimension,
            srid: None,
            properties: Properties::new(),
        }
    }

    pub fn point(coord: Coord) -> Self {
        Self {
            dimension: coord.dimension(),
            shape: Shape::Point(Some(coord)),
            srid: None,
            properties: Properties::new(),
        }
    }

    pub fn line_string(points: Vec<Coord>) -> GeomResult<Self> {
        Self::inferred(Shape::LineString(points))
    }

    pub fn polygon(rings: Vec<Vec<Coord>>) -> GeomResult<Self> {
        Self::inferred(Shape::Polygon(rings))
    }

    pub fn multi_point(points: Vec<Coord>) -> GeomResult<Self> {
        Self::inferred(Shape::MultiPoint(points))
    }

    pub fn multi_line_string(lines: Vec<Vec<Coord>>) -> GeomResult<Self> {
        Self::inferred(Shape::MultiLineString(lines))
    }

    pub fn multi_polygon(polygons: Vec<Vec<Vec<Coord>>>) -> GeomResult<Self> {
        Self::inferred(Shape::MultiPolygon(polygons))
    }

    /// A geometry collection. Its dimension is that of the first member, XY if empty.
    pub fn collection(members: Vec<Geometry>) -> Self {
        let dimension = members.first().map(|g| g.dimension).unwrap_or_default();
        Self {
            shape: Shape::GeometryCollection(members),
            dimension,
            srid: None,
            properties: Properties::new(),
        }
    }

    /// Return a copy with the SRID set, or cleared when given None
    pub fn with_srid(mut self, srid: impl Into<Option<u32>>) -> Self {
        self.srid = srid.into();
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn into_shape(self) -> Shape {
        self.shape
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.shape.geometry_type()
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn srid(&self) -> Option<u32> {
        self.srid
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// WKT representation with default options (EWKT when an SRID is set)
    pub fn wkt(&self) -> String {
        write_wkt(self, &WktOptions::default())
    }
}

display_for_geom!(Geometry);
