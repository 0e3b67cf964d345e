//! Mapping between geometry types and their WKT keywords, WKB type codes and GeoJSON names.
//!
//! WKB codes are `base + offset` where the base identifies the shape (Point=1 ..
//! GeometryCollection=7) and the offset the dimension (0, 1000, 2000, 3000 for XY, XYZ, XYM,
//! XYZM). PostGIS EWKB instead marks Z and M with high bits. Both are recognised on decode.
//! The EWKB SRID flag can accompany either form.
use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::core::{GeomResult, GeometryError};
use super::points::Dimension;

pub const Z_FLAG_BIT: u32 = 0x8000_0000;
pub const M_FLAG_BIT: u32 = 0x4000_0000;
pub const SRID_FLAG_BIT: u32 = 0x2000_0000;

const FLAG_MASK: u32 = Z_FLAG_BIT | M_FLAG_BIT | SRID_FLAG_BIT;

/// The shapes a geometry value can take, with their base WKB code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum GeometryType {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
}

/// Every geometry type, in base code order
pub const GEOMETRY_TYPES: [GeometryType; 7] = [
    GeometryType::Point,
    GeometryType::LineString,
    GeometryType::Polygon,
    GeometryType::MultiPoint,
    GeometryType::MultiLineString,
    GeometryType::MultiPolygon,
    GeometryType::GeometryCollection,
];

/// Every dimension, in offset order
pub const DIMENSIONS: [Dimension; 4] = [
    Dimension::Xy,
    Dimension::Xyz,
    Dimension::Xym,
    Dimension::Xyzm,
];

/// How the dimension of a geometry is written next to its WKT keyword
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DimensionStyle {
    /// `POINT Z (1 2 3)`, `POINT M (1 2 3)`, `POINT ZM (1 2 3 4)`
    #[default]
    Iso,
    /// `POINT(1 2 3)`, `POINTM(1 2 3)`, `POINT(1 2 3 4)`. Empty Z and ZM geometries are
    /// written `POINT Z EMPTY` / `POINT ZM EMPTY`, since there is no arity to imply them.
    PostGis,
}

/// How the dimension of a geometry is folded into its WKB type code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TypeCodeStyle {
    /// `base + 1000 / 2000 / 3000`
    #[default]
    IsoOffsets,
    /// `base | 0x80000000 (Z) | 0x40000000 (M)`
    ExtendedFlags,
}

/// Everything a WKB type code says about the geometry that follows it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WkbTypeInfo {
    pub geometry_type: GeometryType,
    pub dimension: Dimension,
    pub has_srid: bool,
    /// Convention the code was written in. XY codes are the same in both and report offsets.
    pub type_code_style: TypeCodeStyle,
}

impl GeometryType {
    pub fn wkt_keyword(&self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
            GeometryType::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }

    pub fn geojson_name(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        }
    }

    /// Resolve a bare WKT keyword (no dimension suffix), ignoring case
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        GEOMETRY_TYPES
            .into_iter()
            .find(|t| t.wkt_keyword().eq_ignore_ascii_case(keyword))
    }

    /// Resolve a GeoJSON `"type"` member. GeoJSON names are case-sensitive.
    pub fn from_geojson_name(name: &str) -> Option<Self> {
        GEOMETRY_TYPES.into_iter().find(|t| t.geojson_name() == name)
    }

    /// Return true for types whose body is a list of member geometries in WKB
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            GeometryType::MultiPoint
                | GeometryType::MultiLineString
                | GeometryType::MultiPolygon
                | GeometryType::GeometryCollection
        )
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.geojson_name())
    }
}

/// Split a WKT keyword such as `POINTZM` or `MULTIPOINTM` into type and dimension suffix.
///
/// Returns None for unknown keywords. The suffix is None when the keyword carries none.
pub fn split_keyword(word: &str) -> Option<(GeometryType, Option<Dimension>)> {
    if let Some(ty) = GeometryType::from_keyword(word) {
        return Some((ty, None));
    }
    let upper = word.to_ascii_uppercase();
    for (suffix, dim) in [
        ("ZM", Dimension::Xyzm),
        ("Z", Dimension::Xyz),
        ("M", Dimension::Xym),
    ] {
        if let Some(base) = upper.strip_suffix(suffix) {
            if let Some(ty) = GeometryType::from_keyword(base) {
                return Some((ty, Some(dim)));
            }
        }
    }
    None
}

/// Parse a standalone dimension token (`Z`, `M`, `ZM`), ignoring case
pub fn dimension_from_token(token: &str) -> Option<Dimension> {
    match token.to_ascii_uppercase().as_str() {
        "Z" => Some(Dimension::Xyz),
        "M" => Some(Dimension::Xym),
        "ZM" => Some(Dimension::Xyzm),
        _ => None,
    }
}

/// WKT tag (keyword plus dimension marker) for a geometry, without the coordinates.
///
/// Examples
/// ```rust
/// use geoformat::{Dimension, DimensionStyle, GeometryType};
/// use geoformat::registry::wkt_tag;
///
/// assert_eq!(wkt_tag(GeometryType::Point, Dimension::Xym, DimensionStyle::Iso), "POINT M");
/// assert_eq!(wkt_tag(GeometryType::Point, Dimension::Xym, DimensionStyle::PostGis), "POINTM");
/// assert_eq!(wkt_tag(GeometryType::Point, Dimension::Xyz, DimensionStyle::PostGis), "POINT");
/// ```
pub fn wkt_tag(ty: GeometryType, dim: Dimension, style: DimensionStyle) -> String {
    let keyword = ty.wkt_keyword();
    match (style, dim) {
        (_, Dimension::Xy) => keyword.to_string(),
        (DimensionStyle::Iso, Dimension::Xyz) => format!("{keyword} Z"),
        (DimensionStyle::Iso, Dimension::Xym) => format!("{keyword} M"),
        (DimensionStyle::Iso, Dimension::Xyzm) => format!("{keyword} ZM"),
        (DimensionStyle::PostGis, Dimension::Xym) => format!("{keyword}M"),
        (DimensionStyle::PostGis, _) => keyword.to_string(),
    }
}

/// Compute the WKB type code for a geometry header
pub fn wkb_code(ty: GeometryType, dim: Dimension, style: TypeCodeStyle, has_srid: bool) -> u32 {
    let base: u32 = ty.into();
    let mut code = match style {
        TypeCodeStyle::IsoOffsets => {
            let offset = match dim {
                Dimension::Xy => 0,
                Dimension::Xyz => 1000,
                Dimension::Xym => 2000,
                Dimension::Xyzm => 3000,
            };
            base + offset
        }
        TypeCodeStyle::ExtendedFlags => {
            let mut code = base;
            if dim.has_z() {
                code |= Z_FLAG_BIT;
            }
            if dim.has_m() {
                code |= M_FLAG_BIT;
            }
            code
        }
    };
    if has_srid {
        code |= SRID_FLAG_BIT;
    }
    code
}

/// Decode a WKB type code, accepting both ISO offsets and EWKB flag bits.
pub fn decode_wkb_code(code: u32) -> GeomResult<WkbTypeInfo> {
    let unsupported = || GeometryError::UnsupportedType(format!("WKB type code {code:#010x}"));

    let has_z_flag = code & Z_FLAG_BIT != 0;
    let has_m_flag = code & M_FLAG_BIT != 0;
    let has_srid = code & SRID_FLAG_BIT != 0;
    let rest = code & !FLAG_MASK;

    let (base, dimension, type_code_style) = if has_z_flag || has_m_flag {
        // Flags and offsets together are not a valid combination
        if rest >= 1000 {
            return Err(unsupported());
        }
        (
            rest,
            Dimension::from_flags(has_z_flag, has_m_flag),
            TypeCodeStyle::ExtendedFlags,
        )
    } else {
        let dim = match rest / 1000 {
            0 => Dimension::Xy,
            1 => Dimension::Xyz,
            2 => Dimension::Xym,
            3 => Dimension::Xyzm,
            _ => return Err(unsupported()),
        };
        (rest % 1000, dim, TypeCodeStyle::IsoOffsets)
    };

    let geometry_type = GeometryType::try_from_primitive(base).map_err(|_| unsupported())?;
    Ok(WkbTypeInfo {
        geometry_type,
        dimension,
        has_srid,
        type_code_style,
    })
}
