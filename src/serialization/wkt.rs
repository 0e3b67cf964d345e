use super::{MAX_DEPTH, ParserResult};
use crate::core::{GeomResult, GeometryError};
use crate::geometry::{Geometry, Shape};
use crate::points::{Coord, Dimension};
use crate::registry::{self, DimensionStyle, GeometryType};
use regex::Regex;
use std::sync::OnceLock;

const NUMBER: &str = r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?|(?i:nan|[+-]?inf(?:inity)?))";
const WORD: &str = r"^\s*([A-Za-z]+)";
const SRID_PREFIX: &str = r"(?i)^\s*SRID\s*=\s*(-?\d+)\s*;";

static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static WORD_RE: OnceLock<Regex> = OnceLock::new();
static SRID_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

const EMPTY: &str = "EMPTY";

/// Options for the WKT writer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WktOptions {
    pub dimension_style: DimensionStyle,
}

// Get number regex once to avoid recompilation (thread-safe)
fn number_re() -> &'static Regex {
    NUMBER_RE.get_or_init(|| Regex::new(NUMBER).expect("valid number pattern"))
}

// Get keyword regex once to avoid recompilation (thread-safe)
fn word_re() -> &'static Regex {
    WORD_RE.get_or_init(|| Regex::new(WORD).expect("valid word pattern"))
}

fn srid_prefix_re() -> &'static Regex {
    SRID_PREFIX_RE.get_or_init(|| Regex::new(SRID_PREFIX).expect("valid srid pattern"))
}

/// Parse a WKT or EWKT string and return the parsed geometry
///
/// A leading `SRID=<n>;` sets the SRID of the result. Keywords are case-insensitive and
/// may carry a `Z`, `M` or `ZM` suffix. Without a suffix the dimension follows the arity of
/// the first coordinate.
///
/// Examples
/// ```rust
/// use geoformat::{Coord, GeometryType, Shape};
/// use geoformat::serialization::parse_wkt;
///
/// let geom = parse_wkt("SRID=4326;POINT(30 -90)").unwrap();
/// assert_eq!(geom.srid(), Some(4326));
/// assert_eq!(geom.shape(), &Shape::Point(Some(Coord::new(30.0, -90.0))));
///
/// match parse_wkt("polygon m ((0 0 1, 1 0 2, 1 1 3, 0 0 1))") {
///     Ok(poly) => assert_eq!(poly.geometry_type(), GeometryType::Polygon),
///     Err(err) => panic!("Failed: {err}"),
/// }
/// ```
pub fn parse_wkt(raw_str: &str) -> GeomResult<Geometry> {
    let parser = WktParser { source: raw_str };
    let res = parser.parse_document();
    if let Err(err) = &res {
        log::debug!("Rejected WKT input: {err}");
    }
    res
}

/// Render a geometry as WKT, prefixed with `SRID=<n>;` when the geometry has an SRID
///
/// Examples
/// ```rust
/// use geoformat::{Coord, DimensionStyle, Geometry};
/// use geoformat::serialization::{write_wkt, WktOptions};
///
/// let pt = Geometry::point(Coord::xym(1.0, 2.0, 3.0));
/// assert_eq!(write_wkt(&pt, &WktOptions::default()), "POINT M (1 2 3)");
///
/// let postgis = WktOptions { dimension_style: DimensionStyle::PostGis };
/// assert_eq!(write_wkt(&pt, &postgis), "POINTM(1 2 3)");
/// ```
pub fn write_wkt(geom: &Geometry, options: &WktOptions) -> String {
    let mut out = String::new();
    if let Some(srid) = geom.srid() {
        out.push_str(&format!("SRID={srid};"));
    }
    write_tagged(&mut out, geom, options);
    out
}

// Keyword, dimension marker and body of one geometry
fn write_tagged(out: &mut String, geom: &Geometry, options: &WktOptions) {
    let dim = geom.dimension();
    let body = write_body(geom, options);
    // Without coordinates there is no arity to imply Z, so empty bodies always spell it out
    let style = match options.dimension_style {
        DimensionStyle::PostGis if body == EMPTY && dim.has_z() => DimensionStyle::Iso,
        style => style,
    };
    out.push_str(&registry::wkt_tag(geom.geometry_type(), dim, style));

    if body == EMPTY || (style == DimensionStyle::Iso && dim != Dimension::Xy) {
        out.push(' ');
    }
    out.push_str(&body);
}

fn write_body(geom: &Geometry, options: &WktOptions) -> String {
    match geom.shape() {
        Shape::Point(None) => EMPTY.to_string(),
        Shape::Point(Some(c)) => format!("({})", fmt_coord(c)),
        Shape::LineString(pts) | Shape::MultiPoint(pts) => fmt_coord_seq(pts),
        Shape::Polygon(rings) | Shape::MultiLineString(rings) => fmt_nested(rings, fmt_coord_seq),
        Shape::MultiPolygon(polys) => fmt_nested(polys, |rings| fmt_nested(rings, fmt_coord_seq)),
        Shape::GeometryCollection(members) => {
            if members.is_empty() {
                return EMPTY.to_string();
            }
            let mut txt = String::from("(");
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    txt.push(',');
                }
                write_tagged(&mut txt, member, options);
            }
            txt.push(')');
            txt
        }
    }
}

fn fmt_coord(c: &Coord) -> String {
    c.ordinates()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_coord_seq(pts: &Vec<Coord>) -> String {
    fmt_nested(pts, fmt_coord)
}

// Comma-joined, parenthesised list of items, or EMPTY
fn fmt_nested<T>(items: &[T], fmt_item: impl Fn(&T) -> String) -> String {
    if items.is_empty() {
        return EMPTY.to_string();
    }
    let inner: Vec<String> = items.iter().map(fmt_item).collect();
    format!("({})", inner.join(","))
}

/// Recursive-descent parser over a WKT source string.
///
/// Every step takes the unparsed tail and returns the value with the new tail, so offsets
/// for error reporting are recovered from the tail length.
struct WktParser<'a> {
    source: &'a str,
}

impl<'a> WktParser<'a> {
    fn offset(&self, rest: &str) -> usize {
        let consumed = self.source.len() - rest.len();
        self.source[..consumed].chars().count()
    }

    fn malformed(&self, rest: &str, reason: impl Into<String>) -> GeometryError {
        GeometryError::malformed(self.offset(rest), reason)
    }

    fn parse_document(&self) -> GeomResult<Geometry> {
        let (srid, rest) = self.parse_srid(self.source)?;
        let (geom, trailing) = self.parse_geometry(rest, 0)?;
        if !trailing.trim().is_empty() {
            return Err(self.malformed(trailing, "trailing characters after geometry"));
        }
        Ok(geom.with_srid(srid))
    }

    /// Strip an optional `SRID=<n>;` prefix
    fn parse_srid(&self, raw: &'a str) -> ParserResult<'a, Option<u32>> {
        if let Some(cap) = srid_prefix_re().captures(raw) {
            let digits = &cap[1];
            let end = cap.get_match().end();
            return match digits.parse::<u32>() {
                Ok(srid) => Ok((Some(srid), &raw[end..])),
                Err(_) => Err(self.malformed(raw, format!("invalid SRID: {digits}"))),
            };
        }
        let word = self.peek_word(raw);
        if word.is_some_and(|w| w.eq_ignore_ascii_case("SRID")) {
            return Err(self.malformed(raw, "expected 'SRID=<integer>;'"));
        }
        Ok((None, raw))
    }

    fn peek_word(&self, raw: &'a str) -> Option<&'a str> {
        word_re()
            .captures(raw)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str())
    }

    fn take_word(&self, raw: &'a str) -> Option<(&'a str, &'a str)> {
        let cap = word_re().captures(raw)?;
        let word = cap.get(1)?.as_str();
        Some((word, &raw[cap.get_match().end()..]))
    }

    // Consume the next non-blank char if it is `ch`
    fn expect(&self, raw: &'a str, ch: char) -> GeomResult<&'a str> {
        let trimmed = raw.trim_start();
        trimmed
            .strip_prefix(ch)
            .ok_or_else(|| self.malformed(trimmed, format!("expected '{ch}'")))
    }

    // Consume the EMPTY keyword if it comes next
    fn take_empty(&self, raw: &'a str) -> Option<&'a str> {
        match self.take_word(raw) {
            Some((word, rest)) if word.eq_ignore_ascii_case(EMPTY) => Some(rest),
            _ => None,
        }
    }

    /// Identify the geometry keyword and its dimension marker
    fn parse_tag(&self, raw: &'a str) -> ParserResult<'a, (GeometryType, Option<Dimension>)> {
        let Some((word, mut rest)) = self.take_word(raw) else {
            return Err(self.malformed(raw, "expected a geometry keyword"));
        };
        let Some((ty, mut dim)) = registry::split_keyword(word) else {
            return Err(GeometryError::UnsupportedType(word.to_string()));
        };
        if let Some((token, tail)) = self.take_word(rest) {
            if let Some(explicit) = registry::dimension_from_token(token) {
                if dim.is_some() {
                    return Err(self.malformed(rest, "dimension given twice"));
                }
                dim = Some(explicit);
                rest = tail;
            }
        }
        Ok(((ty, dim), rest))
    }

    fn parse_geometry(&self, raw: &'a str, depth: usize) -> ParserResult<'a, Geometry> {
        if depth > MAX_DEPTH {
            return Err(self.malformed(raw, "geometry nesting too deep"));
        }
        let ((ty, declared), rest) = self.parse_tag(raw)?;
        let mut dim = declared;

        let (shape, rest) = match ty {
            GeometryType::Point => {
                let (c, rest) = self.parse_point_body(rest, &mut dim)?;
                (Shape::Point(c), rest)
            }
            GeometryType::LineString => {
                let (pts, rest) = self.parse_coord_seq(rest, &mut dim)?;
                (Shape::LineString(pts), rest)
            }
            GeometryType::Polygon => {
                let (rings, rest) = self.parse_list(rest, |s| self.parse_coord_seq(s, &mut dim))?;
                (Shape::Polygon(rings), rest)
            }
            GeometryType::MultiPoint => {
                let (pts, rest) = self.parse_list(rest, |s| self.parse_multipoint_member(s, &mut dim))?;
                (Shape::MultiPoint(pts), rest)
            }
            GeometryType::MultiLineString => {
                let (lines, rest) = self.parse_list(rest, |s| self.parse_coord_seq(s, &mut dim))?;
                (Shape::MultiLineString(lines), rest)
            }
            GeometryType::MultiPolygon => {
                let (polys, rest) = self.parse_list(rest, |s| {
                    self.parse_list(s, |r| self.parse_coord_seq(r, &mut dim))
                })?;
                (Shape::MultiPolygon(polys), rest)
            }
            GeometryType::GeometryCollection => {
                let (members, rest) = self.parse_list(rest, |s| self.parse_geometry(s, depth + 1))?;
                if dim.is_none() {
                    dim = members.first().map(Geometry::dimension);
                }
                (Shape::GeometryCollection(members), rest)
            }
        };

        let geom = Geometry::new(shape, dim.unwrap_or_default()).map_err(|err| match err {
            GeometryError::DimensionMismatch {
                expected, found, ..
            } => GeometryError::DimensionMismatch {
                expected,
                found,
                offset: self.offset(raw),
            },
            other => other,
        })?;
        Ok((geom, rest))
    }

    /// `EMPTY` or a parenthesised, comma separated list of items
    fn parse_list<T>(
        &self,
        raw: &'a str,
        mut item: impl FnMut(&'a str) -> ParserResult<'a, T>,
    ) -> ParserResult<'a, Vec<T>> {
        if let Some(rest) = self.take_empty(raw) {
            return Ok((Vec::new(), rest));
        }
        let mut trimmed = self.expect(raw, '(')?;
        let mut items = Vec::new();
        loop {
            let (value, rest) = item(trimmed)?;
            items.push(value);
            let rest = rest.trim_start();
            match rest.strip_prefix(',') {
                Some(s) => trimmed = s,
                None => {
                    trimmed = rest;
                    break;
                }
            }
        }
        let rest = self.expect(trimmed, ')')?;
        Ok((items, rest))
    }

    fn parse_coord_seq(&self, raw: &'a str, dim: &mut Option<Dimension>) -> ParserResult<'a, Vec<Coord>> {
        self.parse_list(raw, |s| self.parse_coord(s, dim))
    }

    fn parse_point_body(&self, raw: &'a str, dim: &mut Option<Dimension>) -> ParserResult<'a, Option<Coord>> {
        if let Some(rest) = self.take_empty(raw) {
            return Ok((None, rest));
        }
        let trimmed = self.expect(raw, '(')?;
        let (c, rest) = self.parse_coord(trimmed, dim)?;
        let rest = self.expect(rest, ')')?;
        Ok((Some(c), rest))
    }

    // Multipoint members may be bare `1 2` or wrapped `(1 2)`
    fn parse_multipoint_member(&self, raw: &'a str, dim: &mut Option<Dimension>) -> ParserResult<'a, Coord> {
        let trimmed = raw.trim_start();
        if let Some(inner) = trimmed.strip_prefix('(') {
            let (c, rest) = self.parse_coord(inner, dim)?;
            let rest = self.expect(rest, ')')?;
            Ok((c, rest))
        } else {
            self.parse_coord(trimmed, dim)
        }
    }

    /// Parse one space separated coordinate tuple and check it against the dimension
    fn parse_coord(&self, raw: &'a str, dim: &mut Option<Dimension>) -> ParserResult<'a, Coord> {
        let re = number_re();
        let start = raw;
        let mut rest = raw;
        let mut values = Vec::with_capacity(4);
        while let Some(cap) = re.captures(rest) {
            let token = &cap[1];
            let value = token
                .parse::<f64>()
                .map_err(|_| self.malformed(rest, format!("invalid number: {token}")))?;
            values.push(value);
            rest = &rest[cap.get_match().end()..];
        }

        let next = rest.trim_start();
        if values.is_empty() || !(next.is_empty() || next.starts_with([',', ')'])) {
            let token: String = next
                .chars()
                .take_while(|c| !c.is_whitespace() && *c != ',' && *c != ')')
                .take(16)
                .collect();
            return Err(self.malformed(next, format!("expected a number, found '{token}'")));
        }
        let Some(found) = Dimension::from_arity(values.len()) else {
            return Err(self.malformed(
                start,
                format!("coordinate has {} ordinates, expected 2 to 4", values.len()),
            ));
        };

        let expected = *dim.get_or_insert(found);
        match Coord::from_ordinates(&values, expected) {
            Some(c) => Ok((c, rest)),
            None => Err(GeometryError::DimensionMismatch {
                expected,
                found,
                offset: self.offset(start.trim_start()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, rng};

    fn sq(dim: Dimension) -> Vec<Coord> {
        let mk = |x: f64, y: f64| match dim {
            Dimension::Xy => Coord::new(x, y),
            Dimension::Xyz => Coord::xyz(x, y, 10.0),
            Dimension::Xym => Coord::xym(x, y, 20.0),
            Dimension::Xyzm => Coord::xyzm(x, y, 10.0, 20.0),
        };
        vec![mk(0.0, 0.0), mk(0.0, 1.0), mk(1.0, 1.0), mk(1.0, 0.0), mk(0.0, 0.0)]
    }

    #[test]
    fn test_parse_point_valid() {
        let geom = parse_wkt("POINT(30 -90)").unwrap();
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::new(30.0, -90.0))));
        assert_eq!(geom.srid(), None);
        assert_eq!(geom.dimension(), Dimension::Xy);

        let geom = parse_wkt("  point ( 1.5e2   -2.5E-1 ) ").unwrap();
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::new(150.0, -0.25))));
    }

    #[test]
    fn test_srid_round_trip() {
        let txt = "SRID=4326;POINT(30 -90)";
        let geom = parse_wkt(txt).unwrap();
        assert_eq!(geom.srid(), Some(4326));
        assert_eq!(geom.shape(), &Shape::Point(Some(Coord::new(30.0, -90.0))));
        assert_eq!(write_wkt(&geom, &WktOptions::default()), txt);

        let geom = parse_wkt("srid = 0 ; POINT(1 2)").unwrap();
        assert_eq!(geom.srid(), Some(0));
    }

    #[test]
    fn test_srid_invalid() {
        for txt in ["SRID=-1;POINT(0 0)", "SRID=abc;POINT(0 0)", "SRID=4326 POINT(0 0)"] {
            match parse_wkt(txt) {
                Err(GeometryError::MalformedText { .. }) => (),
                other => panic!("Expected malformed text for {txt}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_point_invalid() {
        let bad = [
            "POINT(0 1, 2 3)",
            "POINT (0)",
            "POINT(0 1))",
            "POINT((0 1))",
            "-POINT(0 1)",
            "POINT(0 1",
            "POINT(0 a)",
            "POINT(1 2 3 4 5)",
            "POINT()",
            "",
        ];
        for txt in bad {
            match parse_wkt(txt) {
                Err(GeometryError::MalformedText { .. }) => (),
                other => panic!("Parsed invalid point {txt:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_keyword() {
        match parse_wkt("NOTASHAPE ((0 0, 0 1, 1 1, 1 0, 0 0))") {
            Err(GeometryError::UnsupportedType(word)) => assert_eq!(word, "NOTASHAPE"),
            other => panic!("Expected unsupported type: {other:?}"),
        }
        assert!(matches!(
            parse_wkt("TRIANGLE((0 0,1 0,0 1,0 0))"),
            Err(GeometryError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_error_offsets() {
        match parse_wkt("LINESTRING(0 0, 1 x)") {
            Err(GeometryError::MalformedText { offset, .. }) => assert_eq!(offset, 18),
            other => panic!("Expected malformed text: {other:?}"),
        }
        match parse_wkt("POINT(1 2) extra") {
            Err(GeometryError::MalformedText { offset, .. }) => assert_eq!(offset, 10),
            other => panic!("Expected malformed text: {other:?}"),
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        match parse_wkt("POINT Z (1 2)") {
            Err(GeometryError::DimensionMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, Dimension::Xyz);
                assert_eq!(found, Dimension::Xy);
            }
            other => panic!("Expected dimension mismatch: {other:?}"),
        }

        match parse_wkt("LINESTRING(0 0, 1 1 1)") {
            Err(GeometryError::DimensionMismatch { offset, .. }) => assert_eq!(offset, 16),
            other => panic!("Expected dimension mismatch: {other:?}"),
        }

        assert!(matches!(
            parse_wkt("MULTIPOINT(0 0 9.0, 1 0, 0.5 0.5 0.2)"),
            Err(GeometryError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            parse_wkt("POINT ZM (1 2 3)"),
            Err(GeometryError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_dimension_suffixes() {
        let cases = [
            ("POINT Z (1 2 3)", Coord::xyz(1.0, 2.0, 3.0)),
            ("POINTZ(1 2 3)", Coord::xyz(1.0, 2.0, 3.0)),
            ("POINT(1 2 3)", Coord::xyz(1.0, 2.0, 3.0)),
            ("POINT M (1 2 3)", Coord::xym(1.0, 2.0, 3.0)),
            ("pointm(1 2 3)", Coord::xym(1.0, 2.0, 3.0)),
            ("POINT ZM (1 2 3 4)", Coord::xyzm(1.0, 2.0, 3.0, 4.0)),
            ("POINT(1 2 3 4)", Coord::xyzm(1.0, 2.0, 3.0, 4.0)),
        ];
        for (txt, coord) in cases {
            let geom = parse_wkt(txt).unwrap();
            assert_eq!(geom.dimension(), coord.dimension(), "{txt}");
            assert_eq!(geom.shape(), &Shape::Point(Some(coord)), "{txt}");
        }

        assert!(matches!(
            parse_wkt("POINTZ Z (1 2 3)"),
            Err(GeometryError::MalformedText { .. })
        ));
    }

    #[test]
    fn test_empty_geometries() {
        let empty = Geometry::multi_line_string(Vec::new()).unwrap();
        let txt = write_wkt(&empty, &WktOptions::default());
        assert_eq!(txt, "MULTILINESTRING EMPTY");

        let back = parse_wkt(&txt).unwrap();
        assert_eq!(back.shape(), &Shape::MultiLineString(Vec::new()));
        assert_eq!(back, empty);

        let pt = parse_wkt("POINT Z EMPTY").unwrap();
        assert_eq!(pt.shape(), &Shape::Point(None));
        assert_eq!(pt.dimension(), Dimension::Xyz);
        assert_eq!(write_wkt(&pt, &WktOptions::default()), "POINT Z EMPTY");

        let gc = parse_wkt("GEOMETRYCOLLECTION EMPTY").unwrap();
        assert!(gc.is_empty());
    }

    #[test]
    fn test_empty_keeps_dimension_in_postgis_style() {
        let postgis = WktOptions {
            dimension_style: DimensionStyle::PostGis,
        };
        let cases = [
            (GeometryType::LineString, Dimension::Xyz, "LINESTRING Z EMPTY"),
            (GeometryType::Point, Dimension::Xyzm, "POINT ZM EMPTY"),
            (GeometryType::Polygon, Dimension::Xym, "POLYGONM EMPTY"),
            (GeometryType::MultiPoint, Dimension::Xy, "MULTIPOINT EMPTY"),
        ];
        for (ty, dim, expected) in cases {
            let empty = Geometry::empty(ty, dim);
            let txt = write_wkt(&empty, &postgis);
            assert_eq!(txt, expected);
            let back = parse_wkt(&txt).unwrap();
            assert_eq!(back.dimension(), dim, "{txt}");
            assert_eq!(back, empty);
        }

        let ls = Geometry::line_string(vec![Coord::xyz(0.0, 0.0, 1.0), Coord::xyz(1.0, 1.0, 2.0)])
            .unwrap();
        assert_eq!(write_wkt(&ls, &postgis), "LINESTRING(0 0 1,1 1 2)");
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let deep = format!(
            "{}{}",
            "GEOMETRYCOLLECTION(".repeat(3000),
            ")".repeat(3000)
        );
        match parse_wkt(&deep) {
            Err(GeometryError::MalformedText { offset, .. }) => {
                assert_eq!(offset, (MAX_DEPTH + 1) * "GEOMETRYCOLLECTION(".len());
            }
            other => panic!("Expected malformed text: {other:?}"),
        }

        let mut nested = String::from("POINT(1 2)");
        for _ in 0..MAX_DEPTH {
            nested = format!("GEOMETRYCOLLECTION({nested})");
        }
        let gc = parse_wkt(&nested).unwrap();
        assert_eq!(gc.geometry_type(), GeometryType::GeometryCollection);
        assert_eq!(gc.wkt(), nested);
    }

    #[test]
    fn test_parse_polygon_with_hole() {
        let txt = "POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,2 3,3 3,2 2))";
        let poly = parse_wkt(txt).unwrap();
        match poly.shape() {
            Shape::Polygon(rings) => {
                assert_eq!(rings.len(), 2);
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[1][1], Coord::new(2.0, 3.0));
            }
            other => panic!("Expected a polygon, got {other:?}"),
        }
        assert_eq!(write_wkt(&poly, &WktOptions::default()), txt);
    }

    #[test]
    fn test_parse_polygon_invalid() {
        for txt in [
            "POLYGON(0 0, 1 0, 1 1, 0 0)",
            "POLYGON(0 0, 1 0, 1 1, 0 0))",
            "POLYGON ((0 0, 1 0, 1 1, 0 0)",
            "POLYGON (((0 0, 1 0, 1 1, 0 0)))",
        ] {
            match parse_wkt(txt) {
                Err(GeometryError::MalformedText { .. }) => (),
                other => panic!("Parsed invalid polygon {txt:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_multipoint_forms() {
        let bare = parse_wkt("MULTIPOINT(0 0, 1 0, 0.5 0.5)").unwrap();
        let wrapped = parse_wkt("MULTIPOINT((0 0), (1 0), (0.5 0.5))").unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare.shape().size(), 3);
        assert_eq!(
            write_wkt(&wrapped, &WktOptions::default()),
            "MULTIPOINT(0 0,1 0,0.5 0.5)"
        );
    }

    #[test]
    fn test_geometry_collection() {
        let txt = "SRID=3857;GEOMETRYCOLLECTION(POINT(1 2),LINESTRING Z (0 0 0,1 1 1),POLYGON EMPTY)";
        let gc = parse_wkt(txt).unwrap();
        assert_eq!(gc.srid(), Some(3857));
        match gc.shape() {
            Shape::GeometryCollection(members) => {
                assert_eq!(members.len(), 3);
                assert_eq!(members[0].geometry_type(), GeometryType::Point);
                assert_eq!(members[1].dimension(), Dimension::Xyz);
                assert_eq!(members[1].srid(), None);
                assert!(members[2].is_empty());
            }
            other => panic!("Expected a collection, got {other:?}"),
        }
        assert_eq!(write_wkt(&gc, &WktOptions::default()), txt);
    }

    #[test]
    fn test_multipolygon_round_trip_all_styles() {
        for dim in crate::registry::DIMENSIONS {
            let mp = Geometry::multi_polygon(vec![vec![sq(dim)], vec![sq(dim), sq(dim)]])
                .unwrap()
                .with_srid(4326);
            for dimension_style in [DimensionStyle::Iso, DimensionStyle::PostGis] {
                let txt = write_wkt(&mp, &WktOptions { dimension_style });
                let back = parse_wkt(&txt).unwrap();
                assert_eq!(back.dimension(), dim, "{txt}");
                assert_eq!(back, mp, "{txt}");
            }
        }
    }

    #[test]
    fn test_dimension_style_output() {
        let ls = Geometry::line_string(vec![Coord::xyz(0.0, 0.0, 1.0), Coord::xyz(1.0, 1.0, 2.0)])
            .unwrap();
        assert_eq!(
            write_wkt(&ls, &WktOptions::default()),
            "LINESTRING Z (0 0 1,1 1 2)"
        );
        let postgis = WktOptions {
            dimension_style: DimensionStyle::PostGis,
        };
        assert_eq!(write_wkt(&ls, &postgis), "LINESTRING(0 0 1,1 1 2)");

        let pt = Geometry::point(Coord::xym(1.0, 2.0, 3.0));
        assert_eq!(write_wkt(&pt, &postgis), "POINTM(1 2 3)");
        assert_eq!(write_wkt(&pt, &WktOptions::default()), "POINT M (1 2 3)");
    }

    #[test]
    fn test_parse_line_random() {
        let mut random = rng();
        for _ in 0..100 {
            let pts: Vec<Coord> = (0..random.random_range(1..50))
                .map(|_| {
                    Coord::xyzm(
                        (random.random::<f64>() - 0.5) * 360.0,
                        (random.random::<f64>() - 0.5) * 180.0,
                        random.random::<f64>() * 1e4,
                        random.random(),
                    )
                })
                .collect();
            let ls = Geometry::line_string(pts.clone()).unwrap();
            let back = parse_wkt(&ls.wkt()).unwrap();
            match back.shape() {
                Shape::LineString(parsed) => {
                    assert_eq!(parsed.len(), pts.len());
                    for (a, b) in pts.iter().zip(parsed) {
                        assert!(a.is_close(b));
                    }
                }
                other => panic!("Expected a linestring, got {other:?}"),
            }
        }
    }
}
