//! Configurable string rendering of geometries.
//!
//! A [`Stringifier`] holds formatting functions keyed by geometry type, plus an optional
//! catch-all. Lookup goes exact type, then the catch-all, then the WKT writer.
use std::collections::HashMap;
use std::fmt;

use super::wkt::{WktOptions, write_wkt};
use crate::geometry::Geometry;
use crate::registry::GeometryType;

/// A function rendering a geometry as text
pub type Formatter = Box<dyn Fn(&Geometry) -> String + Send + Sync>;

/// What a formatter is registered for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatKey {
    Type(GeometryType),
    Default,
}

impl From<GeometryType> for FormatKey {
    fn from(ty: GeometryType) -> Self {
        FormatKey::Type(ty)
    }
}

/// Registry of per-type string formatters
///
/// Examples
/// ```rust
/// use geoformat::{Coord, Geometry, GeometryType};
/// use geoformat::serialization::{FormatKey, Stringifier};
///
/// let strings = Stringifier::new()
///     .with_formatter(GeometryType::Point, |g| format!("<point srid={:?}>", g.srid()));
///
/// let pt = Geometry::point(Coord::new(1.0, 2.0));
/// assert_eq!(strings.stringify(&pt), "<point srid=None>");
///
/// let line = Geometry::line_string(vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)]).unwrap();
/// assert_eq!(strings.stringify(&line), "LINESTRING(0 0,1 1)");
/// ```
#[derive(Default)]
pub struct Stringifier {
    formatters: HashMap<FormatKey, Formatter>,
    wkt_options: WktOptions,
}

impl Stringifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the options of the WKT writer used when no formatter matches
    pub fn with_wkt_options(mut self, options: WktOptions) -> Self {
        self.wkt_options = options;
        self
    }

    /// Register a formatter, replacing any previous one for the same key
    pub fn with_formatter<F>(mut self, key: impl Into<FormatKey>, formatter: F) -> Self
    where
        F: Fn(&Geometry) -> String + Send + Sync + 'static,
    {
        self.set(key, formatter);
        self
    }

    pub fn set<F>(&mut self, key: impl Into<FormatKey>, formatter: F)
    where
        F: Fn(&Geometry) -> String + Send + Sync + 'static,
    {
        self.formatters.insert(key.into(), Box::new(formatter));
    }

    /// Drop the formatter for a key. Returns true if one was registered.
    pub fn remove(&mut self, key: impl Into<FormatKey>) -> bool {
        self.formatters.remove(&key.into()).is_some()
    }

    pub fn stringify(&self, geom: &Geometry) -> String {
        let formatter = self
            .formatters
            .get(&FormatKey::Type(geom.geometry_type()))
            .or_else(|| self.formatters.get(&FormatKey::Default));
        match formatter {
            Some(f) => f(geom),
            None => write_wkt(geom, &self.wkt_options),
        }
    }
}

impl fmt::Debug for Stringifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Stringifier")
            .field("keys", &self.formatters.keys().collect::<Vec<_>>())
            .field("wkt_options", &self.wkt_options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::Coord;
    use crate::registry::DimensionStyle;
    use crate::serialization::wkb::{WkbOptions, write_hex_wkb};

    #[test]
    fn test_falls_back_to_wkt() {
        let pt = Geometry::point(Coord::new(30.0, -90.0)).with_srid(4326);
        assert_eq!(Stringifier::new().stringify(&pt), "SRID=4326;POINT(30 -90)");

        let postgis = Stringifier::new().with_wkt_options(WktOptions {
            dimension_style: DimensionStyle::PostGis,
        });
        let pt = Geometry::point(Coord::xyz(1.0, 2.0, 3.0));
        assert_eq!(postgis.stringify(&pt), "POINT(1 2 3)");
    }

    #[test]
    fn test_lookup_order() {
        let mut strings = Stringifier::new()
            .with_formatter(FormatKey::Default, |g| {
                write_hex_wkb(g, &WkbOptions::default()).unwrap_or_default()
            })
            .with_formatter(GeometryType::Polygon, |_| String::from("polygon"));

        let poly = Geometry::polygon(Vec::new()).unwrap();
        let pt = Geometry::point(Coord::new(1.0, 1.0));
        assert_eq!(strings.stringify(&poly), "polygon");
        assert_eq!(
            strings.stringify(&pt),
            "0101000000000000000000F03F000000000000F03F"
        );

        assert!(strings.remove(FormatKey::Default));
        assert!(!strings.remove(FormatKey::Default));
        assert_eq!(strings.stringify(&pt), "POINT(1 1)");
    }

    #[test]
    fn test_shared_across_threads() {
        let strings = std::sync::Arc::new(
            Stringifier::new().with_formatter(GeometryType::Point, |g| g.dimension().to_string()),
        );
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let strings = strings.clone();
                std::thread::spawn(move || {
                    strings.stringify(&Geometry::point(Coord::new(i as f64, 0.0)))
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), "XY");
        }
    }
}
