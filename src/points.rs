use std::fmt;

use super::core;

/// Coordinate dimensionality of a geometry.
///
/// XYZ and XYM both carry three ordinates; which one is meant is decided by this tag and
/// never by the tuple arity alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    #[default]
    Xy,
    Xyz,
    Xym,
    Xyzm,
}

impl Dimension {
    /// Build a dimension from its Z / M flags
    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Dimension::Xy,
            (true, false) => Dimension::Xyz,
            (false, true) => Dimension::Xym,
            (true, true) => Dimension::Xyzm,
        }
    }

    /// Guess the dimension of an undecorated tuple from its arity.
    ///
    /// Three ordinates are read as XYZ, matching what PostGIS emits for undecorated EWKT.
    pub fn from_arity(arity: usize) -> Option<Self> {
        match arity {
            2 => Some(Dimension::Xy),
            3 => Some(Dimension::Xyz),
            4 => Some(Dimension::Xyzm),
            _ => None,
        }
    }

    /// Number of ordinates in a coordinate tuple
    pub fn size(&self) -> usize {
        match self {
            Dimension::Xy => 2,
            Dimension::Xyz | Dimension::Xym => 3,
            Dimension::Xyzm => 4,
        }
    }

    pub fn has_z(&self) -> bool {
        matches!(self, Dimension::Xyz | Dimension::Xyzm)
    }

    pub fn has_m(&self) -> bool {
        matches!(self, Dimension::Xym | Dimension::Xyzm)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Dimension::Xy => "XY",
            Dimension::Xyz => "XYZ",
            Dimension::Xym => "XYM",
            Dimension::Xyzm => "XYZM",
        };
        write!(f, "{name}")
    }
}

/// A single coordinate tuple
///
/// Examples
/// ```rust
/// use geoformat::{Coord, Dimension};
/// let c = Coord::xym(1.0, 2.0, 10.0);
/// assert_eq!(c.dimension(), Dimension::Xym);
/// assert_eq!(c.ordinates(), vec![1.0, 2.0, 10.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Coord {
    /// Instantiate a 2D coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: None,
        }
    }

    pub fn xym(x: f64, y: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: Some(m),
        }
    }

    pub fn xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: Some(m),
        }
    }

    /// Build a coordinate from raw ordinates laid out as `x y [z] [m]` for `dim`.
    ///
    /// Returns None if the slice length does not match the dimension.
    pub fn from_ordinates(values: &[f64], dim: Dimension) -> Option<Self> {
        if values.len() != dim.size() {
            return None;
        }
        let coord = match dim {
            Dimension::Xy => Coord::new(values[0], values[1]),
            Dimension::Xyz => Coord::xyz(values[0], values[1], values[2]),
            Dimension::Xym => Coord::xym(values[0], values[1], values[2]),
            Dimension::Xyzm => Coord::xyzm(values[0], values[1], values[2], values[3]),
        };
        Some(coord)
    }

    pub fn dimension(&self) -> Dimension {
        Dimension::from_flags(self.z.is_some(), self.m.is_some())
    }

    /// Ordinates in `x y [z] [m]` order
    pub fn ordinates(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(4);
        out.push(self.x);
        out.push(self.y);
        out.extend(self.z);
        out.extend(self.m);
        out
    }

    /// Return true if the coordinate is approximately equal to other.
    pub fn is_close(&self, other: &Coord) -> bool {
        fn opt_close(a: Option<f64>, b: Option<f64>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => core::approx(a, b),
                (None, None) => true,
                _ => false,
            }
        }
        core::approx(self.x, other.x)
            && core::approx(self.y, other.y)
            && opt_close(self.z, other.z)
            && opt_close(self.m, other.m)
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Coord::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_from_arity() {
        assert_eq!(Dimension::from_arity(2), Some(Dimension::Xy));
        assert_eq!(Dimension::from_arity(3), Some(Dimension::Xyz));
        assert_eq!(Dimension::from_arity(4), Some(Dimension::Xyzm));
        assert_eq!(Dimension::from_arity(1), None);
        assert_eq!(Dimension::from_arity(5), None);
    }

    #[test]
    fn test_from_ordinates() {
        let c = Coord::from_ordinates(&[1.0, 2.0, 3.0], Dimension::Xym).unwrap();
        assert_eq!(c, Coord::xym(1.0, 2.0, 3.0));
        assert_ne!(c, Coord::xyz(1.0, 2.0, 3.0));

        assert!(Coord::from_ordinates(&[1.0, 2.0], Dimension::Xyz).is_none());
        assert_eq!(
            Coord::xyzm(1.0, 2.0, 3.0, 4.0).ordinates(),
            vec![1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_close_coords() {
        let c1 = Coord::xyz(20.0, 20.0, 1.0);
        let c2 = Coord::xyz(20.0 + 1e-7, 20.0, 1.0);
        let c3 = Coord::xyz(20.0 + 1e-12, 20.0 - 1e-12, 1.0);

        assert!(!c1.is_close(&c2));
        assert!(c1.is_close(&c3));
        assert!(!c1.is_close(&Coord::xym(20.0, 20.0, 1.0)));
    }
}
