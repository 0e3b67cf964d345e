use thiserror::Error;

use super::points::Dimension;

const ATOL: f64 = 1e-12;
const RTOL: f64 = 1e-9;

/// Errors produced while building, decoding or encoding geometries.
///
/// Offsets are character offsets into WKT text and byte offsets into WKB input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("malformed text at offset {offset}: {reason}")]
    MalformedText { offset: usize, reason: String },

    #[error("truncated binary at offset {offset}: need {needed} more byte(s)")]
    TruncatedBinary { offset: usize, needed: usize },

    #[error("unsupported geometry type: {0}")]
    UnsupportedType(String),

    #[error("dimension mismatch at offset {offset}: expected {expected}, found {found}")]
    DimensionMismatch {
        expected: Dimension,
        found: Dimension,
        offset: usize,
    },

    #[error("invalid shape configuration: {0}")]
    InvalidShapeConfiguration(String),

    #[error("failed to write output: {0}")]
    Io(String),
}

pub type GeomResult<T> = Result<T, GeometryError>;

impl From<std::io::Error> for GeometryError {
    fn from(err: std::io::Error) -> Self {
        GeometryError::Io(err.to_string())
    }
}

impl GeometryError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        GeometryError::MalformedText {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        GeometryError::InvalidShapeConfiguration(reason.into())
    }
}

/// Macro to implement the Display trait for types that render as WKT
macro_rules! display_for_geom {
    ($type:ty) => {
        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.wkt())
            }
        }
    };
}

pub(crate) use display_for_geom;

/// Return whether two numbers are approximately equal.
///
/// Determines if the given numbers are close with the given absolute and relative tolerances.
/// Two NaNs are considered close, since NaN marks the coordinates of an empty point.
///
/// Examples:
/// ```rust
/// use geoformat;
///
/// println!("Close: {}", geoformat::is_close(0.0, 0.0, 1e-10, 1e-10));
/// ```
pub fn is_close(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    assert!(rtol >= 0.0 && atol >= 0.0);
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    let scale = a.abs().max(b.abs());
    (a - b).abs() < (atol + rtol * scale)
}

/// Determine if two values are approximately equal to one another.
///
/// Determine if two floating point values are approximately equal. This is equivalent to calling
/// `is_close` with relative tolerance of `1e-9` and absolute tolerance of `1e-12`.
///
/// Example:
/// ```rust
/// use geoformat;
/// let x1 = 0.123;
/// let x2 = 0.123 + 1e-14;
///
/// assert!(geoformat::approx(x1, x2));
/// ```
pub fn approx(a: f64, b: f64) -> bool {
    is_close(a, b, RTOL, ATOL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GeometryError::malformed(7, "expected '('");
        assert_eq!(err.to_string(), "malformed text at offset 7: expected '('");

        let err = GeometryError::TruncatedBinary {
            offset: 5,
            needed: 4,
        };
        assert_eq!(
            err.to_string(),
            "truncated binary at offset 5: need 4 more byte(s)"
        );

        let err = GeometryError::DimensionMismatch {
            expected: Dimension::Xyz,
            found: Dimension::Xy,
            offset: 12,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch at offset 12: expected XYZ, found XY"
        );

        let err = GeometryError::from(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "failed to write output: disk full");
    }

    #[test]
    fn test_is_close() {
        assert!(approx(1.0, 1.0 + 1e-13));
        assert!(!approx(1.0, 1.0 + 1e-6));
        assert!(approx(f64::NAN, f64::NAN));
        assert!(!approx(f64::NAN, 0.0));
    }
}
