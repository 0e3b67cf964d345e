pub mod core;
mod geometry;
mod points;
pub mod registry;
pub mod serialization;

pub use self::geometry::*;
pub use self::points::*;
pub use self::core::*;
pub use registry::{DimensionStyle, GeometryType, TypeCodeStyle};
