use super::core::GeomResult;
pub mod geojson;
pub mod stringify;
pub mod wkb;
pub mod wkt;

pub use geojson::{GeoJsonOptions, read_geojson, write_geojson};
pub use stringify::{FormatKey, Formatter, Stringifier};
pub use wkb::{
    Endianness, WkbOptions, decode_hex, encode_hex, read_hex_wkb, read_wkb,
    read_wkb_with_endianness, read_wkb_with_options, write_hex_wkb, write_wkb, write_wkb_into,
};
pub use wkt::{WktOptions, parse_wkt, write_wkt};

/// Nested collections deeper than this are rejected by every decoder instead of recursing further
const MAX_DEPTH: usize = 128;

type ParserResult<'a, T> = GeomResult<(T, &'a str)>;
