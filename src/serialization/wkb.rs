//! WKB and EWKB reader / writer.
//!
//! Layout of every geometry, nested members included:
//!
//! ```text
//! byte order (1) | type code (4) | [srid (4)] | body
//! ```
//!
//! Each nested member restarts with its own byte order byte, so mixed endianness inside one
//! buffer is accepted on read.
use std::fmt::Write as _;
use std::io::{Cursor, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::core::{GeomResult, GeometryError};
use crate::geometry::{Geometry, Shape};
use crate::points::{Coord, Dimension};
use crate::registry::{self, GeometryType, TypeCodeStyle};

use super::MAX_DEPTH;

// Smallest possible encoding of a nested member: byte order and type code
const MIN_MEMBER_SIZE: usize = 5;

/// Byte order marker leading every WKB geometry
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Endianness {
    /// XDR
    BigEndian = 0,
    /// NDR
    LittleEndian = 1,
}

impl Default for Endianness {
    fn default() -> Self {
        Endianness::LittleEndian
    }
}

/// Options for the WKB writer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WkbOptions {
    pub endianness: Endianness,
    pub type_code_style: TypeCodeStyle,
}

/// Decode a WKB or EWKB buffer
///
/// Examples
/// ```rust
/// use geoformat::{Coord, Shape};
/// use geoformat::serialization::{decode_hex, read_wkb};
///
/// let bytes = decode_hex("0101000000000000000000F03F000000000000F03F").unwrap();
/// let pt = read_wkb(&bytes).unwrap();
/// assert_eq!(pt.shape(), &Shape::Point(Some(Coord::new(1.0, 1.0))));
/// assert_eq!(pt.srid(), None);
/// ```
pub fn read_wkb(bytes: &[u8]) -> GeomResult<Geometry> {
    read_wkb_with_endianness(bytes).map(|(geom, _)| geom)
}

/// Decode a WKB or EWKB buffer, also returning the byte order of the root geometry.
///
/// Re-encoding with that byte order reproduces the input when all members share it.
pub fn read_wkb_with_endianness(bytes: &[u8]) -> GeomResult<(Geometry, Endianness)> {
    read_wkb_with_options(bytes).map(|(geom, options)| (geom, options.endianness))
}

/// Decode a WKB or EWKB buffer, also returning the byte order and type code convention of the
/// root geometry.
///
/// Writing the geometry back with those options reproduces the input when all members share
/// them.
///
/// Examples
/// ```rust
/// use geoformat::TypeCodeStyle;
/// use geoformat::serialization::{decode_hex, encode_hex, read_wkb_with_options, write_wkb};
///
/// // PostGIS EWKB for SRID=4326;POINT Z (1 2 3)
/// let hex = "01010000A0E6100000000000000000F03F00000000000000400000000000000840";
/// let (pt, options) = read_wkb_with_options(&decode_hex(hex).unwrap()).unwrap();
/// assert_eq!(options.type_code_style, TypeCodeStyle::ExtendedFlags);
/// assert_eq!(encode_hex(&write_wkb(&pt, &options).unwrap()), hex);
/// ```
pub fn read_wkb_with_options(bytes: &[u8]) -> GeomResult<(Geometry, WkbOptions)> {
    let mut reader = WkbReader::new(bytes);
    let res = reader.read_document();
    if let Err(err) = &res {
        log::debug!("Rejected WKB input of {} bytes: {err}", bytes.len());
    }
    res
}

/// Decode hex encoded WKB or EWKB. Hex digits may be upper or lower case.
pub fn read_hex_wkb(hex: &str) -> GeomResult<Geometry> {
    read_wkb(&decode_hex(hex)?)
}

/// Encode a geometry as WKB; the root SRID, if any, produces EWKB.
///
/// Examples
/// ```rust
/// use geoformat::{Coord, Geometry};
/// use geoformat::serialization::{encode_hex, write_wkb, WkbOptions};
///
/// let pt = Geometry::point(Coord::new(1.0, 1.0));
/// let bytes = write_wkb(&pt, &WkbOptions::default()).unwrap();
/// assert_eq!(encode_hex(&bytes), "0101000000000000000000F03F000000000000F03F");
/// ```
pub fn write_wkb(geom: &Geometry, options: &WkbOptions) -> GeomResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_wkb_into(geom, options, &mut buf)?;
    Ok(buf)
}

/// Encode a geometry as WKB straight into a writer
pub fn write_wkb_into<W: Write>(
    geom: &Geometry,
    options: &WkbOptions,
    out: &mut W,
) -> GeomResult<()> {
    let mut writer = WkbWriter {
        out,
        options: *options,
    };
    writer.write_geometry(geom, geom.srid())
}

/// Encode a geometry as WKB and render it as upper case hex
pub fn write_hex_wkb(geom: &Geometry, options: &WkbOptions) -> GeomResult<String> {
    Ok(encode_hex(&write_wkb(geom, options)?))
}

/// Render bytes as upper case hex, two digits per byte
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02X}");
    }
    out
}

/// Parse hex digits (either case) into bytes. Surrounding whitespace is ignored.
pub fn decode_hex(hex: &str) -> GeomResult<Vec<u8>> {
    let lead = hex.len() - hex.trim_start().len();
    let digits = hex.trim().as_bytes();
    if digits.len() % 2 != 0 {
        return Err(GeometryError::malformed(
            lead + digits.len(),
            "odd number of hex digits",
        ));
    }

    fn nibble(c: u8) -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    }

    let mut out = Vec::with_capacity(digits.len() / 2);
    for (i, pair) in digits.chunks_exact(2).enumerate() {
        let pos = lead + 2 * i;
        let hi = nibble(pair[0]).ok_or_else(|| GeometryError::malformed(pos, "invalid hex digit"))?;
        let lo =
            nibble(pair[1]).ok_or_else(|| GeometryError::malformed(pos + 1, "invalid hex digit"))?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

struct WkbReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> WkbReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    fn ensure(&self, needed: usize) -> GeomResult<()> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(GeometryError::TruncatedBinary {
                offset: self.position(),
                needed: needed - remaining,
            });
        }
        Ok(())
    }

    fn read_document(&mut self) -> GeomResult<(Geometry, WkbOptions)> {
        let options = self.peek_options()?;
        let geom = self.read_geometry(0)?;
        if self.remaining() > 0 {
            return Err(GeometryError::malformed(
                self.position(),
                format!("{} trailing byte(s) after geometry", self.remaining()),
            ));
        }
        Ok((geom, options))
    }

    // Byte order and type code convention of the next geometry, without consuming it
    fn peek_options(&mut self) -> GeomResult<WkbOptions> {
        let start = self.cursor.position();
        let endianness = self.read_endianness()?;
        let info = registry::decode_wkb_code(self.read_u32(endianness)?)?;
        self.cursor.set_position(start);
        Ok(WkbOptions {
            endianness,
            type_code_style: info.type_code_style,
        })
    }

    fn peek_endianness(&self) -> GeomResult<Endianness> {
        self.ensure(1)?;
        let byte = self.cursor.get_ref()[self.position()];
        Endianness::try_from(byte).map_err(|_| {
            GeometryError::malformed(self.position(), format!("invalid byte order: {byte}"))
        })
    }

    fn read_endianness(&mut self) -> GeomResult<Endianness> {
        let endianness = self.peek_endianness()?;
        self.cursor.set_position(self.cursor.position() + 1);
        Ok(endianness)
    }

    fn read_u32(&mut self, endianness: Endianness) -> GeomResult<u32> {
        self.ensure(4)?;
        let offset = self.position();
        match endianness {
            Endianness::BigEndian => self.cursor.read_u32::<BigEndian>(),
            Endianness::LittleEndian => self.cursor.read_u32::<LittleEndian>(),
        }
        .map_err(|_| GeometryError::TruncatedBinary { offset, needed: 4 })
    }

    fn read_f64(&mut self, endianness: Endianness) -> GeomResult<f64> {
        self.ensure(8)?;
        let offset = self.position();
        match endianness {
            Endianness::BigEndian => self.cursor.read_f64::<BigEndian>(),
            Endianness::LittleEndian => self.cursor.read_f64::<LittleEndian>(),
        }
        .map_err(|_| GeometryError::TruncatedBinary { offset, needed: 8 })
    }

    /// Read an item count and check the input can hold that many items of `min_size` bytes
    fn read_count(&mut self, endianness: Endianness, min_size: usize) -> GeomResult<usize> {
        let count = self.read_u32(endianness)? as usize;
        let needed = count.saturating_mul(min_size);
        self.ensure(needed)?;
        Ok(count)
    }

    fn read_coord(&mut self, endianness: Endianness, dim: Dimension) -> GeomResult<Coord> {
        let mut values = [0.0; 4];
        for v in values.iter_mut().take(dim.size()) {
            *v = self.read_f64(endianness)?;
        }
        Coord::from_ordinates(&values[..dim.size()], dim).ok_or_else(|| {
            GeometryError::shape(format!("cannot build a {dim} coordinate"))
        })
    }

    fn read_coord_seq(&mut self, endianness: Endianness, dim: Dimension) -> GeomResult<Vec<Coord>> {
        let count = self.read_count(endianness, dim.size() * 8)?;
        (0..count).map(|_| self.read_coord(endianness, dim)).collect()
    }

    fn read_rings(&mut self, endianness: Endianness, dim: Dimension) -> GeomResult<Vec<Vec<Coord>>> {
        let count = self.read_count(endianness, 4)?;
        (0..count).map(|_| self.read_coord_seq(endianness, dim)).collect()
    }

    fn read_geometry(&mut self, depth: usize) -> GeomResult<Geometry> {
        if depth > MAX_DEPTH {
            return Err(GeometryError::malformed(
                self.position(),
                "geometry nesting too deep",
            ));
        }
        let start = self.position();
        let endianness = self.read_endianness()?;
        let code = self.read_u32(endianness)?;
        let info = registry::decode_wkb_code(code)?;
        let srid = if info.has_srid {
            Some(self.read_u32(endianness)?)
        } else {
            None
        };
        let dim = info.dimension;
        log::trace!(
            "Decoding {} {dim} ({endianness:?}) at offset {start}",
            info.geometry_type
        );

        let shape = match info.geometry_type {
            GeometryType::Point => {
                let c = self.read_coord(endianness, dim)?;
                let is_empty = c.ordinates().iter().all(|v| v.is_nan());
                Shape::Point(if is_empty { None } else { Some(c) })
            }
            GeometryType::LineString => Shape::LineString(self.read_coord_seq(endianness, dim)?),
            GeometryType::Polygon => Shape::Polygon(self.read_rings(endianness, dim)?),
            GeometryType::MultiPoint => {
                let members = self.read_members(endianness, depth, GeometryType::Point, dim)?;
                let mut points = Vec::with_capacity(members.len());
                for member in members {
                    match member.into_shape() {
                        Shape::Point(Some(c)) => points.push(c),
                        _ => return Err(GeometryError::shape("empty point inside a MultiPoint")),
                    }
                }
                Shape::MultiPoint(points)
            }
            GeometryType::MultiLineString => {
                let members = self.read_members(endianness, depth, GeometryType::LineString, dim)?;
                Shape::MultiLineString(
                    members
                        .into_iter()
                        .filter_map(|m| match m.into_shape() {
                            Shape::LineString(pts) => Some(pts),
                            _ => None,
                        })
                        .collect(),
                )
            }
            GeometryType::MultiPolygon => {
                let members = self.read_members(endianness, depth, GeometryType::Polygon, dim)?;
                Shape::MultiPolygon(
                    members
                        .into_iter()
                        .filter_map(|m| match m.into_shape() {
                            Shape::Polygon(rings) => Some(rings),
                            _ => None,
                        })
                        .collect(),
                )
            }
            GeometryType::GeometryCollection => {
                let count = self.read_count(endianness, MIN_MEMBER_SIZE)?;
                let members = (0..count)
                    .map(|_| self.read_geometry(depth + 1))
                    .collect::<GeomResult<Vec<_>>>()?;
                Shape::GeometryCollection(members)
            }
        };

        Ok(Geometry::new(shape, dim)?.with_srid(srid))
    }

    /// Read the members of a multi geometry, checking each has the expected type and dimension
    fn read_members(
        &mut self,
        endianness: Endianness,
        depth: usize,
        expected: GeometryType,
        dim: Dimension,
    ) -> GeomResult<Vec<Geometry>> {
        let count = self.read_count(endianness, MIN_MEMBER_SIZE)?;
        let mut members = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = self.position();
            let member = self.read_geometry(depth + 1)?;
            if member.geometry_type() != expected {
                return Err(GeometryError::shape(format!(
                    "expected {expected} member at offset {offset}, found {}",
                    member.geometry_type()
                )));
            }
            if member.dimension() != dim {
                return Err(GeometryError::DimensionMismatch {
                    expected: dim,
                    found: member.dimension(),
                    offset,
                });
            }
            members.push(member);
        }
        Ok(members)
    }
}

struct WkbWriter<'w, W: Write> {
    out: &'w mut W,
    options: WkbOptions,
}

impl<W: Write> WkbWriter<'_, W> {
    fn put_u32(&mut self, value: u32) -> GeomResult<()> {
        match self.options.endianness {
            Endianness::BigEndian => self.out.write_u32::<BigEndian>(value)?,
            Endianness::LittleEndian => self.out.write_u32::<LittleEndian>(value)?,
        }
        Ok(())
    }

    fn put_f64(&mut self, value: f64) -> GeomResult<()> {
        match self.options.endianness {
            Endianness::BigEndian => self.out.write_f64::<BigEndian>(value)?,
            Endianness::LittleEndian => self.out.write_f64::<LittleEndian>(value)?,
        }
        Ok(())
    }

    fn put_count(&mut self, count: usize) -> GeomResult<()> {
        let count = u32::try_from(count)
            .map_err(|_| GeometryError::shape(format!("{count} items do not fit a WKB count")))?;
        self.put_u32(count)
    }

    fn put_header(&mut self, ty: GeometryType, dim: Dimension, srid: Option<u32>) -> GeomResult<()> {
        self.out.write_u8(self.options.endianness.into())?;
        let code = registry::wkb_code(ty, dim, self.options.type_code_style, srid.is_some());
        self.put_u32(code)?;
        if let Some(srid) = srid {
            self.put_u32(srid)?;
        }
        Ok(())
    }

    fn put_coord(&mut self, c: &Coord) -> GeomResult<()> {
        for v in c.ordinates() {
            self.put_f64(v)?;
        }
        Ok(())
    }

    fn put_coord_seq(&mut self, pts: &[Coord]) -> GeomResult<()> {
        self.put_count(pts.len())?;
        for c in pts {
            self.put_coord(c)?;
        }
        Ok(())
    }

    fn put_rings(&mut self, rings: &[Vec<Coord>]) -> GeomResult<()> {
        self.put_count(rings.len())?;
        for ring in rings {
            self.put_coord_seq(ring)?;
        }
        Ok(())
    }

    fn write_geometry(&mut self, geom: &Geometry, srid: Option<u32>) -> GeomResult<()> {
        let dim = geom.dimension();
        self.put_header(geom.geometry_type(), dim, srid)?;

        match geom.shape() {
            Shape::Point(Some(c)) => self.put_coord(c),
            Shape::Point(None) => (0..dim.size()).try_for_each(|_| self.put_f64(f64::NAN)),
            Shape::LineString(pts) => self.put_coord_seq(pts),
            Shape::Polygon(rings) => self.put_rings(rings),
            Shape::MultiPoint(pts) => {
                self.put_count(pts.len())?;
                for c in pts {
                    self.put_header(GeometryType::Point, dim, None)?;
                    self.put_coord(c)?;
                }
                Ok(())
            }
            Shape::MultiLineString(lines) => {
                self.put_count(lines.len())?;
                for line in lines {
                    self.put_header(GeometryType::LineString, dim, None)?;
                    self.put_coord_seq(line)?;
                }
                Ok(())
            }
            Shape::MultiPolygon(polys) => {
                self.put_count(polys.len())?;
                for rings in polys {
                    self.put_header(GeometryType::Polygon, dim, None)?;
                    self.put_rings(rings)?;
                }
                Ok(())
            }
            Shape::GeometryCollection(members) => {
                self.put_count(members.len())?;
                for member in members {
                    self.write_geometry(member, member.srid())?;
                }
                Ok(())
            }
        }
    }
}
