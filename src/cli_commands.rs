use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use geoformat::serialization::*;
use geoformat::{DimensionStyle, Geometry, TypeCodeStyle};

/// Encodings an input may be detected as
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Wkt,
    HexWkb,
    GeoJson,
}

/// Encodings a geometry may be converted to
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// WKT without the SRID prefix
    Wkt,
    /// WKT with the `SRID=n;` prefix
    Ewkt,
    /// Hex WKB without the SRID
    Wkb,
    /// Hex EWKB, PostGIS flag bits and embedded SRID
    Ewkb,
    Geojson,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EndianArg {
    Big,
    #[default]
    Little,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DimensionStyleArg {
    #[default]
    Iso,
    Postgis,
}

/// Writer settings gathered from the command line
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvertOptions {
    pub endian: EndianArg,
    pub dimension_style: DimensionStyleArg,
    pub crs: bool,
}

/// Input text given on the command line; `-` reads standard input
pub fn load_input(input: &str) -> Result<String> {
    if input != "-" {
        return Ok(input.to_string());
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read standard input")?;
    Ok(buf)
}

/// Guess the encoding of an input from its first characters
pub fn detect_format(input: &str) -> InputFormat {
    let trimmed = input.trim();
    if trimmed.starts_with('{') {
        InputFormat::GeoJson
    } else if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
        InputFormat::HexWkb
    } else {
        InputFormat::Wkt
    }
}

/// A decoded input and how it was encoded
#[derive(Clone, Debug)]
pub struct ParsedInput {
    pub geometry: Geometry,
    pub format: InputFormat,
    /// Byte order and type code convention of hex WKB input
    pub wkb_options: Option<WkbOptions>,
}

/// Decode an input in whichever encoding it was detected as
pub fn read_input(input: &str) -> Result<ParsedInput> {
    let format = detect_format(input);
    log::debug!("Detected input format {format:?}");
    let mut wkb_options = None;
    let geometry = match format {
        InputFormat::GeoJson => {
            let value: serde_json::Value =
                serde_json::from_str(input).context("Input is not valid JSON")?;
            read_geojson(&value).context("Failed to read GeoJSON")?
        }
        InputFormat::HexWkb => {
            let bytes = decode_hex(input).context("Failed to read hex WKB")?;
            let (geom, options) =
                read_wkb_with_options(&bytes).context("Failed to read hex WKB")?;
            wkb_options = Some(options);
            geom
        }
        InputFormat::Wkt => parse_wkt(input).context("Failed to parse WKT")?,
    };
    Ok(ParsedInput {
        geometry,
        format,
        wkb_options,
    })
}

/// Summary lines describing a parsed input
pub fn describe(input: &str) -> Result<Vec<String>> {
    let ParsedInput {
        geometry: geom,
        format,
        wkb_options,
    } = read_input(input)?;
    let mut lines = vec![
        format!("Format: {format:?}"),
        format!("Type: {}", geom.geometry_type()),
        format!("Dimension: {}", geom.dimension()),
        match geom.srid() {
            Some(srid) => format!("SRID: {srid}"),
            None => String::from("SRID: none"),
        },
        format!("Members: {}", geom.shape().size()),
        format!("Empty: {}", geom.is_empty()),
    ];
    if let Some(options) = wkb_options {
        lines.push(format!("Byte order: {:?}", options.endianness));
        lines.push(format!("Type codes: {:?}", options.type_code_style));
    }
    if !geom.properties().is_empty() {
        lines.push(format!("Properties: {}", geom.properties().len()));
    }
    Ok(lines)
}

/// Render a geometry in the requested output encoding
pub fn render(geom: &Geometry, to: OutputFormat, options: &ConvertOptions) -> Result<String> {
    let dimension_style = match options.dimension_style {
        DimensionStyleArg::Iso => DimensionStyle::Iso,
        DimensionStyleArg::Postgis => DimensionStyle::PostGis,
    };
    let endianness = match options.endian {
        EndianArg::Big => Endianness::BigEndian,
        EndianArg::Little => Endianness::LittleEndian,
    };
    let out = match to {
        OutputFormat::Wkt => write_wkt(
            &geom.clone().with_srid(None::<u32>),
            &WktOptions { dimension_style },
        ),
        OutputFormat::Ewkt => write_wkt(geom, &WktOptions { dimension_style }),
        OutputFormat::Wkb => write_hex_wkb(
            &geom.clone().with_srid(None::<u32>),
            &WkbOptions {
                endianness,
                type_code_style: TypeCodeStyle::IsoOffsets,
            },
        )?,
        OutputFormat::Ewkb => write_hex_wkb(
            geom,
            &WkbOptions {
                endianness,
                type_code_style: TypeCodeStyle::ExtendedFlags,
            },
        )?,
        OutputFormat::Geojson => {
            let value = write_geojson(geom, &GeoJsonOptions { write_crs: options.crs });
            serde_json::to_string(&value)?
        }
    };
    Ok(out)
}

/// Parse the input and print a short description of it
pub fn inspect(input: &str) -> Result<()> {
    for line in describe(input)? {
        println!("{line}");
    }
    Ok(())
}

/// Convert the input and print it, or save it when an output path is given
pub fn convert(
    input: &str,
    to: OutputFormat,
    options: &ConvertOptions,
    output_path: Option<&Path>,
) -> Result<()> {
    let geom = read_input(input)?.geometry;
    let rendered = render(&geom, to, options)?;
    match output_path {
        None => println!("{rendered}"),
        Some(fp) => {
            let mut file = File::create(fp)
                .with_context(|| format!("Failed to create file '{}'", fp.display()))?;
            file.write_all(rendered.as_bytes())
                .with_context(|| format!("Failed to write to file '{}'", fp.display()))?;
            log::info!("Saved {to:?} output to '{}'", fp.display());
        }
    }
    Ok(())
}

/// Reject output paths pointing at directories before any work is done
pub fn check_output_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        bail!("Output path '{}' is a directory", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("POINT(1 2)"), InputFormat::Wkt);
        assert_eq!(detect_format("  {\"type\": \"Point\"}"), InputFormat::GeoJson);
        assert_eq!(
            detect_format("0101000000000000000000F03F000000000000F03F\n"),
            InputFormat::HexWkb
        );
        assert_eq!(detect_format(""), InputFormat::Wkt);
    }

    #[test]
    fn test_describe() {
        let lines = describe("SRID=4326;LINESTRING Z (0 0 0,1 1 1)").unwrap();
        assert!(lines.contains(&String::from("Type: LineString")));
        assert!(lines.contains(&String::from("Dimension: XYZ")));
        assert!(lines.contains(&String::from("SRID: 4326")));
        assert!(lines.contains(&String::from("Members: 2")));

        let lines = describe("00000000013FF00000000000003FF0000000000000").unwrap();
        assert!(lines.contains(&String::from("Byte order: BigEndian")));
        assert!(lines.contains(&String::from("Type codes: IsoOffsets")));

        let hex = "01010000A0E6100000000000000000F03F00000000000000400000000000000840";
        let parsed = read_input(hex).unwrap();
        assert_eq!(parsed.format, InputFormat::HexWkb);
        assert_eq!(
            parsed.wkb_options,
            Some(WkbOptions {
                endianness: Endianness::LittleEndian,
                type_code_style: TypeCodeStyle::ExtendedFlags,
            })
        );
        assert_eq!(read_input("POINT(1 2)").unwrap().wkb_options, None);
    }

    #[test]
    fn test_render_targets() {
        let geom = read_input("SRID=4326;POINT(30 -90)").unwrap().geometry;
        let options = ConvertOptions::default();
        assert_eq!(
            render(&geom, OutputFormat::Wkt, &options).unwrap(),
            "POINT(30 -90)"
        );
        assert_eq!(
            render(&geom, OutputFormat::Ewkt, &options).unwrap(),
            "SRID=4326;POINT(30 -90)"
        );
        assert_eq!(
            render(&geom, OutputFormat::Ewkb, &options).unwrap(),
            "0101000020E61000000000000000003E4000000000008056C0"
        );
        let json = render(
            &geom,
            OutputFormat::Geojson,
            &ConvertOptions {
                crs: true,
                ..Default::default()
            },
        )
        .unwrap();
        let back = read_input(&json).unwrap();
        assert_eq!(back.format, InputFormat::GeoJson);
        assert_eq!(back.geometry, geom);
    }

    #[test]
    fn test_bad_input() {
        assert!(read_input("POINT(1 x)").is_err());
        assert!(read_input("{not json").is_err());
        assert!(read_input("0101").is_err());
    }
}
