use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli_commands;

use cli_commands::{ConvertOptions, DimensionStyleArg, EndianArg, OutputFormat};

#[derive(Debug, Parser)]
#[clap(author, version, about = "Convert geometries between WKT, WKB and GeoJSON", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the type, dimension and SRID of a geometry
    Inspect {
        /// WKT, hex WKB or GeoJSON text; `-` reads standard input
        input: String,
    },
    /// Re-encode a geometry in another format
    Convert {
        /// WKT, hex WKB or GeoJSON text; `-` reads standard input
        input: String,

        #[clap(long, value_enum)]
        to: OutputFormat,

        #[clap(long, value_enum, default_value_t = EndianArg::Little)]
        endian: EndianArg,

        #[clap(long, value_enum, default_value_t = DimensionStyleArg::Iso)]
        dimension_style: DimensionStyleArg,

        #[clap(long, help = "Write a named crs member in GeoJSON output")]
        crs: bool,

        #[clap(short, long, help = "Save the result to a file instead of printing it")]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    match args.command {
        Command::Inspect { input } => cli_commands::inspect(&cli_commands::load_input(&input)?),
        Command::Convert {
            input,
            to,
            endian,
            dimension_style,
            crs,
            output,
        } => {
            if let Some(ref fp) = output {
                cli_commands::check_output_path(fp)?;
            }
            let options = ConvertOptions {
                endian,
                dimension_style,
                crs,
            };
            cli_commands::convert(
                &cli_commands::load_input(&input)?,
                to,
                &options,
                output.as_deref(),
            )
        }
    }
}
