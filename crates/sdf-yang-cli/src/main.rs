//! Batch driver for the YANG <-> SDF translation engine.
//!
//! Each input file is converted on its own: `.yang` inputs become SDF JSON,
//! `.json` inputs become YANG module text, and anything else is sniffed from
//! the content. Output lands next to the input with the extension swapped
//! unless `--output` names a destination.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use sdf_yang_core::{convert_yang, detect_format, sdf_to_yang, InputFormat};

#[derive(Parser)]
#[command(name = "sdf-yang")]
#[command(version)]
#[command(about = "Convert YANG modules to SDF documents and back")]
struct Cli {
    /// Files to convert
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Destination file (single input only); defaults to the input path
    /// with the extension swapped
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Companion YANG modules loaded alongside each .yang input so
    /// cross-module augments and references can resolve
    #[arg(short, long)]
    include: Vec<PathBuf>,

    /// Force the input format instead of inferring it from the extension
    #[arg(short, long, value_enum)]
    from: Option<Format>,

    /// Print the converted text to stdout instead of writing files
    #[arg(long)]
    stdout: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Yang,
    Sdf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.output.is_some() && cli.inputs.len() > 1 {
        bail!("--output needs a single input file");
    }

    let mut companions = Vec::new();
    for path in &cli.include {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading include {}", path.display()))?;
        companions.push(text);
    }
    let companion_refs: Vec<&str> = companions.iter().map(String::as_str).collect();

    for input in &cli.inputs {
        let text = fs::read_to_string(input)
            .with_context(|| format!("reading {}", input.display()))?;
        let format = match cli.from {
            Some(Format::Yang) => InputFormat::Yang,
            Some(Format::Sdf) => InputFormat::Sdf,
            None => match format_from_extension(input) {
                Some(f) => f,
                None => detect_format(&text)
                    .with_context(|| format!("detecting format of {}", input.display()))?,
            },
        };

        let (converted, diags) = match format {
            InputFormat::Yang => convert_yang(&text, &companion_refs)
                .with_context(|| format!("converting {}", input.display()))?,
            InputFormat::Sdf => sdf_to_yang(&text)
                .with_context(|| format!("converting {}", input.display()))?,
        };
        if !diags.is_empty() {
            eprintln!("{}: {}", input.display(), diags.summary());
        }

        if cli.stdout {
            println!("{converted}");
            continue;
        }
        let dest = match &cli.output {
            Some(path) => path.clone(),
            None => sibling_output(input, format),
        };
        fs::write(&dest, &converted)
            .with_context(|| format!("writing {}", dest.display()))?;
        tracing::info!(input = %input.display(), output = %dest.display(), "converted");
    }
    Ok(())
}

fn format_from_extension(path: &Path) -> Option<InputFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yang") => Some(InputFormat::Yang),
        Some("json") | Some("sdf") => Some(InputFormat::Sdf),
        _ => None,
    }
}

fn sibling_output(input: &Path, format: InputFormat) -> PathBuf {
    let ext = match format {
        InputFormat::Yang => "sdf.json",
        InputFormat::Sdf => "yang",
    };
    input.with_extension(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_picks_direction() {
        assert_eq!(
            format_from_extension(Path::new("a/model.yang")),
            Some(InputFormat::Yang)
        );
        assert_eq!(
            format_from_extension(Path::new("model.json")),
            Some(InputFormat::Sdf)
        );
        assert_eq!(format_from_extension(Path::new("model.txt")), None);
    }

    #[test]
    fn output_name_swaps_extension() {
        assert_eq!(
            sibling_output(Path::new("m.yang"), InputFormat::Yang),
            PathBuf::from("m.sdf.json")
        );
        assert_eq!(
            sibling_output(Path::new("m.sdf.json"), InputFormat::Sdf),
            PathBuf::from("m.sdf.yang")
        );
    }
}
