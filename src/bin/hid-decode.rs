// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use tracing_subscriber::prelude::*;

use hidtools::recording::{self, RecordingLine};
use hidtools::{DumpFormat, ReportDescriptor, UsageTable};

/// Layout of the report descriptor dump
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    /// Raw bytes, item and offset
    #[default]
    Default,
    /// A C array for a kernel driver
    Kernel,
}

impl From<Format> for DumpFormat {
    fn from(format: Format) -> DumpFormat {
        match format {
            Format::Default => DumpFormat::Default,
            Format::Kernel => DumpFormat::Kernel,
        }
    }
}

/// hid-decode command line arguments
#[derive(Parser, Debug)]
#[command(name = "hid-decode")]
#[command(version, about = "Decode HID report descriptors and the reports of a device recording", long_about = None)]
struct Args {
    /// Load the usage tables from the .hut files in this directory instead
    /// of the built-in tables
    #[arg(long, value_name = "DIR", global = true)]
    hut_dir: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the report descriptors and reports of a recording
    Decode {
        /// The recording to decode, stdin if omitted
        #[arg(value_name = "FILE")]
        recording: Option<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Format::Default)]
        format: Format,

        /// Skip the reports, only print the report descriptors
        #[arg(long)]
        descriptor_only: bool,
    },
    /// Convert a human-readable report descriptor into an R: line
    Compile {
        /// The report descriptor text, stdin if omitted
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let loaded;
    let table = match &args.hut_dir {
        Some(dir) => {
            loaded = UsageTable::load_dir(dir)
                .with_context(|| format!("Failed to load usage tables from {}", dir.display()))?;
            &loaded
        }
        None => UsageTable::builtin(),
    };

    match args.command {
        Command::Decode {
            recording,
            output,
            format,
            descriptor_only,
        } => {
            let input = open_input(recording.as_deref())?;
            let mut output = open_output(output.as_deref())?;
            decode(input, &mut output, format.into(), descriptor_only, table).with_context(
                || match &recording {
                    Some(path) => format!("Failed to decode {}", path.display()),
                    None => "Failed to decode stdin".to_string(),
                },
            )?;
            output.flush()?;
        }
        Command::Compile { input, output } => {
            let mut text = String::new();
            open_input(input.as_deref())?.read_to_string(&mut text)?;
            let rdesc = ReportDescriptor::from_text(&text, table)
                .context("Failed to compile the report descriptor")?;
            let mut output = open_output(output.as_deref())?;
            writeln!(output, "{}", recording::format_descriptor(&rdesc.to_bytes()))?;
            output.flush()?;
        }
    }

    Ok(())
}

/// Initialize logging with tracing, on stderr so stdout only carries the
/// decoded output
fn init_logging(verbose_count: u8) {
    let filter = match verbose_count {
        0 => "hidtools=warn,hid_decode=info",
        1 => "hidtools=debug,hid_decode=debug",
        _ => "hidtools=trace,hid_decode=trace",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}

fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    })
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    })
}

/// Prefix the decoded report with its timestamp. A report that spans
/// several lines has its continuation lines indented so the first field
/// lines up with the same field on the first line.
fn format_event(timestamp: &str, description: &str) -> String {
    let output = format!("{timestamp:>10} {description}");
    let mut indent = timestamp.len().max(10) + 1;
    if let Some(second) = output.split('\n').nth(1) {
        let field = second.find(':').and_then(|colon| second.get(1..colon));
        if let Some(pos) = field.and_then(|field| output.find(field)) {
            indent = pos.saturating_sub(1);
        }
    }
    output
        .split('\n')
        .collect::<Vec<_>>()
        .join(&format!("\n{}", " ".repeat(indent)))
}

fn decode(
    input: impl BufRead,
    output: &mut dyn Write,
    format: DumpFormat,
    descriptor_only: bool,
    table: &UsageTable,
) -> anyhow::Result<()> {
    let mut devices: BTreeMap<u32, ReportDescriptor> = BTreeMap::new();
    let mut device = 0;

    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        let lineno = idx + 1;
        let parsed =
            recording::parse_line(&line).with_context(|| format!("Invalid line {lineno}"))?;
        match parsed {
            RecordingLine::Device(d) => device = d,
            RecordingLine::Descriptor(bytes) => {
                let rdesc = ReportDescriptor::from_bytes(&bytes).with_context(|| {
                    format!("Failed to parse the report descriptor on line {lineno}")
                })?;
                write!(output, "{}", rdesc.dump(format, table))?;
                if rdesc.is_win8() {
                    writeln!(output, "**** win 8 certified ****")?;
                }
                devices.insert(device, rdesc);
            }
            RecordingLine::Event(event) if !descriptor_only => {
                let Some(rdesc) = devices.get(&device) else {
                    warn!("Line {lineno}: event for device {device} without a report descriptor");
                    continue;
                };
                match rdesc.describe_report(&event.data, table, true) {
                    Ok(description) => {
                        writeln!(output, "{}", format_event(&event.timestamp(), &description))?
                    }
                    Err(e) => debug!("Line {lineno}: skipping event: {e}"),
                }
            }
            RecordingLine::Other(line) if !descriptor_only => writeln!(output, "{line}")?,
            _ => {}
        }
    }

    Ok(())
}
