//! # Boleta CLI
//!
//! Command-line interface for printing receipt markup.
//!
//! ## Usage
//!
//! ```bash
//! # Print a markup file on a USB printer
//! boleta print receipt.txt --device /dev/usb/lp0 --cut
//!
//! # 80mm printer, open the cash drawer afterwards
//! boleta print receipt.txt --profile 80mm --cash-drawer
//!
//! # Write the ESC/POS bytes to a file instead
//! boleta print receipt.txt --output receipt.bin
//!
//! # Convert a logo to an <img> tag
//! boleta image logo.png --no-gradient
//!
//! # Code page test pages for tables 0 and 16
//! boleta charsets 0 16
//! ```
//!
//! Set `RUST_LOG=boleta=debug` to trace flushes and layout.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use boleta::{
    BoletaError, MemorySink, Printer, PrinterProfile, Sink,
    transport::DeviceSink,
};

/// Boleta - ESC/POS receipt printing utility
#[derive(Parser, Debug)]
#[command(name = "boleta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a receipt markup file
    Print {
        /// Markup file
        file: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Cut the paper after printing
        #[arg(long)]
        cut: bool,

        /// Cut and open the cash drawer after printing
        #[arg(long)]
        cash_drawer: bool,

        /// Send images as 24-dot strips (ESC *) for printers without GS v 0
        #[arg(long)]
        strip_raster: bool,

        /// Paper feed after the receipt, in millimeters
        #[arg(long, default_value_t = boleta::printer::DEFAULT_FEED_MM)]
        feed_mm: f32,
    },

    /// Convert an image to an <img> markup tag
    Image {
        /// Image file (PNG, JPEG, ...)
        file: PathBuf,

        /// Printer profile: 58mm, 80mm or DPI:WIDTH_MM:CHARS
        #[arg(long, default_value = "58mm")]
        profile: String,

        /// Approximate grays with an ordered pattern (default)
        #[arg(long, overrides_with = "no_gradient")]
        gradient: bool,

        /// Plain black/white threshold
        #[arg(long, overrides_with = "gradient")]
        no_gradient: bool,
    },

    /// Print code page test pages
    Charsets {
        /// Table ids (omit for all 256)
        ids: Vec<u8>,

        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args, Debug)]
struct Target {
    /// Printer profile: 58mm, 80mm or DPI:WIDTH_MM:CHARS
    #[arg(long, default_value = "58mm")]
    profile: String,

    /// JSON profile file, overrides --profile
    #[arg(long, value_name = "FILE")]
    profile_file: Option<PathBuf>,

    /// Printer device path
    #[arg(long, default_value = "/dev/usb/lp0")]
    device: PathBuf,

    /// Write the command bytes to a file instead of a printer
    #[arg(long, value_name = "FILE", conflicts_with = "device")]
    output: Option<PathBuf>,
}

impl Target {
    fn profile(&self) -> Result<PrinterProfile, BoletaError> {
        match &self.profile_file {
            Some(path) => PrinterProfile::from_json_file(path),
            None => PrinterProfile::parse(&self.profile),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boleta=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), BoletaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Print {
            file,
            target,
            cut,
            cash_drawer,
            strip_raster,
            feed_mm,
        } => {
            let markup = std::fs::read_to_string(&file)?;
            let job = PrintJob {
                markup: &markup,
                cut,
                cash_drawer,
                strip_raster,
                feed_mm,
            };
            match &target.output {
                Some(path) => {
                    let mut printer = Printer::new(MemorySink::new(), target.profile()?);
                    job.run(&mut printer)?;
                    write_output(path, printer.sink())?;
                }
                None => {
                    let sink = DeviceSink::open(&target.device)?;
                    let mut printer = Printer::new(sink, target.profile()?);
                    job.run(&mut printer)?;
                    printer.disconnect();
                }
            }
            info!(file = %file.display(), "receipt printed");
        }

        Commands::Image {
            file,
            profile,
            gradient: _,
            no_gradient,
        } => {
            let profile = PrinterProfile::parse(&profile)?;
            let image = image::open(&file)
                .map_err(|e| BoletaError::Image(format!("Failed to open {}: {}", file.display(), e)))?;
            let raster = profile.image_to_raster(&image, !no_gradient)?;
            println!("<img>{}</img>", raster.to_hex());
        }

        Commands::Charsets { ids, target } => match &target.output {
            Some(path) => {
                let mut printer = Printer::new(MemorySink::new(), target.profile()?);
                print_charsets(&mut printer, &ids)?;
                write_output(path, printer.sink())?;
            }
            None => {
                let sink = DeviceSink::open(&target.device)?;
                let mut printer = Printer::new(sink, target.profile()?);
                print_charsets(&mut printer, &ids)?;
                printer.disconnect();
            }
        },
    }

    Ok(())
}

struct PrintJob<'a> {
    markup: &'a str,
    cut: bool,
    cash_drawer: bool,
    strip_raster: bool,
    feed_mm: f32,
}

impl PrintJob<'_> {
    fn run<S: Sink>(&self, printer: &mut Printer<S>) -> Result<(), BoletaError> {
        printer.use_strip_raster(self.strip_raster);
        if self.cash_drawer {
            printer.print_formatted_text_and_open_cash_drawer(self.markup, self.feed_mm)
        } else if self.cut {
            printer.print_formatted_text_and_cut(self.markup, self.feed_mm)
        } else {
            printer.print_formatted_text_mm(self.markup, self.feed_mm)
        }
    }
}

fn print_charsets<S: Sink>(printer: &mut Printer<S>, ids: &[u8]) -> Result<(), BoletaError> {
    if ids.is_empty() {
        printer.print_all_charset_tests()
    } else {
        printer.print_charset_tests(ids)
    }
}

/// Dump everything the job produced, unflushed bytes included.
fn write_output(path: &Path, sink: &MemorySink) -> Result<(), BoletaError> {
    let bytes = [sink.sent(), sink.pending()].concat();
    std::fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "command bytes written");
    Ok(())
}
