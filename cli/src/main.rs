//! docweb CLI - DOCX to HTML conversion tool
//!
//! A command-line tool for converting DOCX files to semantic HTML.

use clap::{Parser, Subcommand};
use colored::*;
use docweb::{DocxParser, Message, RenderOptions, Severity};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// DOCX to HTML conversion
#[derive(Parser)]
#[command(
    name = "docweb",
    version,
    about = "Convert DOCX documents to HTML",
    long_about = "docweb - DOCX to HTML conversion tool.\n\n\
                  Reads the document body and renders it as clean, semantic HTML,\n\
                  reporting anything it could not faithfully convert."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document to HTML
    Html {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Prefix for generated element IDs
        #[arg(long, default_value = "")]
        id_prefix: String,

        /// Keep paragraphs that produce no content
        #[arg(long)]
        keep_empty_paragraphs: bool,
    },

    /// Extract a document's plain text
    Text {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump the document tree as JSON
    Json {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Html {
            input,
            output,
            id_prefix,
            keep_empty_paragraphs,
        } => {
            let options = RenderOptions::new()
                .id_prefix(id_prefix)
                .ignore_empty_paragraphs(!keep_empty_paragraphs);
            let converted = docweb::convert_to_html_with_options(&input, &options)?;

            report_messages(&converted.messages);
            write_output(output.as_ref(), &converted.html)?;

            if let Some(path) = output {
                println!(
                    "{} Converted to HTML: {}",
                    "✓".green().bold(),
                    path.display()
                );
            }
        }

        Commands::Text { input, output } => {
            let text = docweb::extract_raw_text(&input)?;
            write_output(output.as_ref(), &text)?;

            if let Some(path) = output {
                println!(
                    "{} Extracted text: {}",
                    "✓".green().bold(),
                    path.display()
                );
            }
        }

        Commands::Json {
            input,
            output,
            compact,
        } => {
            let result = DocxParser::open(&input)?.parse()?;
            report_messages(&result.messages);

            let json = if compact {
                serde_json::to_string(&result.value)?
            } else {
                serde_json::to_string_pretty(&result.value)?
            };
            write_output(output.as_ref(), &json)?;
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn report_messages(messages: &[Message]) {
    for message in messages {
        match message.severity {
            Severity::Warning => {
                eprintln!("{}: {}", "warning".yellow().bold(), message.text)
            }
            Severity::Error => {
                eprintln!("{}: {}", "error".red().bold(), message.text)
            }
        }
    }
}

fn print_version() {
    println!("{} {}", "docweb".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("DOCX to HTML conversion tool");
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
