use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docingest", version, about = "Parse documents into canonical JSONL records")]
pub struct Cli {
    /// Files to ingest; `-` reads newline-separated paths from stdin
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// YAML config file (defaults apply when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extract block-structured text instead of reading-order text
    #[arg(long)]
    pub no_layout: bool,

    /// Extract embedded PDF images
    #[arg(long)]
    pub extract_images: bool,

    /// Write extracted images here instead of keeping them in memory
    #[arg(long, value_name = "DIR", requires = "extract_images")]
    pub image_dir: Option<PathBuf>,

    /// Password for encrypted PDFs
    #[arg(long)]
    pub password: Option<String>,

    /// Text encoding label for plain-text files (default: utf-8)
    #[arg(long)]
    pub encoding: Option<String>,

    /// Maximum input size in megabytes
    #[arg(long, value_name = "MB")]
    pub max_size_mb: Option<u64>,

    /// Number of parallel workers (default: CPU count)
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Emit progress to stderr
    #[arg(long)]
    pub progress: bool,

    /// Report PDF structure instead of parsing
    #[arg(long)]
    pub inspect: bool,

    /// List registered parsers and exit
    #[arg(long)]
    pub list_parsers: bool,

    /// Log level for diagnostics on stderr (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}
