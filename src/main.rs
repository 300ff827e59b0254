//! Headless front end: apply an annotation job to a PDF and export it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use veil::{
    load_config, verify_flattened, EditorSession, ExportJob, ExportMode, LopdfCodec,
    PdfiumRenderer,
};
use veil_core::{CodecDocument, DocumentCodec};

/// Redact and annotate PDF documents
#[derive(Parser)]
#[command(name = "veil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a job file and write `<name>_edited.pdf`
    Export {
        input: PathBuf,

        /// JSON file listing redactions, texts and images
        #[arg(short, long)]
        job: Option<PathBuf>,

        /// Directory for the output (defaults to the input's directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Draw over the original instead of flattening. Covered content stays
        /// in the file.
        #[arg(long)]
        overlay: bool,
    },

    /// Print page count and page sizes
    Info { input: PathBuf },

    /// Check that a PDF consists only of flattened page images
    Verify { input: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Commands::Export {
            input,
            job,
            out_dir,
            overlay,
        } => run_export(
            &input,
            job.as_deref(),
            out_dir.as_deref(),
            overlay,
            cli.config.as_deref(),
        ),
        Commands::Info { input } => run_info(&input),
        Commands::Verify { input } => run_verify(&input),
    }
}

fn file_name_of(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))
}

fn run_export(
    input: &Path,
    job: Option<&Path>,
    out_dir: Option<&Path>,
    overlay: bool,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let bytes = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;

    let renderer = PdfiumRenderer::bind(config.pdfium_library_dir.as_deref())?;
    let mut session = EditorSession::new(renderer, LopdfCodec, config);
    session.load_document(&file_name_of(input)?, bytes)?;

    if let Some(job_path) = job {
        let job = ExportJob::load(job_path)?;
        let base_dir = job_path.parent().unwrap_or_else(|| Path::new("."));
        job.apply(&mut session.store().lock(), base_dir)?;
    }

    let mode = if overlay {
        log::warn!("overlay export keeps the original content under every redaction");
        ExportMode::Overlay
    } else {
        ExportMode::Secure
    };
    let artifact = session.export_with_mode(mode)?;

    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
    };
    let out_path = dir.join(&artifact.file_name);
    fs::write(&out_path, &artifact.bytes)
        .with_context(|| format!("cannot write {}", out_path.display()))?;

    println!("{}", serde_json::to_string_pretty(&artifact.report)?);
    eprintln!("wrote {}", out_path.display());
    Ok(())
}

fn run_info(input: &Path) -> anyhow::Result<()> {
    let bytes = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;
    let document = LopdfCodec.load(&bytes)?;
    let page_count = document.page_count();
    println!("{}: {} pages", input.display(), page_count);
    for page_number in 1..=page_count {
        let size = document.page_size(page_number)?;
        println!("  page {}: {:.1} x {:.1}", page_number, size.width, size.height);
    }
    Ok(())
}

fn run_verify(input: &Path) -> anyhow::Result<()> {
    let bytes = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;
    let result = verify_flattened(&bytes);
    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.ok {
        bail!("{} is not flattened: {}", input.display(), result.summary());
    }
    Ok(())
}
