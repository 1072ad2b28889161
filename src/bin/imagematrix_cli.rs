//! ImageMatrix CLI
//!
//! Commands: update, generate-stackbrew-library
//! Logs go to stderr; the library manifest goes to stdout.
//! Returns non-zero on any failure, 1 on invalid invocation.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use imagematrix_core::{
    GitRevisions, Manifest, Matrix, MatrixPipeline, PipelineError, RustupChecksums, TemplateSet,
};

#[derive(Parser)]
#[command(name = "imagematrix")]
#[command(about = "ImageMatrix - container image build matrix generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Repository root: output directories and CI files live here
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Path to templates directory, relative to the root unless absolute
    #[arg(short, long, default_value = "templates", global = true)]
    templates_dir: PathBuf,

    /// JSON file overriding sections of the built-in matrix
    #[arg(short, long, global = true)]
    matrix: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate every Dockerfile and CI matrix
    Update,

    /// Print the registry library manifest
    GenerateStackbrewLibrary,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            // clap's own message already carries the usage line
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("imagematrix=debug,imagematrix_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("imagematrix=info,imagematrix_core=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let matrix = match &cli.matrix {
        Some(path) => Matrix::load(path)?,
        None => Matrix::builtin(),
    };

    match cli.command {
        Commands::Update => {
            let templates = TemplateSet::load_from_dir(&cli.root.join(&cli.templates_dir))?;
            let checksums = RustupChecksums::new(matrix.checksum_base_url.clone());
            let pipeline = MatrixPipeline::new(matrix, templates, Box::new(checksums));

            let written = pipeline.update(&cli.root)?;
            tracing::info!(files = written.len(), "update complete");
            Ok(())
        }

        Commands::GenerateStackbrewLibrary => {
            let revisions = GitRevisions::new(&cli.root);
            let manifest = Manifest::generate(&matrix, &revisions)?;
            print!("{}", manifest);
            Ok(())
        }
    }
}
