//! Main entry point for the streamzip CLI application.
//!
//! This binary downloads (or opens) a ZIP archive and extracts it while
//! the bytes arrive, optionally verifying the transfer's SHA-256 digest
//! and saving the raw archive alongside the extracted entries.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use std::path::Path;
use std::time::Duration;

use streamzip::zip::ExtractSummary;
use streamzip::{ByteSource, Cli, ExtractOptions, FileSource, HttpSource, TeeSource, io::login};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = ExtractOptions {
        overwrite: cli.overwrite,
        dry_run: cli.dryrun,
        dest: cli.dest.clone(),
    };

    // The destination directory itself is not part of any entry name, so
    // the extractor never creates it.
    if let Some(dir) = &options.dest {
        if !options.dry_run {
            tokio::fs::create_dir_all(dir).await?;
        }
    }

    if cli.is_http_url() {
        extract_remote(&cli, &options).await
    } else {
        extract_local(&cli, &options).await
    }
}

/// Download the archive over HTTP and extract it as it streams.
async fn extract_remote(cli: &Cli, options: &ExtractOptions) -> Result<()> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .cookie_store(true)
        .build()?;

    // Optional login POST; cookies it sets ride along with the GET below.
    if let Some(path) = &cli.login {
        login(&client, &cli.source, path, cli.login_data.as_deref()).await?;
    }

    let source = HttpSource::open(&client, &cli.source).await?;

    let save_file = if cli.save && !cli.dryrun {
        let name = source
            .file_name()
            .ok_or_else(|| anyhow!("cannot derive a file name for --save from the URL"))?;
        Some(open_save_file(Path::new(&name), cli.overwrite).await?)
    } else {
        None
    };

    let source = TeeSource::new(source, cli.sha256.is_some(), save_file);
    let (source, summary) = run_extract(source, cli, options).await?;

    if cli.verbose {
        print_summary(cli, &summary);
        eprintln!(
            "Total bytes transferred: {}",
            format_size(source.get_ref().transferred_bytes())
        );
    }
    Ok(())
}

/// Extract an archive from the local filesystem.
async fn extract_local(cli: &Cli, options: &ExtractOptions) -> Result<()> {
    if cli.save {
        eprintln!("Ignoring --save: the source is already a local file");
    }

    let source = FileSource::open(Path::new(&cli.source)).await?;
    let source = TeeSource::new(source, cli.sha256.is_some(), None);
    let (_, summary) = run_extract(source, cli, options).await?;

    if cli.verbose {
        print_summary(cli, &summary);
    }
    Ok(())
}

/// Run the extraction and the post-extraction stream obligations.
///
/// The extractor stops right after the end-of-central-directory record,
/// but the digest and the saved copy must cover the whole transfer, so
/// the remainder of the stream is drained before the digest is compared.
async fn run_extract<S: ByteSource>(
    mut source: TeeSource<S>,
    cli: &Cli,
    options: &ExtractOptions,
) -> Result<(TeeSource<S>, ExtractSummary)> {
    let extract_result = streamzip::extract_archive(&mut source, options).await;

    let drain_result = if cli.sha256.is_some() || cli.save {
        source.drain().await.map(|_| ())
    } else {
        Ok(())
    };

    // An extraction failure is the primary diagnostic; drain problems
    // only surface when extraction itself succeeded.
    let summary = extract_result?;
    drain_result?;

    if let Some(expected) = cli.sha256 {
        if let Some(actual) = source.finish_digest() {
            if actual != expected {
                bail!("SHA-256 hash doesn't match");
            }
        }
    }

    Ok((source, summary))
}

/// Open the file the raw archive bytes are saved into.
async fn open_save_file(path: &Path, overwrite: bool) -> Result<tokio::fs::File> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    options
        .open(path)
        .await
        .map_err(|e| anyhow!("cannot save archive to {}: {e}", path.display()))
}

fn print_summary(cli: &Cli, summary: &ExtractSummary) {
    let verb = if cli.dryrun { "Validated" } else { "Extracted" };
    eprintln!(
        "{verb} {} entries: {} files, {} directories, {}",
        summary.entries,
        summary.files,
        summary.directories,
        format_size(summary.uncompressed_bytes)
    );
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
