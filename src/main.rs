//! Main entry point for the arcview CLI application.
//!
//! Lists archives as a directory tree and extracts them, using the remote
//! RAR helper when one is configured.

use anyhow::{Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use arcview::cli::Command;
use arcview::{BackendResolver, Cli, ExtractOutcome, ListingEntry, ListingResult};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let resolver = BackendResolver::new(cli.resolver_config());

    match &cli.command {
        Command::List {
            file,
            subpath,
            json,
            recursive,
        } => {
            let listing = resolver.list_contents(file, subpath).await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else if listing.success {
                print_listing(&listing, *recursive);
            }

            if !listing.success {
                let category = listing
                    .category
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "Error".to_string());
                bail!(
                    "{}: {}",
                    category,
                    listing.error.as_deref().unwrap_or("listing failed")
                );
            }
        }
        Command::Extract {
            file,
            output_dir,
            password,
        } => {
            match resolver
                .extract_archive(file, output_dir.as_deref(), password.as_deref())
                .await
            {
                ExtractOutcome::Extracted(path) => println!("  extracted to: {}", path.display()),
                ExtractOutcome::Failed(reason) => bail!("extraction failed: {}", reason),
            }
        }
    }

    Ok(())
}

/// Print a listing as a table, like `unzip -v`.
fn print_listing(listing: &ListingResult, recursive: bool) {
    let entries: Vec<&ListingEntry> = if recursive {
        listing.entries.iter().collect()
    } else {
        listing.children().collect()
    };

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    for entry in &entries {
        let (date, time) = match entry.modified_at {
            Some(ts) => (
                ts.format("%Y-%m-%d").to_string(),
                ts.format("%H:%M").to_string(),
            ),
            None => (String::new(), String::new()),
        };

        let name = if recursive { &entry.path } else { &entry.name };
        let suffix = if entry.is_dir { "/" } else { "" };

        println!(
            "{:>10}  {:>10}  {}  {:>10}  {:>5}  {}{}",
            entry.size,
            entry.compressed_size,
            ratio(entry.size, entry.compressed_size),
            date,
            time,
            name,
            suffix
        );
    }

    // Totals cover the whole subtree, not only the rows shown
    let total_compressed: u64 = listing
        .entries
        .iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.compressed_size)
        .sum();

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files ({})",
        listing.total_size,
        total_compressed,
        ratio(listing.total_size, total_compressed),
        "",
        listing.file_count,
        format_size(listing.total_size)
    );
}

/// Compression ratio as percentage saved.
fn ratio(size: u64, compressed: u64) -> String {
    if size > 0 && compressed <= size {
        format!("{:>4}%", 100 - (compressed * 100 / size))
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
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
