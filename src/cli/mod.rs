//! # CLI Module
//!
//! Command-line interface for visual product search.
//!
//! ## Usage
//! ```bash
//! # Find products that look like a photo
//! lookalike search shoe.jpg
//!
//! # Query by URL, stricter floor, JSON output
//! lookalike search --url https://example.com/shoe.jpg --min-score 75 --output json
//!
//! # Add a product to the catalog
//! lookalike add --id 1 --name "Runner" --category Shoes --price 59.99 \
//!     --image-url https://example.com/runner.jpg
//!
//! # Compare two stored fingerprints
//! lookalike compare c3d1e0f0b0a09080 c3d1e0f0b0a09081
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use lookalike::core::catalog::{default_catalog_path, CatalogItem, CatalogStore, SqliteCatalog};
use lookalike::core::hasher::{Fingerprint, HashAlgorithmKind, HasherConfig};
use lookalike::core::ingest::{
    FetchConfig, ImageIngestor, ImageSource, RemoteFetcher, DEFAULT_MAX_DOWNLOAD_BYTES,
};
use lookalike::core::matcher::QueryParams;
use lookalike::core::scorer::{similarity, SimilarityBand};
use lookalike::core::search::{SearchEngine, SearchRequest, SearchResult};
use lookalike::error::{FingerprintError, LookalikeError, Result};
use lookalike::events::{Event, EventChannel, IngestEvent, MatchEvent, SearchEvent};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Lookalike - Find products that look like your photo
#[derive(Parser, Debug)]
#[command(name = "lookalike")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging, skipped entries)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find catalog products similar to an image
    Search {
        #[command(flatten)]
        image: ImageArgs,

        /// Only show matches scoring at least this (0-100)
        #[arg(long, default_value = "50", allow_negative_numbers = true)]
        min_score: i64,

        /// Maximum number of matches to show
        #[arg(long, default_value = "24", allow_negative_numbers = true)]
        max_results: i64,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Print the fingerprint of an image
    Hash {
        #[command(flatten)]
        image: ImageArgs,
    },

    /// Compare two hex fingerprints
    Compare {
        /// First fingerprint
        first: String,

        /// Second fingerprint
        second: String,
    },

    /// Hash a product image and add it to the catalog
    Add {
        /// Product id (replaces an existing product with the same id)
        #[arg(long)]
        id: i64,

        /// Product name
        #[arg(long)]
        name: String,

        /// Product category
        #[arg(long)]
        category: String,

        /// Product price
        #[arg(long)]
        price: f64,

        /// Canonical image URL stored with the product
        #[arg(long)]
        image_url: String,

        /// Hash this local file instead of downloading the image URL
        #[arg(long)]
        file: Option<PathBuf>,

        /// Hash algorithm, recorded with the product; searches only score
        /// products added with the same one
        #[arg(short, long, default_value = "perceptual")]
        algorithm: Algorithm,

        /// Remote fetch timeout in seconds
        #[arg(long, default_value = "8")]
        timeout: u64,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Show catalog statistics
    Stats {
        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

/// Where the query image comes from
#[derive(Args, Debug)]
struct ImageArgs {
    /// Local image file
    #[arg(required_unless_present = "url", conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Remote image URL
    #[arg(long)]
    url: Option<String>,

    /// Hash algorithm; only products added with the same one are scored
    #[arg(short, long, default_value = "perceptual")]
    algorithm: Algorithm,

    /// Remote fetch timeout in seconds
    #[arg(long, default_value = "8")]
    timeout: u64,
}

impl ImageArgs {
    fn source(&self) -> Result<ImageSource> {
        match (&self.file, &self.url) {
            (Some(file), _) => Ok(ImageSource::Path(file.clone())),
            (None, Some(url)) => Ok(ImageSource::Url(url.clone())),
            (None, None) => Err(LookalikeError::Config(
                "Provide an image file or --url".to_string(),
            )),
        }
    }
}

#[derive(Args, Debug)]
struct CatalogArgs {
    /// Catalog database path
    #[arg(long, env = "LOOKALIKE_DB")]
    db: Option<PathBuf>,
}

impl CatalogArgs {
    fn path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(default_catalog_path)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Perceptual Hash - DCT based, what catalogs store (default)
    Perceptual,
    /// Difference Hash - Brightness gradients
    Difference,
    /// Average Hash - Fastest, least robust
    Average,
}

impl From<Algorithm> for HashAlgorithmKind {
    fn from(algo: Algorithm) -> Self {
        match algo {
            Algorithm::Perceptual => HashAlgorithmKind::Perceptual,
            Algorithm::Difference => HashAlgorithmKind::Difference,
            Algorithm::Average => HashAlgorithmKind::Average,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (id and score per line)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    lookalike::init_tracing(cli.verbose);

    match cli.command {
        Commands::Search {
            image,
            min_score,
            max_results,
            catalog,
            output,
        } => run_search(image, min_score, max_results, catalog, output, cli.verbose),
        Commands::Hash { image } => run_hash(image),
        Commands::Compare { first, second } => run_compare(&first, &second),
        Commands::Add {
            id,
            name,
            category,
            price,
            image_url,
            file,
            algorithm,
            timeout,
            catalog,
        } => {
            let source = match file {
                Some(path) => ImageSource::Path(path),
                None if is_remote(&image_url) => ImageSource::Url(image_url.clone()),
                None => ImageSource::Path(PathBuf::from(&image_url)),
            };
            let item = NewProduct {
                id,
                name,
                category,
                price,
                image_url,
            };
            run_add(item, source, algorithm.into(), timeout, catalog)
        }
        Commands::Stats { catalog } => run_stats(catalog),
    }
}

/// Print an error as a user-facing hint
pub fn print_error(error: &LookalikeError) {
    let term = Term::stderr();
    term.write_line(&format!(
        "{} {}",
        style("error:").red().bold(),
        error.user_message()
    ))
    .ok();

    let detail = error.to_string();
    if detail != error.user_message() {
        term.write_line(&format!("  {}", style(detail).dim())).ok();
    }
}

fn run_search(
    image: ImageArgs,
    min_score: i64,
    max_results: i64,
    catalog: CatalogArgs,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    // Reject bad parameters before touching the catalog or the network
    let params = QueryParams::new(min_score, max_results)?;
    let request = SearchRequest::new(image.source()?, params);

    let store = SqliteCatalog::open(&catalog.path())?;
    let engine = SearchEngine::builder()
        .algorithm(image.algorithm.into())
        .fetch_timeout(Duration::from_secs(image.timeout))
        .catalog(Box::new(store))
        .build()?;

    let (sender, receiver) = EventChannel::new();

    // Spinner for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Search(SearchEvent::PhaseChanged { phase, .. }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Ingest(IngestEvent::Fetched { bytes, .. }) => {
                    pb.set_message(format!("Downloaded {}", format_bytes(bytes as u64)));
                }
                Event::Match(MatchEvent::EntrySkipped { id, reason }) if verbose => {
                    pb.println(format!(
                        "  {} product #{}: {}",
                        style("skipped").yellow(),
                        id,
                        reason
                    ));
                }
                Event::Search(SearchEvent::Completed { .. })
                | Event::Search(SearchEvent::Failed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = engine.search_with_events(&request, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = result?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&Term::stdout(), &result, params),
        OutputFormat::Json => print_json_results(&result)?,
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &SearchResult, params: QueryParams) {
    term.write_line(&format!(
        "{} Search Complete",
        style("✓").green().bold()
    ))
    .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} products scanned in {:.1}s",
        style(result.catalog_size).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} matches at or above score {}",
        style(result.matches.len()).cyan(),
        params.min_score()
    ))
    .ok();

    let other_algorithm = result
        .skipped
        .iter()
        .filter(|s| matches!(s.error, FingerprintError::AlgorithmMismatch { .. }))
        .count();
    let unreadable = result.skipped.len() - other_algorithm;

    if unreadable > 0 {
        term.write_line(&format!(
            "  {} catalog entries skipped (unreadable fingerprint)",
            style(unreadable).yellow()
        ))
        .ok();
    }
    if other_algorithm > 0 {
        term.write_line(&format!(
            "  {} catalog entries skipped (not hashed with {})",
            style(other_algorithm).yellow(),
            result.algorithm.as_str()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  query fingerprint {}",
        style(&result.query_fingerprint).dim()
    ))
    .ok();
    term.write_line("").ok();

    if result.matches.is_empty() {
        term.write_line("  No similar products found. Try lowering --min-score.")
            .ok();
        return;
    }

    for (rank, m) in result.matches.iter().enumerate() {
        let band = SimilarityBand::from_score(m.score);
        let score = match band {
            SimilarityBand::Identical | SimilarityBand::NearIdentical => {
                style(format!("{:>3}", m.score)).green().bold()
            }
            SimilarityBand::Similar => style(format!("{:>3}", m.score)).green(),
            _ => style(format!("{:>3}", m.score)).yellow(),
        };

        term.write_line(&format!(
            "  {:>2}. {} {}  {} {}  {}",
            rank + 1,
            score,
            style(format!("{:<14}", band.to_string())).dim(),
            style(format!("#{}", m.item.id)).bold(),
            m.item.name,
            style(format!("{} · ${:.2}", m.item.category, m.item.price)).dim()
        ))
        .ok();
        term.write_line(&format!("        {}", style(&m.item.image_url).dim()))
            .ok();
    }
}

fn print_json_results(result: &SearchResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| LookalikeError::Config(format!("Failed to serialize results: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn print_minimal_results(result: &SearchResult) {
    for m in &result.matches {
        println!("{}\t{}", m.item.id, m.score);
    }
}

fn run_hash(image: ImageArgs) -> Result<()> {
    let ingestor = build_ingestor(image.algorithm.into(), image.timeout)?;
    let fingerprint = ingestor.ingest(&image.source()?)?;
    println!("{}", fingerprint);
    Ok(())
}

fn run_compare(first: &str, second: &str) -> Result<()> {
    let a = Fingerprint::from_hex(first)?;
    let b = Fingerprint::from_hex(second)?;
    let result = similarity(&a, &b)?;

    let term = Term::stdout();
    term.write_line(&format!(
        "distance {} of {} bits",
        style(result.distance).cyan(),
        result.bit_width
    ))
    .ok();
    term.write_line(&format!(
        "score    {} ({})",
        style(result.score).cyan().bold(),
        result.band
    ))
    .ok();
    Ok(())
}

/// Product fields given on the command line
struct NewProduct {
    id: i64,
    name: String,
    category: String,
    price: f64,
    image_url: String,
}

fn run_add(
    product: NewProduct,
    source: ImageSource,
    algorithm: HashAlgorithmKind,
    timeout: u64,
    catalog: CatalogArgs,
) -> Result<()> {
    let ingestor = build_ingestor(algorithm, timeout)?;
    let fingerprint = ingestor.ingest(&source)?;

    let path = catalog.path();
    let store = SqliteCatalog::create(&path)?;
    store.upsert(CatalogItem::new(
        product.id,
        product.name,
        product.category,
        product.image_url,
        product.price,
        &fingerprint,
        algorithm,
    ))?;

    Term::stdout()
        .write_line(&format!(
            "{} Added product #{} ({}) to {}",
            style("✓").green().bold(),
            product.id,
            style(&fingerprint).dim(),
            path.display()
        ))
        .ok();
    Ok(())
}

fn run_stats(catalog: CatalogArgs) -> Result<()> {
    let store = SqliteCatalog::open(&catalog.path())?;
    let items = store.list_all()?;

    let unreadable = items
        .iter()
        .filter(|item| item.decode_fingerprint().is_err())
        .count();

    let mut by_algorithm: BTreeMap<&str, usize> = BTreeMap::new();
    for item in &items {
        *by_algorithm.entry(item.algorithm.as_str()).or_default() += 1;
    }

    let term = Term::stdout();
    term.write_line(&format!("{}", style(store.path().display()).bold()))
        .ok();
    term.write_line(&format!("  {} products", style(items.len()).cyan()))
        .ok();
    for (algorithm, count) in &by_algorithm {
        term.write_line(&format!("    {} hashed with {}", count, algorithm))
            .ok();
    }
    if unreadable > 0 {
        term.write_line(&format!(
            "  {} with unreadable fingerprints (skipped during search)",
            style(unreadable).yellow()
        ))
        .ok();
    }
    Ok(())
}

fn build_ingestor(algorithm: HashAlgorithmKind, timeout: u64) -> Result<ImageIngestor> {
    let hasher = HasherConfig::new().algorithm(algorithm).build()?;
    let fetcher = RemoteFetcher::new(FetchConfig {
        timeout: Duration::from_secs(timeout),
        max_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
    })?;
    Ok(ImageIngestor::with_parts(hasher, fetcher))
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
