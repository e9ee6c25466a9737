use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use linkmap_core::crawl::{CrawlOptions, execute_crawl, generate_crawl_report};
use linkmap_core::data::Database;
use linkmap_core::query::{links_to, render_links_json, render_links_table};
use linkmap_crawler::Domain;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// The crawler originally ran from this fixed set before any links were
/// known; with no --seed and no --hosts-file we start the same way.
pub const DEFAULT_SEEDS: [&str; 5] = [
    "amazon.com",
    "google.com",
    "bing.com",
    "youtube.com",
    "facebook.com",
];

pub const DB_FILE_NAME: &str = "linkmap.db";

/// Expand `~` in a configured directory and point at the database file
/// inside it.
pub fn resolve_db_path(dir: &str) -> PathBuf {
    let expanded = shellexpand::tilde(dir);
    Path::new(expanded.as_ref()).join(DB_FILE_NAME)
}

/// Collect seeds from the CLI: explicit --seed flags, a hosts file, or
/// the built-in defaults.
pub fn load_seeds_from_source(
    seeds: Vec<String>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>> {
    if let Some(path) = hosts_file {
        return load_seeds_from_file(path);
    }
    if !seeds.is_empty() {
        let parsed: Vec<String> = seeds.iter().filter_map(|s| parse_seed_line(s)).collect();
        if parsed.is_empty() {
            bail!("none of the given seeds are valid domains");
        }
        return Ok(parsed);
    }
    Ok(DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect())
}

/// Load and validate seed domains from a file, one per line. Blank
/// lines and `#` comments are skipped.
pub fn load_seeds_from_file(path: &PathBuf) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read hosts file {}", path.display()))?;

    let seeds: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_seed_line)
        .collect();

    if seeds.is_empty() {
        bail!("no valid seed domains found in {}", path.display());
    }

    Ok(seeds)
}

/// Validate one seed line, reducing it to a bare domain.
pub fn parse_seed_line(line: &str) -> Option<String> {
    match Domain::parse(line) {
        Ok(domain) => Some(domain.to_string()),
        Err(_) => {
            eprintln!("skipping invalid seed {line:?}");
            None
        }
    }
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    let dir = args.get_one::<String>("PATH").unwrap();
    let force = args.get_flag("force");

    let expanded = shellexpand::tilde(dir);
    let config_dir = Path::new(expanded.as_ref());
    let db_path = config_dir.join(DB_FILE_NAME);

    if Database::exists(&db_path) && !force {
        bail!(
            "database already exists at {} (use --force to recreate it)",
            db_path.display()
        );
    }

    fs::create_dir_all(config_dir)
        .with_context(|| format!("failed to create {}", config_dir.display()))?;

    if Database::exists(&db_path) {
        Database::drop(&db_path);
    }

    Database::new(&db_path)
        .with_context(|| format!("failed to create database at {}", db_path.display()))?;

    println!(
        "{} Link store ready at {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    Ok(())
}

pub async fn handle_crawl(args: &ArgMatches) -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let seeds: Vec<String> = args
        .get_many::<String>("seed")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let hosts_file = args.get_one::<PathBuf>("hosts-file");
    let workers = *args.get_one::<usize>("workers").unwrap();
    let timeout_secs = *args.get_one::<u64>("timeout").unwrap();
    let max_domains = args.get_one::<usize>("limit").copied();
    let db_path = resolve_db_path(args.get_one::<String>("db").unwrap());
    let show_progress = !args.get_flag("no-progress");

    let seeds = load_seeds_from_source(seeds, hosts_file)?;

    println!(
        "Crawling from {} seed(s) with {} workers\n",
        seeds.len(),
        workers
    );
    info!("link store at {}", db_path.display());

    let options = CrawlOptions {
        seeds,
        workers,
        timeout_secs,
        max_domains,
        show_progress,
    };
    let report = execute_crawl(&db_path, options).await?;

    println!("\n{} Crawl complete\n", "✓".green().bold());
    print!("{}", generate_crawl_report(&report));
    Ok(())
}

pub fn handle_query(args: &ArgMatches) -> Result<()> {
    let domain = args.get_one::<String>("domain").unwrap();
    let format = args.get_one::<String>("format").unwrap();
    let db_path = resolve_db_path(args.get_one::<String>("db").unwrap());

    if !Database::exists(&db_path) {
        bail!(
            "no link store at {} (run `linkmap init` and `linkmap crawl` first)",
            db_path.display()
        );
    }

    let db = Database::new(&db_path)
        .with_context(|| format!("cannot open link store at {}", db_path.display()))?;

    let links = links_to(&db, domain)?;
    match format.as_str() {
        "json" => println!("{}", render_links_json(domain, &links)),
        _ => print!("{}", render_links_table(domain, &links)),
    }
    Ok(())
}
