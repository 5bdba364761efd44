//! Standalone check for any extractor.
//!
//! Fetches the live upstream page for one source and runs its parser,
//! printing every listing it finds. Useful for verifying parsers after an
//! upstream layout change without running the full service.
//!
//! Run with: cargo run --bin test-parser -- <source> [url]
//! Examples:
//!   cargo run --bin test-parser -- epic_temporary
//!   cargo run --bin test-parser -- steam_discounted
//!   cargo run --bin test-parser -- itchio https://itch.io/games/on-sale/free

use std::collections::HashMap;

use free_games_api::config::{FetchConfig, ScraperConfig};
use free_games_api::fetch::Fetcher;
use free_games_api::scraper::{ParseContext, Source};
use free_games_api::types::GameListing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: {} <source> [url]", args[0]);
        print_known_sources();
        std::process::exit(1);
    }

    let Some(source) = Source::from_name(&args[1].to_lowercase()) else {
        eprintln!("Unknown source: {}", args[1]);
        print_known_sources();
        std::process::exit(1);
    };

    let url = args.get(2).map(String::as_str).unwrap_or(source.default_url());
    let fetcher = Fetcher::new(&FetchConfig::default())?;

    println!("Fetching {source} from {url}...\n");

    let body = fetcher.fetch(&source.request(url)).await?;
    println!("Body length: {} chars\n", body.len());

    let listings = source.parse(&body, &ParseContext::new(&ScraperConfig::default(), url))?;
    print_results(&listings);

    Ok(())
}

fn print_results(listings: &[GameListing]) {
    println!("Parsed {} listings:\n", listings.len());
    println!("{:<40} {:<10} {:<12} LINK", "TITLE", "STORE", "DISCOUNT");
    println!("{}", "-".repeat(100));

    let mut seen: HashMap<String, usize> = HashMap::new();
    for listing in listings {
        *seen.entry(listing.title.to_lowercase()).or_default() += 1;

        let discount = listing
            .discount
            .map(|d| format!("-{}%", d.discount_percentage))
            .unwrap_or_else(|| "-".into());
        let end = listing
            .end_date
            .map(|d| format!(" (ends {}{})", d.format("%Y-%m-%d"), if listing.end_date_estimated { ", est." } else { "" }))
            .unwrap_or_default();

        println!("{:<40} {:<10} {:<12} {}{}", listing.title, listing.store.slug(), discount, listing.link, end);
    }

    let duplicates: Vec<_> = seen.iter().filter(|(_, n)| **n > 1).collect();
    if duplicates.is_empty() {
        println!("\nNo case-insensitive duplicate titles.");
    } else {
        println!("\nCase-insensitive duplicate titles:");
        for (title, n) in duplicates {
            println!("  {title} x{n}");
        }
    }
}

fn print_known_sources() {
    eprintln!("Known sources:");
    for source in Source::ALL {
        eprintln!("  {:<18} {}", source.name(), source.default_url());
    }
}
