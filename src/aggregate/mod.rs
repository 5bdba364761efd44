//! Runs extractors concurrently and folds their listings into the
//! permanent / temporary / sale structure served by the API.

use futures_util::future::join_all;
use tokio::time::{timeout_at, Instant};

use crate::global::Global;
use crate::normalize::dedup_listings;
use crate::scraper::sources::Home;
use crate::scraper::{extract, ExtractError, FetchMode, Source};
use crate::stores::{PlatformGroup, Store};
use crate::types::{AggregateResult, Buckets, Category, GameListing, PlatformBuckets};


pub type Outcome = (Source, Result<Vec<GameListing>, ExtractError>);

/// Sources that can contribute to `category`. Sale pages also surface
/// full discounts, which belong to temporary.
pub fn sources_for(category: Category) -> Vec<Source> {
    Source::ALL
        .into_iter()
        .filter(|s| match category {
            Category::Permanent => s.category() == Category::Permanent,
            Category::Temporary => matches!(s.category(), Category::Temporary | Category::Sale),
            Category::Sale => s.category() == Category::Sale,
        })
        .collect()
}

pub async fn get_permanent_free_games(global: &Global) -> PlatformBuckets {
    run(global, &sources_for(Category::Permanent), FetchMode::Cached).await.permanent
}

pub async fn get_temporary_free_games(global: &Global) -> PlatformBuckets {
    run(global, &sources_for(Category::Temporary), FetchMode::Cached).await.temporary
}

pub async fn get_discounted_games(global: &Global) -> Buckets {
    run(global, &sources_for(Category::Sale), FetchMode::Cached).await.sale
}

pub async fn get_all(global: &Global, mode: FetchMode) -> AggregateResult {
    run(global, &Source::ALL, mode).await
}

/// Bypass the cache, then persist the result as the new backup unless
/// nothing at all came back.
#[tracing::instrument(name = "scrape_and_store", skip_all)]
pub async fn scrape_and_store(global: &Global) -> anyhow::Result<AggregateResult> {
    let result = get_all(global, FetchMode::Fresh).await;

    if result.is_empty() {
        tracing::warn!("scrape produced no listings, keeping previous backup");
    } else {
        global.backup.save(&result).await?;
    }

    Ok(result)
}

/// Run every enabled source in `sources` concurrently under one deadline.
#[tracing::instrument(name = "aggregate", skip(global, sources), fields(sources = sources.len()))]
pub async fn run(global: &Global, sources: &[Source], mode: FetchMode) -> AggregateResult {
    let deadline = Instant::now() + global.config.scraper.timeout();

    let enabled: Vec<Source> = sources
        .iter()
        .copied()
        .filter(|s| global.config.source(s.name()).enabled)
        .collect();

    let outcomes = join_all(enabled.into_iter().map(|source| async move {
        let outcome = match timeout_at(deadline, extract(global, source, mode)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ExtractError::Deadline),
        };
        (source, outcome)
    }))
    .await;

    let backup = global.backup.snapshot().await;
    let result = assemble(outcomes, backup.as_ref());

    tracing::info!(listings = result.listing_count(), "aggregated free games");
    result
}

/// Fold extractor outcomes into buckets. Pure, so routing and fallback can
/// be tested without a network.
///
/// Every source that ran gets its home bucket, possibly empty. A bucket left
/// empty is filled from `backup` when it has data for it.
pub fn assemble(outcomes: Vec<Outcome>, backup: Option<&AggregateResult>) -> AggregateResult {
    let mut result = AggregateResult::default();
    let mut unhealthy = Vec::new();

    for (source, outcome) in outcomes {
        let listings = match outcome {
            Ok(listings) => listings,
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "extractor failed");
                unhealthy.push((source, true));
                Vec::new()
            }
        };

        if let Home::Store(store) = source.home() {
            home_bucket(&mut result, source.category(), store);
        }

        if listings.is_empty() && !unhealthy.iter().any(|(s, _)| *s == source) {
            unhealthy.push((source, false));
        }

        for listing in listings {
            route(&mut result, source, listing);
        }
    }

    for_each_bucket(&mut result, |bucket| *bucket = dedup_listings(std::mem::take(bucket)));

    if let Some(backup) = backup {
        for (source, failed) in unhealthy {
            fall_back(&mut result, backup, source, failed);
        }
    }

    result
}

fn home_bucket(result: &mut AggregateResult, category: Category, store: Store) -> &mut Vec<GameListing> {
    result
        .buckets_mut(category, store.platform_group())
        .entry(store.bucket_key().to_string())
        .or_default()
}

/// A listing's discount decides its category before the source does: a
/// full discount is a temporary giveaway and a partial one is a sale.
/// Sale pages drop whatever is not actually discounted.
fn route(result: &mut AggregateResult, source: Source, listing: GameListing) {
    let category = match (listing.discount, source.category()) {
        (Some(d), _) if d.is_free() => Category::Temporary,
        (Some(d), _) if d.is_partial() => Category::Sale,
        (_, Category::Sale) => {
            tracing::debug!(source = source.name(), title = %listing.title, "dropping listing without a discount");
            return;
        }
        (_, category) => category,
    };

    let key = match source.home() {
        Home::Genre if category == Category::Permanent => listing.genre.clone(),
        _ => listing.store.bucket_key().to_string(),
    };

    result
        .buckets_mut(category, listing.store.platform_group())
        .entry(key)
        .or_default()
        .push(listing);
}

fn for_each_bucket(result: &mut AggregateResult, mut f: impl FnMut(&mut Vec<GameListing>)) {
    let AggregateResult { permanent, temporary, sale } = result;
    let groups = [
        &mut permanent.pc,
        &mut permanent.console,
        &mut temporary.pc,
        &mut temporary.console,
        sale,
    ];

    for buckets in groups {
        buckets.values_mut().for_each(&mut f);
    }
}

fn fall_back(result: &mut AggregateResult, backup: &AggregateResult, source: Source, failed: bool) {
    match source.home() {
        Home::Genre => {
            // Genre buckets that only ever held store-less catalogue entries
            for (genre, saved) in &backup.permanent.pc {
                if saved.is_empty() || !saved.iter().all(|l| l.store == Store::Unknown) {
                    continue;
                }
                let slot = result.permanent.pc.entry(genre.clone()).or_default();
                if slot.is_empty() {
                    *slot = saved.clone();
                    tracing::info!(source = source.name(), bucket = %genre, "served bucket from backup");
                }
            }
        }
        Home::Store(store) => {
            substitute(result, backup, source, source.category(), store);
            if failed && source.category() == Category::Sale {
                substitute(result, backup, source, Category::Temporary, store);
            }
        }
    }
}

fn substitute(result: &mut AggregateResult, backup: &AggregateResult, source: Source, category: Category, store: Store) {
    let group: PlatformGroup = store.platform_group();
    let key = store.bucket_key();

    let Some(saved) = backup.buckets(category, group).get(key).filter(|l| !l.is_empty()) else {
        return;
    };

    let slot = result.buckets_mut(category, group).entry(key.to_string()).or_default();
    if slot.is_empty() {
        *slot = saved.clone();
        tracing::info!(
            source = source.name(),
            category = category.slug(),
            bucket = key,
            listings = slot.len(),
            "served bucket from backup"
        );
    }
}
