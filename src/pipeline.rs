use std::collections::{HashMap, HashSet};

use futures::{StreamExt, stream};
use jiff::{ToSpan, civil::Date};
use tracing::{debug, info, warn};

use crate::{
    detail,
    error::AppResult,
    listing,
    models::{EnrichedMovie, InFlightMovie, ListingEntry, RunReport, ScreeningDay},
    notify::{self, Notifier},
    source::PageSource,
    store::MovieStore,
    window,
};

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub base_url: String,
    pub today: Date,
    pub days: usize,
    pub max_concurrent: usize,
    pub recipients: Vec<String>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub movies: Vec<EnrichedMovie>,
}

/// Merges date-scoped listing batches into one record per title, in first-seen order.
#[derive(Debug, Default)]
pub struct Aggregator {
    records: Vec<InFlightMovie>,
    index: HashMap<String, usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A date seen again for the same title replaces that date's times. The link of the
    /// first occurrence sticks.
    pub fn push_batch(&mut self, date: &str, entries: Vec<ListingEntry>) {
        for entry in entries {
            let idx = match self.index.get(&entry.title) {
                Some(&idx) => idx,
                None => {
                    self.records.push(InFlightMovie {
                        title: entry.title.clone(),
                        link: entry.link,
                        screenings: Vec::new(),
                    });
                    self.index.insert(entry.title, self.records.len() - 1);
                    self.records.len() - 1
                },
            };

            let screenings = &mut self.records[idx].screenings;
            match screenings.iter_mut().find(|day| day.date == date) {
                Some(day) => day.times = entry.times,
                None => screenings.push(ScreeningDay { date: date.to_string(), times: entry.times }),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> Vec<InFlightMovie> {
        self.records
    }
}

/// Drops every record whose title is already stored, whatever year it was stored under.
/// The year of a fresh listing is unknown until its detail page is fetched, so a title that
/// returns in a later production year is treated as known.
pub fn dedup_known(
    records: Vec<InFlightMovie>,
    known: &HashSet<(String, String)>,
) -> (Vec<InFlightMovie>, usize) {
    let known_titles: HashSet<&str> = known.iter().map(|(title, _)| title.as_str()).collect();
    let before = records.len();
    let fresh: Vec<InFlightMovie> = records
        .into_iter()
        .filter(|movie| {
            let seen = known_titles.contains(movie.title.as_str());
            if seen {
                debug!(title = %movie.title, "already known, skipping");
            }
            !seen
        })
        .collect();
    let dropped = before - fresh.len();
    (fresh, dropped)
}

pub async fn run(
    source: &dyn PageSource,
    store: &MovieStore,
    notifier: &dyn Notifier,
    options: RunOptions,
) -> AppResult<RunOutcome> {
    let mut report = RunReport::default();
    let workers = options.max_concurrent.max(1);

    let dates = window::date_window(options.today, options.days)?;
    let last_day = options.today.checked_add((options.days as i64 - 1).days())?;
    debug!(dates = ?dates, "fetching listings");

    let base_url = options.base_url.as_str();
    let batches: Vec<(String, Option<Vec<ListingEntry>>)> = stream::iter(dates)
        .map(|date| async move {
            match source.fetch_listing(&date).await {
                Ok(Some(fragment)) => {
                    let entries = listing::parse_listing(&fragment, base_url);
                    debug!(date = %date, entries = entries.len(), "parsed listing");
                    (date, Some(entries))
                },
                Ok(None) => {
                    debug!(date = %date, "empty listing");
                    (date, None)
                },
                Err(err) => {
                    warn!(date = %date, error = %err, transport = err.is_transport(), "failed to fetch listing");
                    (date, None)
                },
            }
        })
        .buffered(workers)
        .collect()
        .await;

    let mut aggregator = Aggregator::new();
    for (date, entries) in batches {
        match entries {
            Some(entries) => {
                report.dates_fetched += 1;
                aggregator.push_batch(&date, entries);
            },
            None => report.dates_skipped += 1,
        }
    }
    if aggregator.is_empty() {
        info!("no showings found in the date window");
    }
    report.discovered = aggregator.len();
    info!(discovered = report.discovered, dates_skipped = report.dates_skipped, "listings aggregated");

    let known = store.fetch_known_titles_and_years().await;
    let (fresh, already_known) = dedup_known(aggregator.finish(), &known);
    report.already_known = already_known;
    info!(new_titles = fresh.len(), already_known = already_known, "filtered known titles");

    let enriched: Vec<EnrichedMovie> = stream::iter(fresh)
        .map(|movie| async move {
            debug!(title = %movie.title, "fetching details");
            match source.fetch_detail(&movie.link).await {
                Ok(html) => {
                    let details = detail::parse_detail(&html);
                    debug!(title = %movie.title, genre = %details.genre, year = %details.year, "parsed details");
                    Some(EnrichedMovie::new(movie, details))
                },
                Err(err) => {
                    warn!(title = %movie.title, error = %err, "failed to fetch movie page");
                    None
                },
            }
        })
        .buffered(workers)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    report.enriched = enriched.len();
    report.detail_failures = report.discovered - report.already_known - report.enriched;

    for movie in &enriched {
        let movie_id = store.save_movie(&movie.title, &movie.details).await;
        if movie_id.is_some() {
            report.movies_saved += 1;
        }
        report.screenings_inserted += store.save_screenings(movie_id, &movie.screenings).await;
    }

    report.notified =
        notify::dispatch(notifier, &enriched, options.recipients, options.today, last_day).await;

    info!(
        enriched = report.enriched,
        detail_failures = report.detail_failures,
        movies_saved = report.movies_saved,
        screenings_inserted = report.screenings_inserted,
        "run complete"
    );

    Ok(RunOutcome { report, movies: enriched })
}
