use serde::Serialize;

pub const GENRE_NOT_FOUND: &str = "Genre not found";
pub const DESCRIPTION_NOT_FOUND: &str = "Description not found";
pub const UNKNOWN: &str = "Unknown";

/// A value pulled out of a page by a heuristic, or the fact that nothing usable was there.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Field {
    Found(String),
    Missing,
}

impl Field {
    /// Trims `text`; blank text is treated as missing.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() { Field::Missing } else { Field::Found(text.to_string()) }
    }

    pub fn resolve(self, sentinel: &str) -> String {
        match self {
            Field::Found(value) => value,
            Field::Missing => sentinel.to_string(),
        }
    }
}

/// One showing block of a listing page.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListingEntry {
    pub title: String,
    pub link: String,
    pub times: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ScreeningDay {
    pub date: String,
    pub times: Vec<String>,
}

/// Everything seen about one title across the date window, before enrichment.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct InFlightMovie {
    pub title: String,
    pub link: String,
    pub screenings: Vec<ScreeningDay>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MovieDetails {
    pub genre: String,
    pub description: String,
    pub countries: String,
    pub year: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EnrichedMovie {
    pub title: String,
    pub link: String,
    #[serde(flatten)]
    pub details: MovieDetails,
    pub screenings: Vec<ScreeningDay>,
}

impl EnrichedMovie {
    pub fn new(movie: InFlightMovie, details: MovieDetails) -> Self {
        Self { title: movie.title, link: movie.link, details, screenings: movie.screenings }
    }
}

/// Shape handed to the notifier.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NotifiedMovie {
    pub title: String,
    pub link: String,
    pub genre: String,
    pub description: String,
    pub production_year: String,
    pub screening_times: Vec<ScreeningDay>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunReport {
    pub dates_fetched: usize,
    pub dates_skipped: usize,
    pub discovered: usize,
    pub already_known: usize,
    pub enriched: usize,
    pub detail_failures: usize,
    pub movies_saved: usize,
    pub screenings_inserted: u64,
    pub notified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_resolves_to_sentinel() {
        assert_eq!(Field::from_text("  \n ").resolve(UNKNOWN), "Unknown");
        assert_eq!(Field::from_text("  Dramat ").resolve(GENRE_NOT_FOUND), "Dramat");
    }
}
