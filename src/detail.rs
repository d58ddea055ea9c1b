//! Heuristic extraction of movie metadata from a detail page.
//!
//! Each extractor works on the parsed document on its own and returns a [`Field`]; a miss in
//! one never affects the others.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::models::{DESCRIPTION_NOT_FOUND, Field, GENRE_NOT_FOUND, MovieDetails, UNKNOWN};

static GENRE_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)gatunek").unwrap());
static GENRE_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)gatunek:").unwrap());
static GENRE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)kategoria wiekowa:|czas trwania:").unwrap());
static DESCRIPTION_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)opis").unwrap());
static PRODUCTION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)produkcja:").unwrap());

static TRAILING_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]{4})$").unwrap());

pub fn parse_detail(html: &str) -> MovieDetails {
    let doc = Html::parse_document(html);

    let (genre, genre_parent) = extract_genre(&doc);
    let description = extract_description(&doc, genre_parent);
    let (countries, year) = extract_production(&doc);

    MovieDetails {
        genre: genre.resolve(GENRE_NOT_FOUND),
        description: description.resolve(DESCRIPTION_NOT_FOUND),
        countries: countries.resolve(UNKNOWN),
        year: year.resolve(UNKNOWN),
    }
}

/// Genre text from the first `h4` mentioning "gatunek", plus that heading's parent, which
/// scopes the description.
pub fn extract_genre(doc: &Html) -> (Field, Option<ElementRef<'_>>) {
    let Some(heading) = find_heading(doc, &GENRE_HEADING) else {
        return (Field::Missing, None);
    };
    let parent = heading.parent().and_then(ElementRef::wrap);
    (Field::from_text(&clean_genre_text(&text_of(heading))), parent)
}

/// Paragraphs under the genre heading's parent, or under the "opis" heading's parent when
/// there is no genre heading.
pub fn extract_description<'a>(doc: &'a Html, genre_parent: Option<ElementRef<'a>>) -> Field {
    let container = match genre_parent {
        Some(parent) => Some(parent),
        None => find_heading(doc, &DESCRIPTION_HEADING)
            .and_then(|heading| heading.parent())
            .and_then(ElementRef::wrap),
    };
    let Some(container) = container else {
        return Field::Missing;
    };

    let paragraph_selector = Selector::parse("p").unwrap();
    let paragraphs: Vec<String> = container
        .select(&paragraph_selector)
        .map(text_of)
        .filter(|p| !p.is_empty())
        .collect();

    Field::from_text(&paragraphs.join("\n"))
}

/// `(countries, year)` from the first `div.f4.crrow` block mentioning "produkcja:".
pub fn extract_production(doc: &Html) -> (Field, Field) {
    let block_selector = Selector::parse("div.f4.crrow").unwrap();

    doc.select(&block_selector)
        .map(text_of)
        .find(|text| PRODUCTION_LABEL.is_match(text))
        .map(|text| split_production_text(&text))
        .unwrap_or((Field::Missing, Field::Missing))
}

/// Drops the "gatunek:" label and everything from an age-rating or running-time marker on.
pub fn clean_genre_text(text: &str) -> String {
    let mut genre = text.trim();

    if let Some(label) = GENRE_LABEL.find(genre) {
        genre = genre[label.end()..].trim();
    }
    if let Some(marker) = GENRE_END.find(genre) {
        genre = genre[..marker.start()].trim();
    }

    genre.to_string()
}

/// Splits "Produkcja: USA, UK 2021" into countries and a trailing four-digit year. Without a
/// year, the whole remainder is the countries string.
pub fn split_production_text(text: &str) -> (Field, Field) {
    let mut rest = text.trim();
    if let Some(label) = PRODUCTION_LABEL.find(rest) {
        rest = rest[label.end()..].trim();
    }

    match TRAILING_YEAR.captures(rest).and_then(|caps| caps.get(1)) {
        Some(year) => {
            let countries = &rest[..year.start()];
            (Field::from_text(countries), Field::Found(year.as_str().to_string()))
        },
        None => (Field::from_text(rest), Field::Missing),
    }
}

fn find_heading<'a>(doc: &'a Html, token: &Regex) -> Option<ElementRef<'a>> {
    let heading_selector = Selector::parse("h4").unwrap();
    doc.select(&heading_selector).find(|h| token.is_match(&text_of(*h)))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAGE: &str = r#"
        <html><body>
            <div class="film">
                <h4>Gatunek: dramat, komedia kategoria wiekowa: 15+ czas trwania: 120 min</h4>
                <p>Pierwszy akapit.</p>
                <p>   </p>
                <div><p>Drugi akapit.</p></div>
            </div>
            <div class="f4 crrow">reżyseria: Jan Kowalski</div>
            <div class="f4 crrow">Produkcja: USA, UK 2021</div>
        </body></html>
    "#;

    #[test]
    fn parses_full_detail_page() {
        let details = parse_detail(FULL_PAGE);
        assert_eq!(
            details,
            MovieDetails {
                genre: "dramat, komedia".to_string(),
                description: "Pierwszy akapit.\nDrugi akapit.".to_string(),
                countries: "USA, UK".to_string(),
                year: "2021".to_string(),
            }
        );
    }

    #[test]
    fn missing_genre_falls_back_to_opis_heading() {
        let html = r#"
            <div><h4>Reżyseria</h4><p>Nie to.</p></div>
            <section><h4>Opis filmu</h4><p>Historia o czymś.</p></section>
        "#;
        let details = parse_detail(html);
        assert_eq!(details.genre, GENRE_NOT_FOUND);
        assert_eq!(details.description, "Historia o czymś.");
    }

    #[test]
    fn empty_page_degrades_to_defaults() {
        let details = parse_detail("<html><body></body></html>");
        assert_eq!(
            details,
            MovieDetails {
                genre: GENRE_NOT_FOUND.to_string(),
                description: DESCRIPTION_NOT_FOUND.to_string(),
                countries: UNKNOWN.to_string(),
                year: UNKNOWN.to_string(),
            }
        );
    }

    #[test]
    fn genre_parent_without_paragraphs_has_no_description() {
        let html = r#"<div><h4>gatunek: horror</h4></div><div><h4>opis</h4><p>x</p></div>"#;
        let details = parse_detail(html);
        assert_eq!(details.genre, "horror");
        assert_eq!(details.description, DESCRIPTION_NOT_FOUND);
    }

    #[test]
    fn production_splits_countries_and_year() {
        assert_eq!(
            split_production_text("Produkcja: USA, UK 2021"),
            (Field::Found("USA, UK".to_string()), Field::Found("2021".to_string()))
        );
        assert_eq!(
            split_production_text("produkcja: Polska"),
            (Field::Found("Polska".to_string()), Field::Missing)
        );
        assert_eq!(
            split_production_text("Produkcja: 1999"),
            (Field::Missing, Field::Found("1999".to_string()))
        );
    }

    #[test]
    fn genre_text_without_markers_is_kept() {
        assert_eq!(clean_genre_text("gatunek: animacja"), "animacja");
        assert_eq!(clean_genre_text("Gatunek:thriller czas trwania: 95 min"), "thriller");
        assert_eq!(clean_genre_text("sci-fi"), "sci-fi");
    }

    #[test]
    fn labels_match_any_case_next_to_polish_text() {
        let (countries, year) = split_production_text("Reżyseria; PRODUKCJA: Włochy 2019");
        assert_eq!(countries, Field::Found("Włochy".to_string()));
        assert_eq!(year, Field::Found("2019".to_string()));

        assert_eq!(clean_genre_text("GATUNEK: dramat Kategoria Wiekowa: 15+"), "dramat");
        assert!(!DESCRIPTION_HEADING.is_match("żółw"));
    }

    #[test]
    fn earliest_genre_end_marker_wins() {
        assert_eq!(
            clean_genre_text("gatunek: horror czas trwania: 90 min kategoria wiekowa: 18+"),
            "horror"
        );
    }

    #[test]
    fn only_trailing_year_is_removed_from_countries() {
        let (countries, year) = split_production_text("Produkcja: USA 2021, Kanada 2021");
        assert_eq!(countries, Field::Found("USA 2021, Kanada".to_string()));
        assert_eq!(year, Field::Found("2021".to_string()));
    }
}
