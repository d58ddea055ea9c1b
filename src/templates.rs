use jiff::civil::Date;
use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::models::NotifiedMovie;

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; color: #333333; }
    h1 { color: #2a5d84; }
    .movie { border-bottom: 2px solid #cccccc; padding: 10px 0; margin: 20px 0; }
    .movie-title { font-size: 24px; color: #2a5d84; }
    .movie-title a { text-decoration: none; color: #007bff; font-weight: bold; }
    .movie-details { margin: 10px 0; font-size: 14px; }
    .screening-times { background-color: #f0f0f0; padding: 10px; border-radius: 5px; }
    .screening-time { margin: 5px 0; }
"#;

pub fn email_subject(first: Date, last: Date) -> String {
    format!("Repertuar nowych filmów na {} - {}", format_date(first), format_date(last))
}

pub fn email_body(first: Date, last: Date, movies: &[NotifiedMovie]) -> String {
    html! {
        (DOCTYPE)
        html lang="pl" {
            head {
                meta charset="utf-8";
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { "Nowe filmy na: " (format_date(first)) " - " (format_date(last)) }
                @for movie in movies {
                    (movie_block(movie))
                }
            }
        }
    }
    .into_string()
}

fn movie_block(movie: &NotifiedMovie) -> Markup {
    let days_with_times: Vec<_> =
        movie.screening_times.iter().filter(|day| !day.times.is_empty()).collect();

    html! {
        div class="movie" {
            div class="movie-title" {
                a href=(movie.link) target="_blank" { (movie.title) }
            }
            div class="movie-details" {
                strong { "Gatunek:" } " " (movie.genre) br;
                strong { "Opis:" } " "
                @for (i, line) in movie.description.lines().enumerate() {
                    @if i > 0 { br; }
                    (line)
                }
                br;
                strong { "Rok Produkcji:" } " " (movie.production_year)
            }
            div class="screening-times" {
                strong { "Godziny Seansów:" }
                div {
                    @if movie.screening_times.is_empty() {
                        div class="screening-time" { "No screening times available" }
                    } @else if days_with_times.is_empty() {
                        div class="screening-time" { "No upcoming screenings available" }
                    } @else {
                        @for day in &days_with_times {
                            div class="screening-time" { (day.date) ": " (day.times.join(", ")) }
                        }
                    }
                }
            }
        }
    }
}

fn format_date(date: Date) -> String {
    date.strftime("%Y-%m-%d").to_string()
}
