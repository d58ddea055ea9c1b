use std::path::{Path, PathBuf};

use jiff::civil::Date;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    models::{EnrichedMovie, NotifiedMovie},
    templates,
};

/// A rendered message ready for delivery.
#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    pub subject: String,
    pub recipients: Vec<String>,
    pub html: String,
    pub movies: Vec<NotifiedMovie>,
    #[serde(skip)]
    pub first_day: Date,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> AppResult<()>;
}

pub fn build_payload(movies: &[EnrichedMovie]) -> Vec<NotifiedMovie> {
    movies
        .iter()
        .map(|movie| NotifiedMovie {
            title: movie.title.clone(),
            link: movie.link.clone(),
            genre: movie.details.genre.clone(),
            description: movie.details.description.clone(),
            production_year: movie.details.year.clone(),
            screening_times: movie.screenings.clone(),
        })
        .collect()
}

pub fn render(
    movies: Vec<NotifiedMovie>,
    recipients: Vec<String>,
    first_day: Date,
    last_day: Date,
) -> Notification {
    Notification {
        subject: templates::email_subject(first_day, last_day),
        html: templates::email_body(first_day, last_day, &movies),
        recipients,
        movies,
        first_day,
    }
}

/// Renders and delivers the new movies. Returns whether a delivery succeeded; an empty list is
/// never delivered and a failed delivery is only logged.
pub async fn dispatch(
    notifier: &dyn Notifier,
    movies: &[EnrichedMovie],
    recipients: Vec<String>,
    first_day: Date,
    last_day: Date,
) -> bool {
    if movies.is_empty() {
        info!("no new movies, skipping notification");
        return false;
    }

    let notification = render(build_payload(movies), recipients, first_day, last_day);
    match notifier.deliver(&notification).await {
        Ok(()) => {
            info!(movies = notification.movies.len(), "notification delivered");
            true
        },
        Err(err) => {
            warn!(error = %err, "failed to deliver notification");
            false
        },
    }
}

/// One address per line; a missing file means nobody to address.
pub fn load_recipients(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read recipients file");
            Vec::new()
        },
    }
}

/// POSTs the notification as JSON to an external mailer.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, notification: &Notification) -> AppResult<()> {
        let resp = self.client.post(&self.url).json(notification).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Delivery(format!("webhook responded with {status}")));
        }
        Ok(())
    }
}

/// Writes the rendered email to a directory for a separate sender to pick up.
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, notification: &Notification) -> PathBuf {
        self.dir
            .join(format!("new-movies-{}.html", notification.first_day.strftime("%Y-%m-%d")))
    }
}

#[async_trait::async_trait]
impl Notifier for OutboxNotifier {
    async fn deliver(&self, notification: &Notification) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(notification);
        tokio::fs::write(&path, &notification.html).await?;
        info!(path = %path.display(), recipients = notification.recipients.len(), "wrote notification to outbox");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::models::{MovieDetails, ScreeningDay};

    fn enriched(title: &str, screenings: Vec<ScreeningDay>) -> EnrichedMovie {
        EnrichedMovie {
            title: title.to_string(),
            link: format!("https://www.kinonh.pl/{title}"),
            details: MovieDetails {
                genre: "dramat".to_string(),
                description: "Opis".to_string(),
                countries: "Polska".to_string(),
                year: "2023".to_string(),
            },
            screenings,
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl Notifier for Failing {
        async fn deliver(&self, _: &Notification) -> AppResult<()> {
            Err(AppError::Delivery("relay down".to_string()))
        }
    }

    #[test]
    fn payload_keeps_date_order_and_empty_movies() {
        let movies = vec![
            enriched("B", vec![
                ScreeningDay { date: "03-02-2025".into(), times: vec!["18:00".into()] },
                ScreeningDay { date: "01-02-2025".into(), times: vec!["12:00".into()] },
            ]),
            enriched("A", vec![]),
        ];

        let payload = build_payload(&movies);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].production_year, "2023");
        assert_eq!(payload[0].screening_times[0].date, "03-02-2025");
        assert_eq!(payload[0].screening_times[1].date, "01-02-2025");
        assert!(payload[1].screening_times.is_empty());
    }

    #[test]
    fn payload_serializes_with_screening_times() {
        let payload = build_payload(&[enriched("A", vec![ScreeningDay {
            date: "01-02-2025".into(),
            times: vec!["18:00".into()],
        }])]);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json[0]["screening_times"][0]["times"][0], "18:00");
        assert_eq!(json[0]["production_year"], "2023");
    }

    #[tokio::test]
    async fn empty_list_is_not_delivered() {
        let delivered = dispatch(&Failing, &[], vec![], date(2025, 2, 1), date(2025, 2, 10)).await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let delivered =
            dispatch(&Failing, &[enriched("A", vec![])], vec![], date(2025, 2, 1), date(2025, 2, 10))
                .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn outbox_writes_rendered_html() {
        let dir = std::env::temp_dir().join(format!("kinowatch-outbox-{}", std::process::id()));
        let notifier = OutboxNotifier::new(dir.clone());

        let delivered = dispatch(
            &notifier,
            &[enriched("A", vec![])],
            vec!["kino@example.com".into()],
            date(2025, 2, 1),
            date(2025, 2, 10),
        )
        .await;
        assert!(delivered);

        let written = std::fs::read_to_string(dir.join("new-movies-2025-02-01.html")).unwrap();
        assert!(written.contains("Nowe filmy na: 2025-02-01 - 2025-02-10"));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_recipients_file_means_no_recipients() {
        assert!(load_recipients(Path::new("/definitely/not/here/emails.txt")).is_empty());
    }
}
