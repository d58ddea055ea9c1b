use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set, sea_query::OnConflict,
};
use tracing::{error, info};

use crate::{
    entities::{movie, screening},
    error::AppResult,
    models::{MovieDetails, ScreeningDay},
};

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upserts on `(title, year)`. `None` means the write failed and the caller must not
    /// attach screenings.
    pub async fn save_movie(&self, title: &str, details: &MovieDetails) -> Option<i32> {
        match self.upsert_movie(title, details).await {
            Ok(id) => Some(id),
            Err(err) => {
                error!(title = %title, year = %details.year, error = %err, "failed to save movie");
                None
            },
        }
    }

    async fn upsert_movie(&self, title: &str, details: &MovieDetails) -> AppResult<i32> {
        let now = now_sec();

        let existing = movie::Entity::find()
            .filter(movie::Column::Title.eq(title))
            .filter(movie::Column::Year.eq(details.year.as_str()))
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            let id = existing.id;
            let mut active: movie::ActiveModel = existing.into();
            active.genre = Set(details.genre.clone());
            active.description = Set(details.description.clone());
            active.countries = Set(details.countries.clone());
            active.updated_at = Set(now);
            active.update(&self.db).await?;
            info!(title = %title, year = %details.year, movie_id = id, "updated existing movie");
            return Ok(id);
        }

        let model = movie::ActiveModel {
            id: Default::default(),
            title: Set(title.to_string()),
            genre: Set(details.genre.clone()),
            description: Set(details.description.clone()),
            year: Set(details.year.clone()),
            countries: Set(details.countries.clone()),
            first_added_at: Set(now),
            updated_at: Set(now),
        };
        let id = movie::Entity::insert(model).exec(&self.db).await?.last_insert_id;
        info!(title = %title, year = %details.year, movie_id = id, "inserted new movie");
        Ok(id)
    }

    /// Insert-or-ignore for every `(movie, date, time)`; returns how many rows were new.
    pub async fn save_screenings(&self, movie_id: Option<i32>, screenings: &[ScreeningDay]) -> u64 {
        let Some(movie_id) = movie_id else {
            error!("refusing to save screenings without a movie id");
            return 0;
        };

        match self.insert_screenings(movie_id, screenings).await {
            Ok(inserted) => {
                info!(movie_id = movie_id, inserted = inserted, "screenings saved");
                inserted
            },
            Err(err) => {
                error!(movie_id = movie_id, error = %err, "failed to save screenings");
                0
            },
        }
    }

    async fn insert_screenings(&self, movie_id: i32, screenings: &[ScreeningDay]) -> AppResult<u64> {
        let mut inserted = 0;

        for day in screenings {
            for time in &day.times {
                let model = screening::ActiveModel {
                    id: Default::default(),
                    movie_id: Set(movie_id),
                    date: Set(day.date.clone()),
                    time: Set(time.clone()),
                };

                inserted += screening::Entity::insert(model)
                    .on_conflict(
                        OnConflict::columns([
                            screening::Column::MovieId,
                            screening::Column::Date,
                            screening::Column::Time,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(&self.db)
                    .await?;
            }
        }

        Ok(inserted)
    }

    /// Every stored `(title, year)`. A failed read is logged and yields an empty set.
    pub async fn fetch_known_titles_and_years(&self) -> HashSet<(String, String)> {
        let rows = movie::Entity::find()
            .select_only()
            .column(movie::Column::Title)
            .column(movie::Column::Year)
            .into_tuple::<(String, String)>()
            .all(&self.db)
            .await;

        match rows {
            Ok(rows) => rows.into_iter().collect(),
            Err(err) => {
                error!(error = %err, "failed to fetch known movies");
                HashSet::new()
            },
        }
    }

    pub async fn count_movies(&self) -> AppResult<u64> {
        Ok(movie::Entity::find().count(&self.db).await?)
    }

    pub async fn count_screenings(&self) -> AppResult<u64> {
        Ok(screening::Entity::find().count(&self.db).await?)
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
