use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string(Movies::Title))
                    .col(string(Movies::Genre))
                    .col(text(Movies::Description))
                    .col(string(Movies::Year))
                    .col(string(Movies::Countries))
                    .col(big_integer(Movies::FirstAddedAt))
                    .col(big_integer(Movies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_title_year")
                    .table(Movies::Table)
                    .col(Movies::Title)
                    .col(Movies::Year)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Screenings::Table)
                    .if_not_exists()
                    .col(pk_auto(Screenings::Id))
                    .col(integer(Screenings::MovieId))
                    .col(string(Screenings::Date))
                    .col(string(Screenings::Time))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_screenings_movie")
                            .from(Screenings::Table, Screenings::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_screenings_unique")
                    .table(Screenings::Table)
                    .col(Screenings::MovieId)
                    .col(Screenings::Date)
                    .col(Screenings::Time)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Screenings::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Genre,
    Description,
    Year,
    Countries,
    FirstAddedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Screenings {
    Table,
    Id,
    MovieId,
    Date,
    Time,
}
