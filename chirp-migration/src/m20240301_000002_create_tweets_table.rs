use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tweets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tweets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tweets::Title).string().not_null())
                    .col(ColumnDef::new(Tweets::Body).text().not_null())
                    .col(ColumnDef::new(Tweets::File).string().null())
                    .col(ColumnDef::new(Tweets::AuthorId).integer().not_null())
                    .col(
                        ColumnDef::new(Tweets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tweets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tweets-author_id")
                            .from(Tweets::Table, Tweets::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tweets-author_id")
                    .table(Tweets::Table)
                    .col(Tweets::AuthorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tweets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Tweets {
    Table,
    Id,
    Title,
    Body,
    File,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}
