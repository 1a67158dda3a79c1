use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Questions::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Questions::QuestionText)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Questions::PubDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Backs get-or-create on (text, publish date).
        manager
            .create_index(
                Index::create()
                    .name("idx_questions_text_pub_date")
                    .table(Questions::Table)
                    .col(Questions::QuestionText)
                    .col(Questions::PubDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_questions_pub_date")
                    .table(Questions::Table)
                    .col(Questions::PubDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Questions {
    Table,
    Id,
    QuestionText,
    PubDate,
}
