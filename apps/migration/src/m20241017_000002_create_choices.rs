use sea_orm_migration::prelude::*;

use super::m20241017_000001_create_questions::Questions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Choices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Choices::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Choices::QuestionId).uuid().not_null())
                    .col(ColumnDef::new(Choices::ChoiceText).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Choices::Votes)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Choices::Votes).gte(0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_choices_question")
                            .from(Choices::Table, Choices::QuestionId)
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_choices_question_id")
                    .table(Choices::Table)
                    .col(Choices::QuestionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Choices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Choices {
    Table,
    Id,
    QuestionId,
    ChoiceText,
    Votes,
}
