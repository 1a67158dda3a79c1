//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use polls_core::domain::{Choice, Question};
use polls_core::error::RepoError;
use polls_core::ports::{ChoiceRepository, PubDateOrder, PublishedQuestions, QuestionRepository};

use super::entity::choice::{self, Entity as ChoiceEntity};
use super::entity::question::{self, Entity as QuestionEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL question repository. Choices are removed by the
/// `ON DELETE CASCADE` foreign key.
pub type PostgresQuestionRepository = PostgresBaseRepository<QuestionEntity>;

/// PostgreSQL choice repository.
pub type PostgresChoiceRepository = PostgresBaseRepository<ChoiceEntity>;

#[async_trait]
impl QuestionRepository for PostgresQuestionRepository {
    async fn find_published(
        &self,
        query: PublishedQuestions,
    ) -> Result<Vec<Question>, RepoError> {
        let mut select =
            QuestionEntity::find().filter(question::Column::PubDate.lte(query.cutoff));

        select = match query.order {
            PubDateOrder::NewestFirst => select.order_by_desc(question::Column::PubDate),
            PubDateOrder::OldestFirst => select.order_by_asc(question::Column::PubDate),
        };

        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        let result = select.all(&self.db).await.map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_text_and_pub_date(
        &self,
        question_text: &str,
        pub_date: DateTime<Utc>,
    ) -> Result<Option<Question>, RepoError> {
        let result = QuestionEntity::find()
            .filter(question::Column::QuestionText.eq(question_text))
            .filter(question::Column::PubDate.eq(pub_date))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl ChoiceRepository for PostgresChoiceRepository {
    async fn find_by_question(&self, question_id: Uuid) -> Result<Vec<Choice>, RepoError> {
        // v7 ids sort in creation order
        let result = ChoiceEntity::find()
            .filter(choice::Column::QuestionId.eq(question_id))
            .order_by_asc(choice::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create_many(&self, choices: Vec<Choice>) -> Result<Vec<Choice>, RepoError> {
        if choices.is_empty() {
            return Ok(choices);
        }

        let txn = self.db.begin().await.map_err(map_db_err)?;

        let mut created = Vec::with_capacity(choices.len());
        for choice in choices {
            let model = choice::ActiveModel::from(choice)
                .insert(&txn)
                .await
                .map_err(map_db_err)?;
            created.push(model.into());
        }

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(count = created.len(), "Choices created");

        Ok(created)
    }

    async fn increment_votes(
        &self,
        question_id: Uuid,
        choice_id: Uuid,
    ) -> Result<bool, RepoError> {
        let result = ChoiceEntity::update_many()
            .col_expr(
                choice::Column::Votes,
                Expr::col(choice::Column::Votes).add(1),
            )
            .filter(choice::Column::Id.eq(choice_id))
            .filter(choice::Column::QuestionId.eq(question_id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        tracing::debug!(
            %question_id,
            %choice_id,
            rows = result.rows_affected,
            "Vote increment applied"
        );

        Ok(result.rows_affected > 0)
    }
}
