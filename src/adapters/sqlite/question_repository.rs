//! SQLite question bank.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::format_datetime;
use crate::domain::errors::DomainResult;
use crate::domain::models::Question;
use crate::domain::ports::QuestionBank;

#[derive(Clone)]
pub struct SqliteQuestionRepository {
    pool: SqlitePool,
}

impl SqliteQuestionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a question, replacing any existing one with the same id.
    pub async fn insert_question(&self, question: &Question) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO questions (id, topic_id, difficulty, correct_answer, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   topic_id = excluded.topic_id,
                   difficulty = excluded.difficulty,
                   correct_answer = excluded.correct_answer"#,
        )
        .bind(&question.id)
        .bind(&question.topic_id)
        .bind(question.difficulty)
        .bind(&question.correct_answer)
        .bind(format_datetime(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl QuestionBank for SqliteQuestionRepository {
    async fn get_question(&self, question_id: &str) -> DomainResult<Option<Question>> {
        let row: Option<(String, String, f64, String)> = sqlx::query_as(
            "SELECT id, topic_id, difficulty, correct_answer FROM questions WHERE id = ?",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, topic_id, difficulty, correct_answer)| Question {
            id,
            topic_id,
            difficulty,
            correct_answer,
        }))
    }

    async fn available_difficulties(&self, topic_id: &str) -> DomainResult<Vec<f64>> {
        let rows: Vec<(f64,)> = sqlx::query_as(
            "SELECT DISTINCT difficulty FROM questions WHERE topic_id = ? ORDER BY difficulty",
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(d,)| d).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    #[tokio::test]
    async fn test_question_lookup_and_levels() {
        let repo = SqliteQuestionRepository::new(create_migrated_test_pool().await.unwrap());
        for (id, difficulty) in [("q1", 7.0), ("q2", 3.0), ("q3", 7.0), ("q4", 5.0)] {
            repo.insert_question(&Question::new(id, "algebra", difficulty, "42")).await.unwrap();
        }
        repo.insert_question(&Question::new("g1", "geometry", 9.0, "90")).await.unwrap();

        let q = repo.get_question("q2").await.unwrap().unwrap();
        assert_eq!(q.difficulty, 3.0);
        assert!(q.is_correct(" 42 "));
        assert!(repo.get_question("missing").await.unwrap().is_none());

        assert_eq!(repo.available_difficulties("algebra").await.unwrap(), vec![3.0, 5.0, 7.0]);
        assert!(repo.available_difficulties("history").await.unwrap().is_empty());
    }
}
