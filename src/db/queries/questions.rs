use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// A question as it is stored and as it is rendered in every response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub difficulty: i64,
    pub category: i64,
}

const SELECT_QUESTIONS: &str = "SELECT id, question, answer, category, difficulty FROM questions";

pub async fn count_questions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM questions
        "#,
    )
    .fetch_one(pool)
    .await
}

pub async fn get_questions_page(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        ORDER BY id LIMIT ?1 OFFSET ?2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn get_question(pool: &SqlitePool, id: i64) -> sqlx::Result<Question> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn create_question(pool: &SqlitePool, question: &NewQuestion) -> anyhow::Result<i64> {
    let mut conn = pool.acquire().await?;

    let id = sqlx::query(
        r#"
INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.category)
    .bind(question.difficulty)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Returns `false` when no row had that id, e.g. a concurrent delete won.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> anyhow::Result<bool> {
    let mut conn = pool.acquire().await?;

    let affected = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

/// Case-insensitive substring match on the question text.
/// SQLite's `lower` only folds ASCII, so the match runs on Unicode-lowercased text here.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> sqlx::Result<Vec<Question>> {
    let needle = term.to_lowercase();
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(questions
        .into_iter()
        .filter(|q| q.question.to_lowercase().contains(&needle))
        .collect())
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        WHERE questions.category = ?1
        ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await
}

/// Questions the quiz may still ask: optionally restricted to one category,
/// never one of `excluded`.
pub async fn get_quiz_candidates(
    pool: &SqlitePool,
    category: Option<i64>,
    excluded: &[i64],
) -> sqlx::Result<Vec<Question>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_QUESTIONS);
    builder.push(" WHERE 1 = 1");
    if let Some(category) = category {
        builder.push(" AND category = ").push_bind(category);
    }
    if !excluded.is_empty() {
        builder.push(" AND id NOT IN (");
        let mut ids = builder.separated(", ");
        for id in excluded {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    builder.push(" ORDER BY id");

    builder.build_query_as::<Question>().fetch_all(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory;
    use crate::db::queries::categories::create_category;

    fn new_question(text: &str, category: i64) -> NewQuestion {
        NewQuestion {
            question: text.to_owned(),
            answer: "answer".to_owned(),
            difficulty: 1,
            category,
        }
    }

    async fn seed(pool: &SqlitePool) -> (i64, i64, Vec<i64>) {
        let music = create_category(pool, "Music").await.unwrap();
        let history = create_category(pool, "History").await.unwrap();
        let mut ids = vec![];
        for (text, category) in [
            ("Who won the 2021 grammy awards?", music),
            ("Which band recorded Abbey Road?", music),
            ("When did the Berlin wall fall?", history),
        ] {
            ids.push(create_question(pool, &new_question(text, category)).await.unwrap());
        }
        (music, history, ids)
    }

    #[tokio::test]
    async fn create_and_fetch_question() {
        let pool = in_memory().await.unwrap();
        let id = create_question(&pool, &new_question("Capital of Peru?", 3))
            .await
            .unwrap();
        let question = get_question(&pool, id).await.unwrap();
        assert_eq!(question.question, "Capital of Peru?");
        assert_eq!(question.category, 3);
        assert_eq!(count_questions(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let pool = in_memory().await.unwrap();
        let (_, _, ids) = seed(&pool).await;
        assert!(delete_question(&pool, ids[0]).await.unwrap());
        assert!(!delete_question(&pool, ids[0]).await.unwrap());
        assert_eq!(count_questions(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn page_beyond_the_end_is_empty() {
        let pool = in_memory().await.unwrap();
        seed(&pool).await;
        assert_eq!(get_questions_page(&pool, 2, 0).await.unwrap().len(), 2);
        assert_eq!(get_questions_page(&pool, 2, 2).await.unwrap().len(), 1);
        assert!(get_questions_page(&pool, 2, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_ignores_case_and_treats_wildcards_literally() {
        let pool = in_memory().await.unwrap();
        seed(&pool).await;
        let found = search_questions(&pool, "GRAMMY").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].question, "Who won the 2021 grammy awards?");
        assert!(search_questions(&pool, "%").await.unwrap().is_empty());
        assert!(search_questions(&pool, "quantum").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let pool = in_memory().await.unwrap();
        let id = create_question(&pool, &new_question("Which country is Pelé from?", 1))
            .await
            .unwrap();
        let found = search_questions(&pool, "PELÉ").await.unwrap();
        assert_eq!(found.iter().map(|q| q.id).collect::<Vec<_>>(), vec![id]);
        assert_eq!(search_questions(&pool, "ÉCOLE").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn questions_for_category_only_match_that_category() {
        let pool = in_memory().await.unwrap();
        let (music, history, _) = seed(&pool).await;
        assert_eq!(get_questions_for_category(&pool, music).await.unwrap().len(), 2);
        assert_eq!(get_questions_for_category(&pool, history).await.unwrap().len(), 1);
        assert!(get_questions_for_category(&pool, 99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quiz_candidates_respect_category_and_exclusions() {
        let pool = in_memory().await.unwrap();
        let (music, _, ids) = seed(&pool).await;

        let all = get_quiz_candidates(&pool, None, &[]).await.unwrap();
        assert_eq!(all.len(), 3);

        let music_left = get_quiz_candidates(&pool, Some(music), &[ids[0]]).await.unwrap();
        assert_eq!(music_left.iter().map(|q| q.id).collect::<Vec<_>>(), vec![ids[1]]);

        let none_left = get_quiz_candidates(&pool, None, &ids).await.unwrap();
        assert!(none_left.is_empty());
    }
}
