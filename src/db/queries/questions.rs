use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

pub const QUESTIONS_PER_PAGE: i64 = 10;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

/// A question that passed input validation and has no id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

#[derive(Debug)]
pub struct QuestionsPage {
    pub questions: Vec<Question>,
    /// Matches across all pages.
    pub total: i64,
}

fn page_offset(page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(QUESTIONS_PER_PAGE)
}

/// Text stored in `question_folded` and compared against search terms.
fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

// LIKE treats % and _ as wildcards; search terms are matched literally
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in fold_case(term).chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn get_questions_page(pool: &SqlitePool, page: i64) -> sqlx::Result<QuestionsPage> {
    search_questions(pool, "", page).await
}

/// Case-insensitive substring search over question text. An empty term matches everything.
pub async fn search_questions(
    pool: &SqlitePool,
    term: &str,
    page: i64,
) -> sqlx::Result<QuestionsPage> {
    let pattern = like_pattern(term);

    let total: i64 = sqlx::query_scalar(
        r#"
SELECT COUNT(*) FROM questions WHERE question_folded LIKE ?1 ESCAPE '\'
        "#,
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty
FROM questions
WHERE question_folded LIKE ?1 ESCAPE '\'
ORDER BY id
LIMIT ?2 OFFSET ?3
        "#,
    )
    .bind(&pattern)
    .bind(QUESTIONS_PER_PAGE)
    .bind(page_offset(page))
    .fetch_all(pool)
    .await?;

    Ok(QuestionsPage { questions, total })
}

pub async fn get_all_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty FROM questions ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

#[cfg(test)]
pub(crate) async fn get_question(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty
FROM questions
WHERE questions.category = ?1
ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn create_question(pool: &SqlitePool, question: &NewQuestion) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
INSERT INTO questions (question, question_folded, answer, category, difficulty)
VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&question.question)
    .bind(fold_case(&question.question))
    .bind(&question.answer)
    .bind(question.category)
    .bind(question.difficulty)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Returns false when no question had this id.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let deleted = sqlx::query(
        r#"
DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(deleted > 0)
}

/// Picks one question uniformly at random, optionally restricted to a category,
/// skipping every id in `exclude`.
pub async fn get_random_question(
    pool: &SqlitePool,
    category: Option<i64>,
    exclude: &[i64],
) -> sqlx::Result<Option<Question>> {
    // one json parameter whatever the length, sqlite caps the number of bound variables
    let exclude = serde_json::to_string(exclude).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query_as::<_, Question>(
        r#"
SELECT id, question, answer, category, difficulty
FROM questions
WHERE (?1 IS NULL OR category = ?1)
  AND id NOT IN (SELECT value FROM json_each(?2))
ORDER BY RANDOM()
LIMIT 1
        "#,
    )
    .bind(category)
    .bind(exclude)
    .fetch_optional(pool)
    .await
}

/// Inserts questions keeping their ids, all or nothing.
pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    for question in questions {
        sqlx::query(
            r#"
INSERT INTO questions (id, question, question_folded, answer, category, difficulty)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(fold_case(&question.question))
        .bind(&question.answer)
        .bind(question.category)
        .bind(question.difficulty)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}
