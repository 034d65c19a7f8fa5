use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions, Question},
    server::{app::AppState, deserializers::deserialize_quiz_category},
    telemetry::QUIZ_QUESTIONS_CNTR,
};

use super::ApiResponse;

#[derive(Deserialize)]
struct QuizRequest {
    #[serde(default)]
    previous_questions: Option<Vec<i64>>,
    /// 0 draws from every category
    #[serde(default, deserialize_with = "deserialize_quiz_category")]
    quiz_category: i64,
}

#[derive(Serialize)]
struct QuizQuestion {
    success: bool,
    question: Option<Question>,
}

async fn next_quiz_question(
    State(pool): State<SqlitePool>,
    request: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResponse<Json<QuizQuestion>> {
    let Json(request) = request?;
    let previous = request.previous_questions.unwrap_or_default();
    let category = Some(request.quiz_category).filter(|id| *id != 0);

    let question = questions::get_random_question(&pool, category, &previous).await?;
    match &question {
        Some(q) => {
            let label = category.map_or_else(|| "all".to_owned(), |id| id.to_string());
            QUIZ_QUESTIONS_CNTR.with_label_values(&[label.as_str()]).inc();
            tracing::debug!("Drew question {} after {} previous", q.id, previous.len());
        }
        None => tracing::debug!("No questions left after {} previous", previous.len()),
    }

    Ok(Json(QuizQuestion {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_quiz_question))
        .with_state(state)
}
