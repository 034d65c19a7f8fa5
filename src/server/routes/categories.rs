use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories, questions},
        Category, Question,
    },
    server::app::AppState,
};

use super::{ApiError, ApiResponse};

#[derive(Serialize)]
struct CategoriesList {
    success: bool,
    categories: Vec<String>,
}

#[derive(Serialize)]
struct CategoryQuestions {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: Category,
}

async fn get_categories(State(pool): State<SqlitePool>) -> ApiResponse<Json<CategoriesList>> {
    let categories = categories::get_category_types(&pool).await?;
    Ok(Json(CategoriesList {
        success: true,
        categories,
    }))
}

async fn questions_by_category(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<Json<CategoryQuestions>> {
    let Path(id) = id?;
    let category = categories::get_category(&pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let questions = questions::get_questions_for_category(&pool, id).await?;

    Ok(Json(CategoryQuestions {
        success: true,
        total_questions: questions.len(),
        questions,
        current_category: category,
    }))
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/{id}/questions", get(questions_by_category))
        .with_state(state)
}
