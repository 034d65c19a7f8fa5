use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories, questions},
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        deserializers::{deserialize_page, first_page},
    },
    telemetry::{QUESTIONS_CREATED_CNTR, QUESTIONS_DELETED_CNTR},
};

use super::{done, ApiError, ApiResponse, Done};

const DIFFICULTIES: std::ops::RangeInclusive<i64> = 1..=4;

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "first_page", deserialize_with = "deserialize_page")]
    page: i64,
}

#[derive(Deserialize)]
struct QuestionForm {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    category: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    difficulty: Option<i64>,
}

impl QuestionForm {
    fn validate(self) -> Result<NewQuestion, ApiError> {
        let text = |field: Option<String>, name: &str| {
            field
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::BadRequest(format!("Field {name} is required")))
        };
        let question = text(self.question, "question")?;
        let answer = text(self.answer, "answer")?;
        let category = self
            .category
            .filter(|c| *c != 0)
            .ok_or_else(|| ApiError::BadRequest("Field category is required".to_owned()))?;
        let difficulty = self
            .difficulty
            .filter(|d| DIFFICULTIES.contains(d))
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Field difficulty should be between {} and {}",
                    DIFFICULTIES.start(),
                    DIFFICULTIES.end()
                ))
            })?;
        Ok(NewQuestion {
            question,
            answer,
            category,
            difficulty,
        })
    }
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default, rename = "searchTerm")]
    search_term: Option<String>,
}

#[derive(Serialize)]
struct QuestionsListing {
    success: bool,
    questions: Vec<Question>,
    total_questions: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,
    current_category: &'static str,
}

async fn get_questions(
    State(pool): State<SqlitePool>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResponse<Json<QuestionsListing>> {
    let Query(PageQuery { page }) = query?;
    let found = questions::get_questions_page(&pool, page).await?;
    let categories = categories::get_category_types(&pool).await?;
    Ok(Json(QuestionsListing {
        success: true,
        questions: found.questions,
        total_questions: found.total,
        categories: Some(categories),
        current_category: "",
    }))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    form: Result<Json<QuestionForm>, JsonRejection>,
) -> ApiResponse<Json<Done>> {
    let Json(form) = form?;
    let new_question = form.validate()?;
    let id = questions::create_question(&pool, &new_question).await?;
    QUESTIONS_CREATED_CNTR.inc();
    tracing::info!("Created question {id} in category {}", new_question.category);
    Ok(done())
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<Json<Done>> {
    let Path(id) = id?;
    if !questions::delete_question(&pool, id).await? {
        return Err(ApiError::NotFound);
    }
    QUESTIONS_DELETED_CNTR.inc();
    tracing::info!("Deleted question {id}");
    Ok(done())
}

async fn search_questions(
    State(pool): State<SqlitePool>,
    query: Result<Query<PageQuery>, QueryRejection>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> ApiResponse<Json<QuestionsListing>> {
    let Query(PageQuery { page }) = query?;
    let Json(body) = body?;
    let term = body.search_term.unwrap_or_default();
    let found = questions::search_questions(&pool, &term, page).await?;
    Ok(Json(QuestionsListing {
        success: true,
        questions: found.questions,
        total_questions: found.total,
        categories: None,
        current_category: "",
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(get_questions).post(create_question))
        .route("/questions/{id}", delete(delete_question))
        .route("/questions/search", post(search_questions))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn form(body: serde_json::Value) -> QuestionForm {
        serde_json::from_value(body).unwrap()
    }

    fn full() -> serde_json::Value {
        json!({
            "question": "Whose autobiography is entitled 'I Know Why the Caged Bird Sings'?",
            "answer": "Maya Angelou",
            "category": 4,
            "difficulty": 2,
        })
    }

    #[test]
    fn complete_form_is_accepted() {
        let question = form(full()).validate().unwrap();
        assert_eq!(question.answer, "Maya Angelou");
        assert_eq!(question.category, 4);
        assert_eq!(question.difficulty, 2);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let mut body = full();
        body["category"] = json!("3");
        body["difficulty"] = json!("4");
        let question = form(body).validate().unwrap();
        assert_eq!(question.category, 3);
        assert_eq!(question.difficulty, 4);
    }

    #[test]
    fn missing_fields_are_rejected() {
        for field in ["question", "answer", "category", "difficulty"] {
            let mut body = full();
            body.as_object_mut().unwrap().remove(field);
            assert!(
                matches!(form(body).validate(), Err(ApiError::BadRequest(_))),
                "{field} should be required"
            );
        }
    }

    #[test]
    fn blank_text_and_zero_category_are_rejected() {
        let mut body = full();
        body["answer"] = json!("   ");
        assert!(form(body).validate().is_err());

        let mut body = full();
        body["category"] = json!(0);
        assert!(form(body).validate().is_err());
    }

    #[test]
    fn difficulty_must_be_in_range() {
        for difficulty in [0, -1, 5] {
            let mut body = full();
            body["difficulty"] = json!(difficulty);
            assert!(form(body).validate().is_err(), "{difficulty} accepted");
        }
        for difficulty in 1..=4 {
            let mut body = full();
            body["difficulty"] = json!(difficulty);
            assert!(form(body).validate().is_ok());
        }
    }
}
