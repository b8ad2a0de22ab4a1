use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::db::queries::categories::{self, get_all_categories, CategoryMap};
use crate::db::queries::questions::{
    self, count_questions, get_question, get_questions_page, search_questions,
};
use crate::db::{NewQuestion, Question};
use crate::server::app::AppState;
use crate::server::deserializers::deserialize_non_blank_string;
use crate::server::errors::{ApiError, ApiJson, ApiPath, ApiResponse};
use crate::server::pagination::Pagination;

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

// every field is optional here so that a missing one is a 400 of ours
// rather than a deserialization failure
#[derive(Deserialize)]
struct QuestionForm {
    #[serde(default, deserialize_with = "deserialize_non_blank_string")]
    question: Option<String>,
    #[serde(default, deserialize_with = "deserialize_non_blank_string")]
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    difficulty: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    category: Option<i64>,
}

impl TryFrom<QuestionForm> for NewQuestion {
    type Error = ApiError;

    fn try_from(form: QuestionForm) -> Result<Self, Self::Error> {
        match form {
            // zero counts as not given; category 0 also means "All" to the quiz
            QuestionForm {
                question: Some(question),
                answer: Some(answer),
                difficulty: Some(difficulty),
                category: Some(category),
            } if difficulty != 0 && category != 0 => Ok(NewQuestion {
                question,
                answer,
                difficulty,
                category,
            }),
            _ => Err(ApiError::BadRequest),
        }
    }
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(rename = "searchTerm")]
    #[serde(default, deserialize_with = "deserialize_non_blank_string")]
    search_term: Option<String>,
}

#[derive(Serialize)]
struct QuestionsPage {
    questions: Vec<Question>,
    total_questions: i64,
    categories: CategoryMap,
}

#[derive(Serialize)]
struct SearchResults {
    questions: Vec<Question>,
    total_questions: usize,
}

#[derive(Serialize)]
struct Deleted {
    success: &'static str,
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    Query(query): Query<PageQuery>,
) -> ApiResponse<(HeaderMap, Json<QuestionsPage>)> {
    let pagination = Pagination::from_query(query.page.as_deref());
    let questions = get_questions_page(&pool, pagination.limit(), pagination.offset()).await?;
    let total_questions = count_questions(&pool).await?;
    let categories = categories::to_map(get_all_categories(&pool).await?);

    let mut headers = HeaderMap::new();
    if let Some(links) = pagination.link_header("/questions", total_questions) {
        if let Ok(value) = HeaderValue::from_str(&links) {
            headers.insert(header::LINK, value);
        }
    }

    Ok((
        headers,
        Json(QuestionsPage {
            questions,
            total_questions,
            categories,
        }),
    ))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<Json<Deleted>> {
    get_question(&pool, id).await?;
    let removed = questions::delete_question(&pool, id)
        .await
        .map_err(ApiError::Unprocessable)?;
    if !removed {
        return Err(ApiError::NotFound);
    }
    tracing::info!(id, "Question deleted");
    Ok(Json(Deleted {
        success: "Question deleted successfully",
    }))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    ApiJson(form): ApiJson<QuestionForm>,
) -> ApiResponse<(StatusCode, Json<NewQuestion>)> {
    let new_question = NewQuestion::try_from(form)?;
    let id = questions::create_question(&pool, &new_question)
        .await
        .map_err(ApiError::Unprocessable)?;
    tracing::info!(id, category = new_question.category, "Question created");
    Ok((StatusCode::CREATED, Json(new_question)))
}

async fn search(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<SearchBody>,
) -> ApiResponse<Json<SearchResults>> {
    let term = body.search_term.ok_or(ApiError::BadRequest)?;
    let questions = search_questions(&pool, &term).await?;
    Ok(Json(SearchResults {
        total_questions: questions.len(),
        questions,
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/search", post(search))
        .route("/questions/{id}", delete(delete_question))
        .with_state(state)
}
