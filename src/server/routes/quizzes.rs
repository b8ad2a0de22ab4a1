use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::SqlitePool;

use crate::db::queries::questions::get_quiz_candidates;
use crate::db::Question;
use crate::quiz;
use crate::server::app::AppState;
use crate::server::errors::{ApiJson, ApiResponse};
use crate::telemetry::QUIZ_QUESTIONS_CNTR;

// the category label sent along with the id is not needed to filter
#[derive(Deserialize)]
struct QuizCategory {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    id: i64,
}

#[derive(Deserialize)]
struct QuizRequest {
    quiz_category: QuizCategory,
    #[serde(default)]
    previous_questions: Vec<i64>,
}

#[derive(Serialize)]
struct QuizResponse {
    question: Option<Question>,
}

async fn next_question(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<QuizRequest>,
) -> ApiResponse<Json<QuizResponse>> {
    let category = quiz::category_filter(body.quiz_category.id);
    let candidates = get_quiz_candidates(&pool, category, &body.previous_questions).await?;
    let question = quiz::choose_next(candidates, &mut rand::thread_rng());

    match &question {
        Some(q) => {
            let category = q.category.to_string();
            QUIZ_QUESTIONS_CNTR
                .with_label_values(&[category.as_str()])
                .inc();
        }
        None => tracing::debug!(
            category = body.quiz_category.id,
            asked = body.previous_questions.len(),
            "Quiz exhausted"
        ),
    }
    Ok(Json(QuizResponse { question }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_question))
        .with_state(state)
}
