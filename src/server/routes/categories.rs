use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::queries::categories::{self, get_all_categories, get_category, CategoryMap};
use crate::db::queries::questions::get_questions_for_category;
use crate::db::Question;
use crate::server::app::AppState;
use crate::server::errors::{ApiError, ApiPath, ApiResponse};

#[derive(Serialize)]
struct CategoriesBody {
    categories: CategoryMap,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryQuestionsBody {
    questions: Vec<Question>,
    total_questions: usize,
    current_category: String,
}

async fn list_categories(State(pool): State<SqlitePool>) -> ApiResponse<Json<CategoriesBody>> {
    let categories = get_all_categories(&pool).await?;
    // an empty store is reported as missing rather than as an empty listing
    if categories.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(CategoriesBody {
        categories: categories::to_map(categories),
    }))
}

async fn questions_for_category(
    State(pool): State<SqlitePool>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<Json<CategoryQuestionsBody>> {
    let category = get_category(&pool, id).await?;
    let questions = get_questions_for_category(&pool, category.id).await?;
    Ok(Json(CategoryQuestionsBody {
        total_questions: questions.len(),
        questions,
        current_category: category.kind,
    }))
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{id}/questions", get(questions_for_category))
        .with_state(state)
}
