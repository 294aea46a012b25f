//! Chatbot handler

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::chatbot::answer_question;
use crate::services::{ChatContext, ChatRequest, ChatResponse, ProductService};
use crate::AppState;

/// Answer a question about companies, products and inventory
pub async fn chat(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let products = ProductService::new(state.db.clone(), state.currency.clone());
    let context = ChatContext::load(&state.db, &products).await?;

    tracing::debug!(user_id = %current_user.0.user_id, "Chat question received");
    let response = answer_question(request, &context, state.generator.as_deref()).await?;
    Ok(Json(response))
}
