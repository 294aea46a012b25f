//! HTTP handlers for product endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{ConvertedAmount, CreateProductInput, Product, UpdateProductInput};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::ProductSuggestions;
use crate::services::{ProductFilter, ProductService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: Option<Decimal>,
}

fn product_service(state: &AppState) -> ProductService {
    ProductService::new(state.db.clone(), state.currency.clone())
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(product_service(&state).list(&filter).await?))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    Ok(Json(product_service(&state).get(id).await?))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = product_service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    Ok(Json(product_service(&state).update(id, input).await?))
}

/// Delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    product_service(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Complementary product suggestions
pub async fn product_suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductSuggestions>> {
    let suggestions = product_service(&state)
        .suggestions(id, state.generator.as_deref())
        .await?;
    Ok(Json(suggestions))
}

/// Convert a USD amount to EUR and COP
pub async fn convert_currency(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> AppResult<Json<ConvertedAmount>> {
    let amount = query.amount.unwrap_or(Decimal::ZERO);
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::Validation {
            field: "amount".to_string(),
            message: "Amount must not be negative".to_string(),
            message_es: "El monto no puede ser negativo".to_string(),
        });
    }
    Ok(Json(state.currency.convert(amount).await))
}
