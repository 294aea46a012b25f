//! HTTP handlers for company endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{Company, CreateCompanyInput, UpdateCompanyInput};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::CompanyService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CompanyQuery {
    pub search: Option<String>,
}

/// List companies
pub async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> AppResult<Json<Vec<Company>>> {
    let service = CompanyService::new(state.db);
    let companies = service.list(query.search.as_deref()).await?;
    Ok(Json(companies))
}

/// Get a company by NIT
pub async fn get_company(
    State(state): State<AppState>,
    Path(nit): Path<String>,
) -> AppResult<Json<Company>> {
    let service = CompanyService::new(state.db);
    Ok(Json(service.get(&nit).await?))
}

/// Register a company
pub async fn create_company(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCompanyInput>,
) -> AppResult<(StatusCode, Json<Company>)> {
    current_user.require_admin()?;
    let service = CompanyService::new(state.db);
    let company = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// Update a company
pub async fn update_company(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(nit): Path<String>,
    Json(input): Json<UpdateCompanyInput>,
) -> AppResult<Json<Company>> {
    current_user.require_admin()?;
    let service = CompanyService::new(state.db);
    Ok(Json(service.update(&nit, input).await?))
}

/// Delete a company
pub async fn delete_company(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(nit): Path<String>,
) -> AppResult<StatusCode> {
    current_user.require_admin()?;
    let service = CompanyService::new(state.db);
    service.delete(&nit).await?;
    Ok(StatusCode::NO_CONTENT)
}
