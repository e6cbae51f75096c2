use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use tracing::debug;

use roost_types::filter::{FilterDimension, ListingFilter};
use roost_types::models::Listing;

use crate::convert;
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;

/// Run `filter` against every listing, newest first.
pub async fn filter(state: &AppState, filter: ListingFilter) -> Result<Vec<Listing>, ApiError> {
    debug!(?filter, "filtering listings");
    let rows = state.with_db(move |db| Ok(db.filter_items(&filter)?)).await?;
    Ok(rows.into_iter().map(convert::listing).collect())
}

/// Apply only the predicate for `dimension`, ignoring other parameters.
pub async fn filter_by(
    state: &AppState,
    dimension: FilterDimension,
    params: ListingFilter,
) -> Result<Vec<Listing>, ApiError> {
    filter(state, params.only(dimension)).await
}

// -- Handlers --

/// Composite search: every supplied dimension must match.
pub async fn get_filter(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListingFilter>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(filter(&state, params).await?))
}

/// GET /filter/{dimension}
pub async fn get_filter_dimension(
    State(state): State<AppState>,
    ApiPath(dimension): ApiPath<String>,
    ApiQuery(params): ApiQuery<ListingFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let dimension: FilterDimension = dimension.parse().map_err(ApiError::NotFound)?;
    Ok(Json(filter_by(&state, dimension, params).await?))
}
