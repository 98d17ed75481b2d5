use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::http::response::envelope_response;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// `GET /api/geocode?q=`; a missing `q` is reported as `INVALID_PARAMS`.
pub async fn geocode(State(state): State<AppState>, Query(params): Query<GeocodeParams>) -> Response {
    let query = params.q.unwrap_or_default();
    envelope_response(state.geocode.lookup(&query).await)
}
