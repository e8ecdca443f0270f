use axum::Router;

use crate::state::AppState;

pub mod bookings;
pub mod doc;
pub mod health;
pub mod params;
pub mod payments;
pub mod sessions;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/sessions", sessions::router())
        .nest("/payments", payments::router())
        .nest("/bookings", bookings::router())
}
