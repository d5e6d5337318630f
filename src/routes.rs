use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    handler::{book::book_handler, role::role_handler, user::user_handler},
};

pub fn create_router(app_state: AppState) -> Router {
    let api_route = Router::new()
        .nest("/Book", book_handler())
        .nest("/Role", role_handler())
        .nest("/User", user_handler(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new().nest("/api", api_route)
}
