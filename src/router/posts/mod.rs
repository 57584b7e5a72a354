//! Posts-related HTTP API.
mod create;
mod delete;
mod get;
mod update;

pub use get::by_author;

use axum::routing::{delete, get, post, put};
use axum::{Router, middleware};

use crate::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    let mutating = Router::new()
        // `POST /posts` goes to `create`. Authorization required.
        .route("/", post(create::handler))
        // `PUT /posts/:ID` goes to `update`. Author only.
        .route("/{id}", put(update::handler))
        // `DELETE /posts/:ID` goes to `delete`. Author only.
        .route("/{id}", delete(delete::handler))
        // `POST /posts/:ID/comments` goes to `comments::create`.
        // Authorization required.
        .route("/{id}/comments", post(crate::router::comments::create))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::router::guard,
        ));

    Router::new()
        // `GET /posts` goes to `all`.
        .route("/", get(get::all))
        // `GET /posts/:ID` goes to `one`.
        .route("/{id}", get(get::one))
        // `GET /posts/:ID/comments` goes to `comments::list`.
        .route("/{id}/comments", get(crate::router::comments::list))
        .merge(mutating)
}
