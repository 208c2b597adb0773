// Server-rendered pages: home, register, login, and the track board.
// Uses Askama templates; form posts redirect back like classic CRUD.

mod templates;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::{cookie::Cookie, CookieJar, Form};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::auth::{self, SESSION_COOKIE};
use crate::catches;
use crate::db::{RegisterRequest, User, UserResponse};
use crate::AppState;

pub use templates::*;

// Helper to render templates and handle errors
fn render_template<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Template error: {}", e),
        )
            .into_response(),
    }
}

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/register", get(register_page))
        .route("/register", post(register_submit))
        .route("/login", get(login_page))
        .route("/login", post(login_submit))
        .route("/logout", get(logout))
        .route("/track", get(track_board))
        .route("/save", post(save_board))
}

// Resolve the session cookie to a user, if any. Pages that work for
// anonymous visitors use this instead of the rejecting extractor.
async fn current_user(jar: &CookieJar, state: &AppState) -> Option<User> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    auth::resolve_session_user(&state.db, &token).await.ok()?
}

// Home page
async fn home(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    match current_user(&jar, &state).await {
        Some(user) => render_template(HomeTemplate {
            user: UserResponse::from(user),
        }),
        None => render_template(HomeAnonTemplate),
    }
}

// Registration form
async fn register_page() -> Response {
    render_template(RegisterTemplate {
        error: None,
        username: String::new(),
        email: String::new(),
    })
}

#[derive(Deserialize)]
struct RegisterForm {
    username: String,
    email: String,
    password: String,
    profile_img: Option<String>,
}

// Register, log the new user in, and land on the track board
async fn register_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let req = RegisterRequest {
        username: form.username,
        email: form.email,
        password: form.password,
        profile_img: form.profile_img.filter(|s| !s.is_empty()),
    };

    let reshow = |status: StatusCode, error: String, req: &RegisterRequest| {
        let template = RegisterTemplate {
            error: Some(error),
            username: req.username.clone(),
            email: req.email.clone(),
        };
        let html = template.render().unwrap_or_else(|e| format!("Error: {}", e));
        (status, Html(html)).into_response()
    };

    if let Err(e) = crate::api::validation::validate_registration(&req) {
        return reshow(StatusCode::BAD_REQUEST, e.message().to_string(), &req);
    }

    let user = match auth::register_user(&state.db, &req).await {
        Ok(user) => user,
        Err(e) => return reshow(StatusCode::CONFLICT, e.message().to_string(), &req),
    };

    match auth::start_session(&state.db, user.id, state.config.auth.session_ttl_days).await {
        Ok(token) => {
            let jar = jar.add(auth::session_cookie(token));
            (jar, Redirect::to("/track")).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to start session after registration: {}", e);
            Redirect::to("/login").into_response()
        }
    }
}

// Login form
async fn login_page() -> Response {
    render_template(LoginTemplate { error: None })
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

// Login submit
async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match auth::authenticate(&state.db, &form.username, &form.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let template = LoginTemplate {
                error: Some("Invalid credentials".to_string()),
            };
            let html = template.render().unwrap_or_else(|e| format!("Error: {}", e));
            return (StatusCode::UNAUTHORIZED, Html(html)).into_response();
        }
        Err(e) => {
            tracing::error!("Login query failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response();
        }
    };

    match auth::start_session(&state.db, user.id, state.config.auth.session_ttl_days).await {
        Ok(token) => {
            let jar = jar.add(auth::session_cookie(token));
            (jar, Redirect::to("/track")).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to start session: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
        }
    }
}

// Logout
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = auth::end_session(&state.db, cookie.value()).await {
            tracing::error!("Failed to end session: {}", e);
        }
    }
    let jar = jar.remove(Cookie::from(SESSION_COOKIE));
    (jar, Redirect::to("/login"))
}

// Track board: the full catalog with this user's catch state
async fn track_board(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let user = match current_user(&jar, &state).await {
        Some(user) => user,
        None => return Redirect::to("/").into_response(),
    };

    let fish = match catches::list_for_user(&state.db, user.id).await {
        Ok(fish) => fish,
        Err(e) => {
            tracing::error!("Failed to load track board: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response();
        }
    };

    let caught_count = fish.iter().filter(|f| f.is_caught).count();
    render_template(TrackTemplate {
        user: UserResponse::from(user),
        fish,
        caught_count,
    })
}

#[derive(Deserialize)]
struct SaveForm {
    // Checked boxes in the uncaught column: these were just caught.
    #[serde(default)]
    mark_caught: Vec<i64>,
    // Checked boxes in the caught column: these go back to uncaught.
    #[serde(default)]
    mark_uncaught: Vec<i64>,
}

// Bulk save from the board's checkboxes. Absolute sets per row, so
// resubmitting the same form cannot double-flip anything.
async fn save_board(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<SaveForm>,
) -> Response {
    let user = match current_user(&jar, &state).await {
        Some(user) => user,
        None => return Redirect::to("/").into_response(),
    };

    let result = async {
        catches::bulk_mark(&state.db, user.id, &form.mark_caught, true).await?;
        catches::bulk_mark(&state.db, user.id, &form.mark_uncaught, false).await
    }
    .await;

    match result {
        Ok(_) => Redirect::to("/track").into_response(),
        Err(e) => {
            tracing::error!("Failed to save board: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong").into_response()
        }
    }
}
