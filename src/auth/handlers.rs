use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthPage, CredentialsForm},
        services::{self, AuthError},
        session::{SessionKeys, SessionUser},
    },
    error::AppError,
    htmx,
    state::AppState,
    views::View,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", post(logout))
}

fn render_form(
    state: &AppState,
    view: View,
    signed_in: bool,
    status: StatusCode,
    page: AuthPage,
) -> Result<Response, AppError> {
    let html = state.views.render(view, signed_in, &page)?;
    Ok((status, html).into_response())
}

/// Sets the session cookie and sends the user to today's page.
fn start_session(state: &AppState, jar: CookieJar, user_id: i64) -> Result<Response, AppError> {
    let keys = SessionKeys::from_ref(state);
    let token = keys.sign(user_id)?;
    Ok((jar.add(keys.login_cookie(token)), Redirect::to("/today")).into_response())
}

#[instrument(skip(state))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Option<SessionUser>,
) -> Result<Response, AppError> {
    render_form(&state, View::Login, session.is_some(), StatusCode::OK, AuthPage::default())
}

#[instrument(skip(state))]
pub async fn register_page(
    State(state): State<AppState>,
    session: Option<SessionUser>,
) -> Result<Response, AppError> {
    render_form(&state, View::Register, session.is_some(), StatusCode::OK, AuthPage::default())
}

#[instrument(skip(state, jar, form))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Form(form), _): WithRejection<Form<CredentialsForm>, AppError>,
) -> Result<Response, AppError> {
    match services::authenticate(&state.db, &form.email, &form.password).await {
        Ok(user) => {
            info!(user_id = user.id, "user logged in");
            start_session(&state, jar, user.id)
        }
        Err(AuthError::InvalidCredentials) => render_form(
            &state,
            View::Login,
            false,
            StatusCode::UNAUTHORIZED,
            AuthPage {
                email: form.email,
                error: Some(AuthError::InvalidCredentials.to_string()),
            },
        ),
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, jar, form))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Form(form), _): WithRejection<Form<CredentialsForm>, AppError>,
) -> Result<Response, AppError> {
    let (status, error) = match services::register(&state.db, &form.email, &form.password).await {
        Ok(user) => {
            info!(user_id = user.id, email = %user.email, "user registered");
            return start_session(&state, jar, user.id);
        }
        Err(e @ AuthError::EmailTaken) => (StatusCode::CONFLICT, e.to_string()),
        Err(e @ (AuthError::InvalidEmail | AuthError::PasswordTooShort)) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => return Err(e.into()),
    };

    render_form(
        &state,
        View::Register,
        false,
        status,
        AuthPage {
            email: form.email,
            error: Some(error),
        },
    )
}

/// Clears the session cookie. htmx callers navigate via `HX-Redirect`.
#[instrument(skip(headers, jar))]
pub async fn logout(headers: HeaderMap, jar: CookieJar) -> impl IntoResponse {
    info!("user logged out");
    (
        jar.remove(SessionKeys::logout_cookie()),
        htmx::redirect(&headers, "/login"),
    )
}
