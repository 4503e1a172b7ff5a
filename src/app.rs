use std::net::SocketAddr;

use axum::Router;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{auth, meals};

pub fn build_app(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    Router::new()
        .merge(auth::router())
        .merge(meals::router())
        .nest_service("/static", static_files)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
            Method, Request, StatusCode,
        },
        response::Response,
    };
    use time::{
        macros::{datetime, offset},
        OffsetDateTime,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::auth::repo_types::User;
    use crate::htmx::{HX_REDIRECT, HX_REQUEST};
    use crate::meals::repo_types::{Meal, MealType, NewMeal};

    const FORM: &str = "application/x-www-form-urlencoded";

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(c) = cookie {
            req = req.header(COOKIE, c);
        }
        req.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, FORM);
        if let Some(c) = cookie {
            req = req.header(COOKIE, c);
        }
        req.body(Body::from(body.to_owned())).unwrap()
    }

    fn delete(uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .header(COOKIE, cookie)
            .header(HX_REQUEST, "true")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(res: Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// `name=value` of the session cookie set by a response.
    fn session_cookie(res: &Response) -> String {
        let raw = res.headers()[SET_COOKIE].to_str().unwrap();
        raw.split(';').next().unwrap().to_string()
    }

    async fn register(app: &Router, email: &str) -> String {
        let res = send(
            app,
            post_form("/register", &format!("email={email}&password=long-enough"), None),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[LOCATION], "/today");
        session_cookie(&res)
    }

    async fn setup() -> (AppState, Router) {
        let state = AppState::for_tests().await;
        let app = build_app(state.clone());
        (state, app)
    }

    #[tokio::test]
    async fn index_redirects_to_today() {
        let (_, app) = setup().await;
        let res = send(&app, get("/", None)).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[LOCATION], "/today");
    }

    #[tokio::test]
    async fn pages_redirect_anonymous_users_to_login() {
        let (_, app) = setup().await;
        for uri in ["/today", "/history", "/history?date=2024-03-05"] {
            let res = send(&app, get(uri, None)).await;
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(res.headers()[LOCATION], "/login");
        }
    }

    #[tokio::test]
    async fn forged_cookie_is_treated_as_anonymous() {
        let (_, app) = setup().await;
        let res = send(&app, get("/today", Some("session=not-a-token"))).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[LOCATION], "/login");
    }

    #[tokio::test]
    async fn api_requires_session() {
        let (_, app) = setup().await;
        let res = send(&app, post_form("/api/meals", "lunch=Soup", None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = send(
            &app,
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/meals/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_and_register_pages_render() {
        let (_, app) = setup().await;
        let res = send(&app, get("/login", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains("<title>Food Diary | Login</title>"));

        let res = send(&app, get("/register", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains("<title>Food Diary | Register</title>"));
    }

    #[tokio::test]
    async fn log_view_and_delete_a_meal() {
        let (state, app) = setup().await;
        let cookie = register(&app, "cook%40example.com").await;

        let res = send(&app, post_form("/api/meals", "breakfast=&lunch=Tomato+soup", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[LOCATION], "/today");

        let res = send(&app, get("/today", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("Tomato soup"));
        assert!(html.contains("Lunch"));

        let meals = Meal::list_all(&state.db).await.unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].meal_type, MealType::Lunch);

        let res = send(&app, delete(&format!("/api/meals/{}", meals[0].id), &cookie)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[HX_REDIRECT], "/today");
        assert!(Meal::list_all(&state.db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_meal_form_is_bad_request() {
        let (_, app) = setup().await;
        let cookie = register(&app, "cook%40example.com").await;
        let res = send(&app, post_form("/api/meals", "breakfast=++&dinner=", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn meal_without_form_content_type_is_bad_request() {
        let (_, app) = setup().await;
        let cookie = register(&app, "cook%40example.com").await;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/meals")
            .header(COOKIE, &cookie)
            .body(Body::from("lunch=Soup"))
            .unwrap();
        let res = send(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn meals_are_filed_under_the_configured_local_day() {
        let base = AppState::for_tests().await;
        let mut config = (*base.config).clone();
        config.utc_offset = offset!(+14);
        let state = AppState::from_parts(base.db.clone(), config).unwrap();
        let app = build_app(state.clone());
        let cookie = register(&app, "cook%40example.com").await;

        send(&app, post_form("/api/meals", "breakfast=Congee", Some(&cookie))).await;

        // +14:00 and -12:00 are 26 hours apart, so their calendar days always differ.
        let now = OffsetDateTime::now_utc();
        let local_day = now.to_offset(offset!(+14)).date();
        let other_day = now.to_offset(offset!(-12)).date();
        let meal = &Meal::list_all(&state.db).await.unwrap()[0];
        assert_eq!(meal.date_consumed.date(), local_day);

        let html = body_text(send(&app, get("/today", Some(&cookie))).await).await;
        assert!(html.contains("Congee"));

        let html = body_text(send(&app, get(&format!("/history?date={local_day}"), Some(&cookie))).await).await;
        assert!(html.contains("Congee"));
        let html = body_text(send(&app, get(&format!("/history?date={other_day}"), Some(&cookie))).await).await;
        assert!(!html.contains("Congee"));
    }

    #[tokio::test]
    async fn static_stylesheet_is_served() {
        let (_, app) = setup().await;
        let res = send(&app, get("/static/style.css", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        let content_type = res.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/css"), "{content_type}");
        assert!(!body_text(res).await.is_empty());
    }

    #[tokio::test]
    async fn cannot_delete_someone_elses_meal() {
        let (state, app) = setup().await;
        let alice = register(&app, "alice%40example.com").await;
        let bob = register(&app, "bob%40example.com").await;

        send(&app, post_form("/api/meals", "dinner=Lasagne", Some(&alice))).await;
        let meal_id = Meal::list_all(&state.db).await.unwrap()[0].id;

        let res = send(&app, delete(&format!("/api/meals/{meal_id}"), &bob)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(Meal::list_all(&state.db).await.unwrap().len(), 1);

        let res = send(&app, delete("/api/meals/not-a-number", &bob)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_by_date() {
        let (state, app) = setup().await;
        let cookie = register(&app, "cook%40example.com").await;
        let user_id = User::find_by_email(&state.db, "cook@example.com")
            .await
            .unwrap()
            .expect("registered user")
            .id;
        Meal::insert(
            &state.db,
            NewMeal {
                user_id,
                name: "Pancakes".into(),
                meal_type: MealType::Breakfast,
                date_consumed: datetime!(2024-03-05 08:15:00),
            },
        )
        .await
        .unwrap();

        let res = send(&app, get("/history?date=2024-03-05", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains("Pancakes"));

        let res = send(&app, get("/history?date=2024-03-06", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(!html.contains("Pancakes"));
        assert!(html.contains("No meals logged."));

        let res = send(&app, get("/history", Some(&cookie))).await;
        assert!(body_text(res).await.contains("2024-03-05"));

        let res = send(&app, get("/history?date=March+5", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_registration_rerenders_with_conflict() {
        let (_, app) = setup().await;
        register(&app, "twin%40example.com").await;

        let res = send(
            &app,
            post_form("/register", "email=twin%40example.com&password=long-enough", None),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert!(res.headers().get(SET_COOKIE).is_none());
        assert!(body_text(res).await.contains("Email already exists"));
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let (_, app) = setup().await;
        register(&app, "cook%40example.com").await;

        let res = send(
            &app,
            post_form("/login", "email=cook%40example.com&password=not-my-password", None),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(SET_COOKIE).is_none());
        assert!(body_text(res).await.contains("Invalid email or password"));
    }

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let (_, app) = setup().await;
        register(&app, "cook%40example.com").await;

        let res = send(
            &app,
            post_form("/login", "email=Cook%40Example.com&password=long-enough", None),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&res);
        assert!(cookie.starts_with("session="));

        let res = send(&app, get("/today", Some(&cookie))).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let (_, app) = setup().await;
        let cookie = register(&app, "cook%40example.com").await;

        let res = send(
            &app,
            Request::builder()
                .method(Method::POST)
                .uri("/logout")
                .header(COOKIE, &cookie)
                .header(HX_REQUEST, "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[HX_REDIRECT], "/login");
        let cleared = res.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cleared.starts_with("session=;"), "{cleared}");
    }
}
