use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Form, Router,
};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument};

use crate::{
    auth::SessionUser,
    error::AppError,
    htmx,
    meals::{
        dto::{HistoryPage, HistoryQuery, MealForm, MealView, TodayPage},
        repo_types::{Meal, MealType, NewMeal},
    },
    state::AppState,
    views::View,
};

// --- routers ---

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/today", get(today))
        .route("/history", get(history))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/meals", post(create_meal))
        .route("/api/meals/:id", delete(delete_meal))
}

// --- handlers ---

pub async fn index() -> Redirect {
    Redirect::to("/today")
}

/// Today's meals for the signed-in user. Anonymous visitors go to `/login`.
#[instrument(skip(state))]
pub async fn today(
    State(state): State<AppState>,
    session: Option<SessionUser>,
) -> Result<Response, AppError> {
    let Some(SessionUser(user_id)) = session else {
        return Ok(Redirect::to("/login").into_response());
    };

    let date = state.config.local_now().date();
    let meals = Meal::list_by_user_and_date(&state.db, user_id, date).await?;
    let page = TodayPage {
        date: date.to_string(),
        meals: meals.into_iter().map(MealView::from).collect(),
        meal_types: MealType::ALL,
        deletable: true,
        show_day: false,
    };
    Ok(state.views.render(View::Today, true, &page)?.into_response())
}

/// `?date=YYYY-MM-DD` narrows to one day; without it every meal of the user.
#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    session: Option<SessionUser>,
    WithRejection(Query(query), _): WithRejection<Query<HistoryQuery>, AppError>,
) -> Result<Response, AppError> {
    let Some(SessionUser(user_id)) = session else {
        return Ok(Redirect::to("/login").into_response());
    };

    let date = query.date()?;
    let meals = match date {
        Some(date) => Meal::list_by_user_and_date(&state.db, user_id, date).await?,
        None => Meal::list_by_user(&state.db, user_id).await?,
    };
    let page = HistoryPage {
        date: date.map(|d| d.to_string()),
        meals: meals.into_iter().map(MealView::from).collect(),
        deletable: false,
        show_day: date.is_none(),
    };
    Ok(state.views.render(View::History, true, &page)?.into_response())
}

#[instrument(skip(state, form))]
pub async fn create_meal(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    WithRejection(Form(form), _): WithRejection<Form<MealForm>, AppError>,
) -> Result<Redirect, AppError> {
    let Some((meal_type, name)) = form.entry() else {
        return Err(AppError::BadRequest(
            "Error, received an empty form submission!".into(),
        ));
    };

    let new_meal = NewMeal::at(user_id, name, meal_type, state.config.local_now());
    let meal = Meal::insert(&state.db, new_meal).await?;
    info!(meal_id = meal.id, user_id, meal_type = %meal.meal_type, "meal logged");
    Ok(Redirect::to("/today"))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Response, AppError> {
    Meal::delete_by_user_and_id(&state.db, user_id, id).await?;
    info!(meal_id = id, user_id, "meal deleted");
    Ok(htmx::hx_redirect("/today"))
}
