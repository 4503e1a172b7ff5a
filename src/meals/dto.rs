use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};

use crate::error::AppError;
use crate::meals::repo_types::{Meal, MealType};

/// Form body of `POST /api/meals`: one text field per meal type.
#[derive(Debug, Default, Deserialize)]
pub struct MealForm {
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
    pub snacks: Option<String>,
}

impl MealForm {
    fn field(&self, meal_type: MealType) -> Option<&str> {
        match meal_type {
            MealType::Breakfast => self.breakfast.as_deref(),
            MealType::Lunch => self.lunch.as_deref(),
            MealType::Dinner => self.dinner.as_deref(),
            MealType::Snacks => self.snacks.as_deref(),
        }
    }

    /// First non-blank field, checked in breakfast, lunch, dinner, snacks order.
    pub fn entry(&self) -> Option<(MealType, &str)> {
        MealType::ALL.into_iter().find_map(|t| {
            self.field(t)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| (t, name))
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub date: Option<String>,
}

impl HistoryQuery {
    /// `None` when no date was given; `BadRequest` when it isn't `YYYY-MM-DD`.
    pub fn date(&self) -> Result<Option<Date>, AppError> {
        match self.date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Date::parse(raw, format_description!("[year]-[month]-[day]"))
                .map(Some)
                .map_err(|_| AppError::BadRequest("Invalid date format".into())),
        }
    }
}

/// A meal as shown in the meals table.
#[derive(Debug, Serialize)]
pub struct MealView {
    pub id: i64,
    pub name: String,
    pub meal_type: MealType,
    pub day: String,
    pub time: String,
}

impl From<Meal> for MealView {
    fn from(m: Meal) -> Self {
        Self {
            id: m.id,
            day: m.date_consumed.date().to_string(),
            time: m
                .date_consumed
                .format(format_description!("[hour]:[minute]"))
                .unwrap_or_default(),
            name: m.name,
            meal_type: m.meal_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TodayPage {
    pub date: String,
    pub meals: Vec<MealView>,
    pub meal_types: [MealType; 4],
    pub deletable: bool,
    pub show_day: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub date: Option<String>,
    pub meals: Vec<MealView>,
    pub deletable: bool,
    pub show_day: bool,
}
