use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::RepoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealType {
    /// Form field order: the first non-empty field of a submission wins.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snacks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snacks => "snacks",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown meal type {0:?}")]
pub struct UnknownMealType(pub String);

impl FromStr for MealType {
    type Err = UnknownMealType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownMealType(s.to_string()))
    }
}

/// Raw `meals` row; `meal_type` is still text.
#[derive(Debug, FromRow)]
pub struct MealRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub meal_type: String,
    pub date_consumed: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub meal_type: MealType,
    pub date_consumed: PrimitiveDateTime, // wall clock in the configured offset
}

impl TryFrom<MealRow> for Meal {
    type Error = RepoError;

    fn try_from(r: MealRow) -> Result<Self, Self::Error> {
        let meal_type = r
            .meal_type
            .parse::<MealType>()
            .map_err(|e: UnknownMealType| RepoError::Decode(format!("meal {}: {e}", r.id)))?;
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            meal_type,
            date_consumed: r.date_consumed,
        })
    }
}

/// A meal about to be inserted.
#[derive(Debug, Clone)]
pub struct NewMeal {
    pub user_id: i64,
    pub name: String,
    pub meal_type: MealType,
    pub date_consumed: PrimitiveDateTime,
}

impl NewMeal {
    /// Stamped with the wall-clock time of `at` in its own offset, truncated
    /// to whole seconds. The stored day is the local calendar day.
    pub fn at(user_id: i64, name: impl Into<String>, meal_type: MealType, at: OffsetDateTime) -> Self {
        let at = at.replace_nanosecond(0).unwrap_or(at);
        Self {
            user_id,
            name: name.into(),
            meal_type,
            date_consumed: PrimitiveDateTime::new(at.date(), at.time()),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime, offset};

    use super::*;

    #[test]
    fn meal_type_parses_its_own_names() {
        for t in MealType::ALL {
            assert_eq!(t.as_str().parse::<MealType>(), Ok(t));
        }
        assert_eq!(
            "brunch".parse::<MealType>(),
            Err(UnknownMealType("brunch".into()))
        );
    }

    #[test]
    fn row_with_unknown_meal_type_is_a_decode_error() {
        let row = MealRow {
            id: 3,
            user_id: 1,
            name: "Toast".into(),
            meal_type: "elevenses".into(),
            date_consumed: datetime!(2024-03-05 12:00),
        };
        assert!(matches!(Meal::try_from(row), Err(RepoError::Decode(_))));
    }

    #[test]
    fn new_meal_has_whole_seconds() {
        let at = datetime!(2024-03-05 7:15:30.5 UTC);
        let meal = NewMeal::at(1, "Porridge", MealType::Breakfast, at);
        assert_eq!(meal.date_consumed, datetime!(2024-03-05 7:15:30));
    }

    #[test]
    fn new_meal_uses_the_local_calendar_day() {
        // 23:00 UTC on the 4th is 07:00 on the 5th at +08:00.
        let at = datetime!(2024-03-04 23:00 UTC).to_offset(offset!(+8));
        let meal = NewMeal::at(1, "Congee", MealType::Breakfast, at);
        assert_eq!(meal.date_consumed, datetime!(2024-03-05 7:00));
        assert_eq!(meal.date_consumed.date(), date!(2024 - 03 - 05));
    }
}
