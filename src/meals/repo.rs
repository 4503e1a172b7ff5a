use sqlx::SqlitePool;
use time::Date;

use crate::error::RepoError;
use crate::meals::repo_types::{Meal, MealRow, NewMeal};

fn into_meals(rows: Vec<MealRow>) -> Result<Vec<Meal>, RepoError> {
    rows.into_iter().map(Meal::try_from).collect()
}

impl Meal {
    pub async fn insert(db: &SqlitePool, meal: NewMeal) -> Result<Meal, RepoError> {
        let row = sqlx::query_as::<_, MealRow>(
            r#"
            INSERT INTO Meals (user_id, name, meal_type, date_consumed)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, name, meal_type, date_consumed
            "#,
        )
        .bind(meal.user_id)
        .bind(&meal.name)
        .bind(meal.meal_type.as_str())
        .bind(meal.date_consumed)
        .fetch_one(db)
        .await?;
        row.try_into()
    }

    /// Every meal of every user, oldest first.
    pub async fn list_all(db: &SqlitePool) -> Result<Vec<Meal>, RepoError> {
        let rows = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT id, user_id, name, meal_type, date_consumed
            FROM Meals
            ORDER BY date_consumed, id
            "#,
        )
        .fetch_all(db)
        .await?;
        into_meals(rows)
    }

    /// All of one user's meals, most recent first.
    pub async fn list_by_user(db: &SqlitePool, user_id: i64) -> Result<Vec<Meal>, RepoError> {
        let rows = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT id, user_id, name, meal_type, date_consumed
            FROM Meals
            WHERE user_id = ?
            ORDER BY date_consumed DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        into_meals(rows)
    }

    /// One user's meals on a calendar day, in the order they were eaten.
    pub async fn list_by_user_and_date(
        db: &SqlitePool,
        user_id: i64,
        date: Date,
    ) -> Result<Vec<Meal>, RepoError> {
        let rows = sqlx::query_as::<_, MealRow>(
            r#"
            SELECT id, user_id, name, meal_type, date_consumed
            FROM Meals
            WHERE user_id = ? AND DATE(date_consumed) = ?
            ORDER BY date_consumed, id
            "#,
        )
        .bind(user_id)
        .bind(date.to_string())
        .fetch_all(db)
        .await?;
        into_meals(rows)
    }

    pub async fn delete_by_id(db: &SqlitePool, id: i64) -> Result<(), RepoError> {
        let res = sqlx::query("DELETE FROM Meals WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    /// Deletes only if the meal belongs to `user_id`; otherwise `NotFound`.
    pub async fn delete_by_user_and_id(db: &SqlitePool, user_id: i64, id: i64) -> Result<(), RepoError> {
        let res = sqlx::query("DELETE FROM Meals WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
