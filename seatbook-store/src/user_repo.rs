use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use seatbook_core::repository::UserRepository;
use seatbook_core::user::{NewUser, User};
use seatbook_core::{SeatError, SeatResult};

use crate::store_err;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    full_name: String,
    designation: String,
    email: String,
    phone_number: String,
    company_name: String,
    password_hash: String,
    adopted_students: i32,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            full_name: row.full_name,
            designation: row.designation,
            email: row.email,
            phone_number: row.phone_number,
            company_name: row.company_name,
            password_hash: row.password_hash,
            adopted_students: row.adopted_students,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

const ALL_COLUMNS: &str =
    "id, full_name, designation, email, phone_number, company_name, password_hash, adopted_students, role, created_at";

fn map_unique_violation(err: sqlx::Error, user: &NewUser) -> SeatError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some("users_email_key") => return SeatError::DuplicateEmail(user.email.clone()),
            Some("users_phone_number_key") => {
                return SeatError::DuplicatePhone(user.phone_number.clone())
            }
            _ => {}
        }
    }
    store_err(err)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, user: &NewUser) -> SeatResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (full_name, designation, email, phone_number, company_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ALL_COLUMNS}
            "#,
        ))
        .bind(&user.full_name)
        .bind(&user.designation)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.company_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, user))?;

        Ok(row.into())
    }

    async fn get_user(&self, user_id: i64) -> SeatResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {ALL_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(User::from))
    }

    async fn add_adopted_students(&self, user_id: i64, count: i32) -> SeatResult<()> {
        let result = sqlx::query(
            "UPDATE users SET adopted_students = adopted_students + $2 WHERE id = $1",
        )
        .bind(user_id)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(SeatError::UserNotFound(user_id));
        }
        Ok(())
    }
}
