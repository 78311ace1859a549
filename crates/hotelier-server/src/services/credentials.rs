//! Users and their credentials.

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use crate::auth::password;
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Patch, Role, User, UserPatch};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, phone_number, role, created_at, updated_at";

const DUPLICATE_USER: &str = "An account with this username or email already exists";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        phone_number: row.get(6)?,
        role: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub(crate) fn find_user(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        rusqlite::params![id],
        user_from_row,
    )
    .optional()
}

pub(crate) fn user_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        rusqlite::params![id],
        |row| row.get(0),
    )
}

/// Emails are stored and compared in this form.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn admin_exists(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')",
        [],
        |row| row.get(0),
    )
}

fn validate_new_user(user: &NewUser) -> AppResult<()> {
    if user.username.trim().is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    if user.email.is_empty() || !user.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    if user.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// Creates a user. The first account registered with `admin_email` is made an
/// admin; every other account is a plain user.
pub fn register(pool: &DbPool, mut new_user: NewUser, admin_email: Option<&str>) -> AppResult<User> {
    new_user.email = normalize_email(&new_user.email);
    validate_new_user(&new_user)?;

    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let is_admin_email = admin_email.is_some_and(|admin| normalize_email(admin) == new_user.email);
    let role = if is_admin_email && !admin_exists(&tx)? {
        Role::Admin
    } else {
        Role::User
    };
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: new_user.username.trim().to_string(),
        email: new_user.email,
        password_hash: password::hash_password(&new_user.password)?,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        phone_number: new_user.phone_number,
        role,
        created_at: db::now_timestamp(),
        updated_at: db::now_timestamp(),
    };

    tx.execute(
        &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
        rusqlite::params![
            user.id,
            user.username,
            user.email,
            user.password_hash,
            user.first_name,
            user.last_name,
            user.phone_number,
            user.role,
            user.created_at,
            user.updated_at
        ],
    )
    .map_err(|e| AppError::conflict_on_constraint(e, DUPLICATE_USER))?;
    tx.commit()?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");
    Ok(user)
}

/// Looks a user up by email and checks the password. Both failure cases
/// produce the same error.
pub fn authenticate(pool: &DbPool, email: &str, password: &str) -> AppResult<User> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            rusqlite::params![normalize_email(email)],
            user_from_row,
        )
        .optional()?
        .ok_or(AppError::InvalidCredentials)?;

    if !password::verify_password(password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

pub fn list_users(pool: &DbPool) -> AppResult<Vec<User>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, username"
    ))?;
    let users: Result<Vec<_>, _> = stmt.query_map([], user_from_row)?.collect();
    Ok(users?)
}

pub fn get_user(pool: &DbPool, id: &str) -> AppResult<User> {
    let conn = pool.get()?;
    find_user(&conn, id)?.ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub fn update_user(pool: &DbPool, id: &str, mut patch: UserPatch) -> AppResult<User> {
    let conn = pool.get()?;
    let mut user =
        find_user(&conn, id)?.ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if let Some(new_password) = patch.password.take() {
        if new_password.len() < 8 {
            return Err(AppError::BadRequest(
                "Password must be at least 8 characters".into(),
            ));
        }
        user.password_hash = password::hash_password(&new_password)?;
    }
    patch.apply_to(&mut user);
    user.email = normalize_email(&user.email);

    if user.username.trim().is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    if !user.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    user.updated_at = db::now_timestamp();

    conn.execute(
        "UPDATE users SET username = ?1, email = ?2, password_hash = ?3, first_name = ?4,
                last_name = ?5, phone_number = ?6, role = ?7, updated_at = ?8
         WHERE id = ?9",
        rusqlite::params![
            user.username,
            user.email,
            user.password_hash,
            user.first_name,
            user.last_name,
            user.phone_number,
            user.role,
            user.updated_at,
            user.id
        ],
    )
    .map_err(|e| AppError::conflict_on_constraint(e, DUPLICATE_USER))?;

    Ok(user)
}

/// Deletes a user together with their bookings and reviews.
pub fn delete_user(pool: &DbPool, id: &str) -> AppResult<()> {
    let conn = pool.get()?;
    let affected = conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id])?;
    if affected == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }
    tracing::info!(user_id = %id, "User deleted");
    Ok(())
}
