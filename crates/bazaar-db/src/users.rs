use anyhow::Result;
use rusqlite::Connection;

use crate::Database;
use crate::models::UserRow;
use crate::queries::{OptionalExt, is_unique_violation};
use crate::repository::UserRepository;

impl UserRepository for Database {
    fn create_user(&self, email: &str, password_hash: &str, name: &str) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            match conn.execute(
                "INSERT INTO users (email, password, name) VALUES (?1, ?2, ?3)",
                (email, password_hash, name),
            ) {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    fn user_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT id FROM users WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, email, password FROM users WHERE email = ?1")?;

    let row = stmt
        .query_row([email], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}
