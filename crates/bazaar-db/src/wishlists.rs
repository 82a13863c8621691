use anyhow::Result;
use rusqlite::{Connection, Row};

use crate::Database;
use crate::models::WishlistRow;
use crate::queries::{OptionalExt, is_unique_violation};
use crate::repository::WishlistRepository;

impl WishlistRepository for Database {
    fn list_wishlists(&self, user_id: i64) -> Result<Vec<WishlistRow>> {
        self.with_conn(|conn| {
            // Rows outlive their product; skip the dangling ones
            let mut stmt = conn.prepare(
                "SELECT w.id, w.user_id, w.product_id, w.created_at
                 FROM wishlists w
                 JOIN products p ON p.id = w.product_id
                 WHERE w.user_id = ?1
                 ORDER BY w.id",
            )?;
            let rows = stmt
                .query_map([user_id], map_wishlist)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn find_wishlist(&self, user_id: i64, product_id: i64) -> Result<Option<WishlistRow>> {
        self.with_conn(|conn| query_wishlist(conn, user_id, product_id))
    }

    fn insert_wishlist(&self, user_id: i64, product_id: i64) -> Result<Option<WishlistRow>> {
        self.with_conn_mut(|conn| {
            match conn.execute(
                "INSERT INTO wishlists (user_id, product_id) VALUES (?1, ?2)",
                [user_id, product_id],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
            query_wishlist(conn, user_id, product_id)
        })
    }

    fn delete_wishlist(&self, user_id: i64, product_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM wishlists WHERE user_id = ?1 AND product_id = ?2",
                [user_id, product_id],
            )?;
            Ok(removed > 0)
        })
    }
}

fn map_wishlist(row: &Row<'_>) -> rusqlite::Result<WishlistRow> {
    Ok(WishlistRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        product_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn query_wishlist(conn: &Connection, user_id: i64, product_id: i64) -> Result<Option<WishlistRow>> {
    conn.query_row(
        "SELECT id, user_id, product_id, created_at FROM wishlists
         WHERE user_id = ?1 AND product_id = ?2",
        [user_id, product_id],
        map_wishlist,
    )
    .optional()
}
