use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row};

use crate::Database;
use crate::models::{ChatMessageRow, ChatRow, ChatSummaryRow};
use crate::queries::OptionalExt;
use crate::repository::ChatRepository;

impl ChatRepository for Database {
    fn list_chats(&self, user_id: i64) -> Result<Vec<ChatSummaryRow>> {
        self.with_conn(|conn| {
            // JOIN the newest message per chat in the same query (no N+1)
            let mut stmt = conn.prepare(
                "SELECT c.id, c.buyer_id, c.seller_id, c.created_at,
                        m.id, m.user_id, m.message, m.created_at
                 FROM chats c
                 LEFT JOIN chat_messages m
                   ON m.id = (SELECT MAX(id) FROM chat_messages WHERE chat_id = c.id)
                 WHERE c.buyer_id = ?1 OR c.seller_id = ?1
                 ORDER BY COALESCE(m.created_at, c.created_at) DESC, c.id DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    let chat = map_chat(row)?;
                    let last_message = match row.get::<_, Option<i64>>(4)? {
                        Some(id) => Some(ChatMessageRow {
                            id,
                            chat_id: chat.id,
                            user_id: row.get(5)?,
                            message: row.get(6)?,
                            created_at: row.get(7)?,
                        }),
                        None => None,
                    };
                    Ok(ChatSummaryRow { chat, last_message })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    fn find_chat(&self, id: i64) -> Result<Option<ChatRow>> {
        self.with_conn(|conn| query_chat(conn, id))
    }

    fn open_chat(&self, buyer_id: i64, seller_id: i64) -> Result<ChatRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO chats (buyer_id, seller_id) VALUES (?1, ?2)",
                [buyer_id, seller_id],
            )?;
            conn.query_row(
                "SELECT id, buyer_id, seller_id, created_at FROM chats
                 WHERE buyer_id = ?1 AND seller_id = ?2",
                [buyer_id, seller_id],
                map_chat,
            )
            .map_err(Into::into)
        })
    }

    fn chat_messages(&self, chat_id: i64) -> Result<Vec<ChatMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, user_id, message, created_at
                 FROM chat_messages
                 WHERE chat_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map([chat_id], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn insert_chat_message(
        &self,
        chat_id: i64,
        user_id: i64,
        message: &str,
    ) -> Result<ChatMessageRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (chat_id, user_id, message) VALUES (?1, ?2, ?3)",
                rusqlite::params![chat_id, user_id, message],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                "SELECT id, chat_id, user_id, message, created_at FROM chat_messages WHERE id = ?1",
                [id],
                map_message,
            )
            .optional()?
            .ok_or_else(|| anyhow!("Chat message {} missing after insert", id))
        })
    }
}

fn map_chat(row: &Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        buyer_id: row.get(1)?,
        seller_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<ChatMessageRow> {
    Ok(ChatMessageRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        user_id: row.get(2)?,
        message: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn query_chat(conn: &Connection, id: i64) -> Result<Option<ChatRow>> {
    conn.query_row(
        "SELECT id, buyer_id, seller_id, created_at FROM chats WHERE id = ?1",
        [id],
        map_chat,
    )
    .optional()
}
