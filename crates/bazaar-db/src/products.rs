use std::collections::HashMap;

use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

use crate::Database;
use crate::models::{CategoryRow, NewPicture, NewProduct, ProductChanges, ProductRow};
use crate::queries::OptionalExt;
use crate::repository::{
    CategoryRepository, DeleteOutcome, PictureAttacher, ProductRepository, UpdateOutcome,
};

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.price, c.name, p.description,
            p.seller_id, p.created_at, p.updated_at
     FROM products p
     JOIN categories c ON c.id = p.category_id";

impl CategoryRepository for Database {
    fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(CategoryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

impl ProductRepository for Database {
    fn list_products(&self) -> Result<Vec<ProductRow>> {
        self.with_conn(query_products)
    }

    fn find_product(&self, id: i64) -> Result<Option<ProductRow>> {
        self.with_conn(|conn| query_product(conn, id))
    }

    fn product_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT id FROM products WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
    }

    fn create_product(
        &self,
        product: &NewProduct<'_>,
        attach: PictureAttacher<'_>,
    ) -> Result<Option<ProductRow>> {
        self.with_tx(|tx| {
            let Some(category_id) = query_category_id(tx, product.category)? else {
                return Ok(None);
            };

            tx.execute(
                "INSERT INTO products (name, price, description, category_id, seller_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    product.name,
                    product.price,
                    product.description,
                    category_id,
                    product.seller_id
                ],
            )?;
            let product_id = tx.last_insert_rowid();

            let pictures = attach(product_id)?;
            insert_pictures(tx, product_id, &pictures)?;

            let created = query_product(tx, product_id)?
                .ok_or_else(|| anyhow!("Product {} missing after insert", product_id))?;
            Ok(Some(created))
        })
    }

    fn update_product(
        &self,
        id: i64,
        seller_id: i64,
        changes: &ProductChanges<'_>,
        attach: Option<PictureAttacher<'_>>,
    ) -> Result<UpdateOutcome> {
        self.with_tx(|tx| {
            let Some(category_id) = query_category_id(tx, changes.category)? else {
                return Ok(UpdateOutcome::UnknownCategory);
            };

            match query_seller_id(tx, id)? {
                None => return Ok(UpdateOutcome::NotFound),
                Some(owner) if owner != seller_id => return Ok(UpdateOutcome::NotOwner),
                Some(_) => {}
            }

            tx.execute(
                "UPDATE products
                 SET name = COALESCE(?1, name),
                     price = COALESCE(?2, price),
                     description = COALESCE(?3, description),
                     category_id = ?4,
                     updated_at = datetime('now')
                 WHERE id = ?5",
                params![changes.name, changes.price, changes.description, category_id, id],
            )?;

            let mut replaced_pictures = Vec::new();
            if let Some(attach) = attach {
                replaced_pictures = query_picture_names(tx, id)?;
                tx.execute("DELETE FROM pictures WHERE product_id = ?1", [id])?;
                let pictures = attach(id)?;
                insert_pictures(tx, id, &pictures)?;
            }

            let product = query_product(tx, id)?
                .ok_or_else(|| anyhow!("Product {} missing after update", id))?;
            Ok(UpdateOutcome::Updated {
                product,
                replaced_pictures,
            })
        })
    }

    fn delete_product(&self, id: i64, seller_id: i64) -> Result<DeleteOutcome> {
        self.with_tx(|tx| {
            match query_seller_id(tx, id)? {
                None => return Ok(DeleteOutcome::NotFound),
                Some(owner) if owner != seller_id => return Ok(DeleteOutcome::NotOwner),
                Some(_) => {}
            }

            // Picture rows go with the product via ON DELETE CASCADE
            let pictures = query_picture_names(tx, id)?;
            tx.execute("DELETE FROM products WHERE id = ?1", [id])?;
            Ok(DeleteOutcome::Deleted { pictures })
        })
    }
}

fn map_product(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        seller_id: row.get(5)?,
        pictures: Vec::new(),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn query_products(conn: &Connection) -> Result<Vec<ProductRow>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY p.id", PRODUCT_SELECT))?;
    let mut products = stmt
        .query_map([], map_product)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // One pass over pictures instead of a query per product
    let mut stmt = conn.prepare("SELECT product_id, name FROM pictures ORDER BY id")?;
    let mut by_product: HashMap<i64, Vec<String>> = HashMap::new();
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
    for row in rows {
        let (product_id, name) = row?;
        by_product.entry(product_id).or_default().push(name);
    }

    for product in &mut products {
        if let Some(names) = by_product.remove(&product.id) {
            product.pictures = names;
        }
    }

    Ok(products)
}

fn query_product(conn: &Connection, id: i64) -> Result<Option<ProductRow>> {
    let product = conn
        .query_row(&format!("{} WHERE p.id = ?1", PRODUCT_SELECT), [id], map_product)
        .optional()?;

    match product {
        Some(mut product) => {
            product.pictures = query_picture_names(conn, id)?;
            Ok(Some(product))
        }
        None => Ok(None),
    }
}

fn query_picture_names(conn: &Connection, product_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pictures WHERE product_id = ?1 ORDER BY id")?;
    let names = stmt
        .query_map([product_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(names)
}

fn query_category_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row("SELECT id FROM categories WHERE name = ?1", [name], |row| row.get(0))
        .optional()
}

fn query_seller_id(conn: &Connection, product_id: i64) -> Result<Option<i64>> {
    conn.query_row("SELECT seller_id FROM products WHERE id = ?1", [product_id], |row| row.get(0))
        .optional()
}

fn insert_pictures(conn: &Connection, product_id: i64, pictures: &[NewPicture]) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT INTO pictures (product_id, name, url) VALUES (?1, ?2, ?3)")?;
    for picture in pictures {
        stmt.execute(params![product_id, picture.name, picture.url])?;
    }
    Ok(())
}
