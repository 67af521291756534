//! Row counts per entity table, for operator tooling.

use super::DbResult;
use rusqlite::Connection;

/// Entity tables in migration order.
pub const ENTITY_TABLES: &[&str] = &[
    "cuisine_types",
    "restaurant_categories",
    "social_channels",
    "tags",
    "regions",
    "restaurants",
    "restaurant_tags",
    "restaurant_images",
    "restaurant_menus",
    "reviews",
    "review_images",
    "articles",
];

/// Returns `(table, row_count)` for every entity table.
pub fn table_row_counts(conn: &Connection) -> DbResult<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(ENTITY_TABLES.len());
    for table in ENTITY_TABLES {
        // Table names come from the constant list above, never from input.
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))?;
        counts.push((*table, count));
    }
    Ok(counts)
}
