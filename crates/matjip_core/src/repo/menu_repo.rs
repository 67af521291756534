//! Restaurant menu repository contracts and SQLite implementation.

use crate::model::media::{RestaurantMenu, RestaurantMenuId};
use crate::model::restaurant::RestaurantId;
use crate::repo::{
    delete_by_id, ensure_connection_ready, parse_u32, require_id, RepoError, RepoResult,
    NOW_MS_SQL,
};
use rusqlite::{params, Connection, Row};

const MENU_SELECT_SQL: &str = "SELECT
    id,
    restaurant_id,
    name,
    price,
    image,
    created_at,
    updated_at
FROM restaurant_menus";

const REQUIRED_TABLES: &[&str] = &["restaurant_menus", "restaurants"];

/// Repository interface for menu items.
pub trait RestaurantMenuRepository {
    fn create_menu(&self, menu: &RestaurantMenu) -> RepoResult<RestaurantMenuId>;
    fn update_menu(&self, menu: &RestaurantMenu) -> RepoResult<()>;
    fn get_menu(&self, id: RestaurantMenuId) -> RepoResult<Option<RestaurantMenu>>;
    /// Menu items of one restaurant in insertion order.
    fn list_menus(&self, restaurant_id: RestaurantId) -> RepoResult<Vec<RestaurantMenu>>;
    fn delete_menu(&self, id: RestaurantMenuId) -> RepoResult<()>;
}

/// SQLite-backed menu repository.
pub struct SqliteRestaurantMenuRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRestaurantMenuRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl RestaurantMenuRepository for SqliteRestaurantMenuRepository<'_> {
    fn create_menu(&self, menu: &RestaurantMenu) -> RepoResult<RestaurantMenuId> {
        menu.validate()?;
        self.conn
            .execute(
                "INSERT INTO restaurant_menus (restaurant_id, name, price, image)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    menu.restaurant_id,
                    menu.name.as_str(),
                    menu.price,
                    menu.image.as_ref(),
                ],
            )
            .map_err(|err| RepoError::from_write(err, "restaurant menu", "id"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_menu(&self, menu: &RestaurantMenu) -> RepoResult<()> {
        menu.validate()?;
        let id = require_id(menu.id, "restaurant menu")?;
        let changed = self
            .conn
            .execute(
                &format!(
                    "UPDATE restaurant_menus
                     SET
                        restaurant_id = ?2,
                        name = ?3,
                        price = ?4,
                        image = ?5,
                        updated_at = {NOW_MS_SQL}
                     WHERE id = ?1;"
                ),
                params![
                    id,
                    menu.restaurant_id,
                    menu.name.as_str(),
                    menu.price,
                    menu.image.as_ref(),
                ],
            )
            .map_err(|err| RepoError::from_write(err, "restaurant menu", "id"))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "restaurant menu",
                id,
            });
        }
        Ok(())
    }

    fn get_menu(&self, id: RestaurantMenuId) -> RepoResult<Option<RestaurantMenu>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MENU_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(menu_from_row(row)?));
        }
        Ok(None)
    }

    fn list_menus(&self, restaurant_id: RestaurantId) -> RepoResult<Vec<RestaurantMenu>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MENU_SELECT_SQL} WHERE restaurant_id = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([restaurant_id])?;
        let mut menus = Vec::new();
        while let Some(row) = rows.next()? {
            menus.push(menu_from_row(row)?);
        }
        Ok(menus)
    }

    fn delete_menu(&self, id: RestaurantMenuId) -> RepoResult<()> {
        delete_by_id(
            self.conn,
            "DELETE FROM restaurant_menus WHERE id = ?1;",
            "restaurant menu",
            id,
        )
    }
}

fn menu_from_row(row: &Row<'_>) -> RepoResult<RestaurantMenu> {
    Ok(RestaurantMenu {
        id: Some(row.get("id")?),
        restaurant_id: row.get("restaurant_id")?,
        name: row.get("name")?,
        price: parse_u32(row, "price")?,
        image: row.get("image")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    })
}
