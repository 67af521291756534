//! Lookup repository: cuisine types, categories, social channels and tags.
//!
//! # Invariants
//! - Deleting a cuisine type cascades to its categories.
//! - Deleting a category or social channel clears references to it.
//! - Tag names are unique; duplicates surface as `RepoError::Unique`.

use crate::model::catalog::{
    CategoryId, CuisineType, CuisineTypeId, RestaurantCategory, SocialChannel, SocialChannelId,
    Tag, TagId,
};
use crate::repo::{delete_by_id, ensure_connection_ready, require_id, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const REQUIRED_TABLES: &[&str] = &[
    "cuisine_types",
    "restaurant_categories",
    "social_channels",
    "tags",
];

/// Repository interface for lookup entities.
pub trait CatalogRepository {
    fn create_cuisine_type(&self, cuisine_type: &CuisineType) -> RepoResult<CuisineTypeId>;
    fn update_cuisine_type(&self, cuisine_type: &CuisineType) -> RepoResult<()>;
    fn get_cuisine_type(&self, id: CuisineTypeId) -> RepoResult<Option<CuisineType>>;
    fn list_cuisine_types(&self) -> RepoResult<Vec<CuisineType>>;
    /// Deletes the cuisine type together with every category under it.
    fn delete_cuisine_type(&self, id: CuisineTypeId) -> RepoResult<()>;

    fn create_category(&self, category: &RestaurantCategory) -> RepoResult<CategoryId>;
    fn update_category(&self, category: &RestaurantCategory) -> RepoResult<()>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<RestaurantCategory>>;
    /// Lists categories, optionally only those of one cuisine type.
    fn list_categories(
        &self,
        cuisine_type_id: Option<CuisineTypeId>,
    ) -> RepoResult<Vec<RestaurantCategory>>;
    fn delete_category(&self, id: CategoryId) -> RepoResult<()>;

    fn create_social_channel(&self, channel: &SocialChannel) -> RepoResult<SocialChannelId>;
    fn update_social_channel(&self, channel: &SocialChannel) -> RepoResult<()>;
    fn get_social_channel(&self, id: SocialChannelId) -> RepoResult<Option<SocialChannel>>;
    fn list_social_channels(&self) -> RepoResult<Vec<SocialChannel>>;
    fn delete_social_channel(&self, id: SocialChannelId) -> RepoResult<()>;

    fn create_tag(&self, tag: &Tag) -> RepoResult<TagId>;
    fn update_tag(&self, tag: &Tag) -> RepoResult<()>;
    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>>;
    fn find_tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>>;
    /// Returns the tag named `name`, creating it when missing.
    fn get_or_create_tag(&self, name: &str) -> RepoResult<Tag>;
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
    fn delete_tag(&self, id: TagId) -> RepoResult<()>;
}

/// SQLite-backed lookup repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn update_name(
        &self,
        sql: &str,
        entity: &'static str,
        unique_fields: &'static str,
        id: i64,
        name: &str,
    ) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(sql, params![id, name])
            .map_err(|err| RepoError::from_write(err, entity, unique_fields))?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity, id });
        }
        Ok(())
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_cuisine_type(&self, cuisine_type: &CuisineType) -> RepoResult<CuisineTypeId> {
        cuisine_type.validate()?;
        self.conn
            .execute(
                "INSERT INTO cuisine_types (name) VALUES (?1);",
                [cuisine_type.name.as_str()],
            )
            .map_err(|err| RepoError::from_write(err, "cuisine type", "id"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_cuisine_type(&self, cuisine_type: &CuisineType) -> RepoResult<()> {
        cuisine_type.validate()?;
        let id = require_id(cuisine_type.id, "cuisine type")?;
        self.update_name(
            "UPDATE cuisine_types SET name = ?2 WHERE id = ?1;",
            "cuisine type",
            "id",
            id,
            &cuisine_type.name,
        )
    }

    fn get_cuisine_type(&self, id: CuisineTypeId) -> RepoResult<Option<CuisineType>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, name FROM cuisine_types WHERE id = ?1;",
                [id],
                |row| {
                    Ok(CuisineType {
                        id: Some(row.get("id")?),
                        name: row.get("name")?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    fn list_cuisine_types(&self) -> RepoResult<Vec<CuisineType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM cuisine_types ORDER BY name ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(CuisineType {
                id: Some(row.get("id")?),
                name: row.get("name")?,
            });
        }
        Ok(items)
    }

    fn delete_cuisine_type(&self, id: CuisineTypeId) -> RepoResult<()> {
        delete_by_id(
            self.conn,
            "DELETE FROM cuisine_types WHERE id = ?1;",
            "cuisine type",
            id,
        )
    }

    fn create_category(&self, category: &RestaurantCategory) -> RepoResult<CategoryId> {
        category.validate()?;
        self.conn
            .execute(
                "INSERT INTO restaurant_categories (name, cuisine_type_id) VALUES (?1, ?2);",
                params![category.name.as_str(), category.cuisine_type_id],
            )
            .map_err(|err| RepoError::from_write(err, "restaurant category", "id"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_category(&self, category: &RestaurantCategory) -> RepoResult<()> {
        category.validate()?;
        let id = require_id(category.id, "restaurant category")?;
        let changed = self
            .conn
            .execute(
                "UPDATE restaurant_categories
                 SET name = ?2, cuisine_type_id = ?3
                 WHERE id = ?1;",
                params![id, category.name.as_str(), category.cuisine_type_id],
            )
            .map_err(|err| RepoError::from_write(err, "restaurant category", "id"))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "restaurant category",
                id,
            });
        }
        Ok(())
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<RestaurantCategory>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, name, cuisine_type_id FROM restaurant_categories WHERE id = ?1;",
                [id],
                category_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn list_categories(
        &self,
        cuisine_type_id: Option<CuisineTypeId>,
    ) -> RepoResult<Vec<RestaurantCategory>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, cuisine_type_id
             FROM restaurant_categories
             WHERE (?1 IS NULL OR cuisine_type_id = ?1)
             ORDER BY name ASC, id ASC;",
        )?;
        let mut rows = stmt.query([cuisine_type_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(category_from_row(row)?);
        }
        Ok(items)
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<()> {
        delete_by_id(
            self.conn,
            "DELETE FROM restaurant_categories WHERE id = ?1;",
            "restaurant category",
            id,
        )
    }

    fn create_social_channel(&self, channel: &SocialChannel) -> RepoResult<SocialChannelId> {
        channel.validate()?;
        self.conn
            .execute(
                "INSERT INTO social_channels (name) VALUES (?1);",
                [channel.name.as_str()],
            )
            .map_err(|err| RepoError::from_write(err, "social channel", "id"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_social_channel(&self, channel: &SocialChannel) -> RepoResult<()> {
        channel.validate()?;
        let id = require_id(channel.id, "social channel")?;
        self.update_name(
            "UPDATE social_channels SET name = ?2 WHERE id = ?1;",
            "social channel",
            "id",
            id,
            &channel.name,
        )
    }

    fn get_social_channel(&self, id: SocialChannelId) -> RepoResult<Option<SocialChannel>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, name FROM social_channels WHERE id = ?1;",
                [id],
                |row| {
                    Ok(SocialChannel {
                        id: Some(row.get("id")?),
                        name: row.get("name")?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    fn list_social_channels(&self) -> RepoResult<Vec<SocialChannel>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM social_channels ORDER BY name ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(SocialChannel {
                id: Some(row.get("id")?),
                name: row.get("name")?,
            });
        }
        Ok(items)
    }

    fn delete_social_channel(&self, id: SocialChannelId) -> RepoResult<()> {
        delete_by_id(
            self.conn,
            "DELETE FROM social_channels WHERE id = ?1;",
            "social channel",
            id,
        )
    }

    fn create_tag(&self, tag: &Tag) -> RepoResult<TagId> {
        tag.validate()?;
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1);", [tag.name.as_str()])
            .map_err(|err| RepoError::from_write(err, "tag", "name"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_tag(&self, tag: &Tag) -> RepoResult<()> {
        tag.validate()?;
        let id = require_id(tag.id, "tag")?;
        self.update_name(
            "UPDATE tags SET name = ?2 WHERE id = ?1;",
            "tag",
            "name",
            id,
            &tag.name,
        )
    }

    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>> {
        let found = self
            .conn
            .query_row("SELECT id, name FROM tags WHERE id = ?1;", [id], tag_from_row)
            .optional()?;
        Ok(found)
    }

    fn find_tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, name FROM tags WHERE name = ?1;",
                [name],
                tag_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn get_or_create_tag(&self, name: &str) -> RepoResult<Tag> {
        if let Some(existing) = self.find_tag_by_name(name)? {
            return Ok(existing);
        }
        let mut tag = Tag::new(name);
        tag.id = Some(self.create_tag(&tag)?);
        Ok(tag)
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(tag_from_row(row)?);
        }
        Ok(items)
    }

    fn delete_tag(&self, id: TagId) -> RepoResult<()> {
        delete_by_id(self.conn, "DELETE FROM tags WHERE id = ?1;", "tag", id)
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<RestaurantCategory> {
    Ok(RestaurantCategory {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        cuisine_type_id: row.get("cuisine_type_id")?,
    })
}

pub(crate) fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: Some(row.get("id")?),
        name: row.get("name")?,
    })
}
