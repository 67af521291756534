//! Article repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `created_at` is set once on insert; `modified_at` is refreshed on every
//!   update.
//! - Index listings only contain articles that are both published and marked
//!   `show_at_index`.

use crate::model::article::{Article, ArticleId};
use crate::repo::{
    bool_to_int, delete_by_id, ensure_connection_ready, parse_bool, require_id, Page, RepoError,
    RepoResult, NOW_MS_SQL,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    preview_image,
    content,
    show_at_index,
    is_published,
    created_at,
    modified_at
FROM articles";

const REQUIRED_TABLES: &[&str] = &["articles"];

/// Listing options for articles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleListQuery {
    /// Only published articles.
    pub published_only: bool,
    /// Only published articles flagged for the index page.
    pub index_only: bool,
    pub page: Page,
}

/// Repository interface for editorial articles.
pub trait ArticleRepository {
    fn create_article(&self, article: &Article) -> RepoResult<ArticleId>;
    fn update_article(&self, article: &Article) -> RepoResult<()>;
    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>>;
    /// Lists articles newest first.
    fn list_articles(&self, query: &ArticleListQuery) -> RepoResult<Vec<Article>>;
    fn delete_article(&self, id: ArticleId) -> RepoResult<()>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn create_article(&self, article: &Article) -> RepoResult<ArticleId> {
        article.validate()?;
        self.conn
            .execute(
                "INSERT INTO articles (
                    title,
                    preview_image,
                    content,
                    show_at_index,
                    is_published
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    article.title.as_str(),
                    article.preview_image.as_ref(),
                    article.content.as_str(),
                    bool_to_int(article.show_at_index),
                    bool_to_int(article.is_published),
                ],
            )
            .map_err(|err| RepoError::from_write(err, "article", "id"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_article(&self, article: &Article) -> RepoResult<()> {
        article.validate()?;
        let id = require_id(article.id, "article")?;
        let changed = self.conn.execute(
            &format!(
                "UPDATE articles
                 SET
                    title = ?2,
                    preview_image = ?3,
                    content = ?4,
                    show_at_index = ?5,
                    is_published = ?6,
                    modified_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                id,
                article.title.as_str(),
                article.preview_image.as_ref(),
                article.content.as_str(),
                bool_to_int(article.show_at_index),
                bool_to_int(article.is_published),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "article",
                id,
            });
        }
        Ok(())
    }

    fn get_article(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(article_from_row(row)?));
        }
        Ok(None)
    }

    fn list_articles(&self, query: &ArticleListQuery) -> RepoResult<Vec<Article>> {
        let mut sql = format!("{ARTICLE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if query.published_only || query.index_only {
            sql.push_str(" AND is_published = 1");
        }
        if query.index_only {
            sql.push_str(" AND show_at_index = 1");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        query.page.push_sql(&mut sql, &mut bind_values);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            articles.push(article_from_row(row)?);
        }
        Ok(articles)
    }

    fn delete_article(&self, id: ArticleId) -> RepoResult<()> {
        delete_by_id(self.conn, "DELETE FROM articles WHERE id = ?1;", "article", id)
    }
}

fn article_from_row(row: &Row<'_>) -> RepoResult<Article> {
    Ok(Article {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        preview_image: row.get("preview_image")?,
        content: row.get("content")?,
        show_at_index: parse_bool(row, "show_at_index")?,
        is_published: parse_bool(row, "is_published")?,
        created_at: Some(row.get("created_at")?),
        modified_at: Some(row.get("modified_at")?),
    })
}
