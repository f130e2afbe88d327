//! Model repository implementation

use crate::error::{Error, Result};
use crate::models::{Model, ModelId, NewModel};
use rusqlite::{params, Connection, OptionalExtension};

/// Trait for model storage operations
pub trait ModelRepository {
    /// Insert a new model; a missing order appends after the highest rank
    fn create(&self, model: &NewModel) -> Result<Model>;

    fn get(&self, id: ModelId) -> Result<Option<Model>>;

    /// List models by display rank
    fn list(&self) -> Result<Vec<Model>>;

    fn find_by_name(&self, name: &str) -> Result<Option<Model>>;

    /// Whether any model is flagged as default
    fn has_default(&self) -> Result<bool>;
}

/// `SQLite` implementation of `ModelRepository`
pub struct SqliteModelRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteModelRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_model(row: &rusqlite::Row<'_>) -> rusqlite::Result<Model> {
        Ok(Model {
            id: row.get(0)?,
            name: row.get(1)?,
            order: row.get(2)?,
            is_default: row.get::<_, i32>(3)? != 0,
        })
    }

    fn next_order(&self) -> Result<i64> {
        let max: Option<i64> =
            self.conn
                .query_row("SELECT MAX(sort_order) FROM models", [], |row| row.get(0))?;
        Ok(max.map_or(0, |max| max + 1))
    }
}

impl ModelRepository for SqliteModelRepository<'_> {
    fn create(&self, model: &NewModel) -> Result<Model> {
        if model.name.is_empty() {
            return Err(Error::InvalidInput("model name cannot be empty".into()));
        }

        let order = match model.order {
            Some(order) => order,
            None => self.next_order()?,
        };

        self.conn.execute(
            "INSERT INTO models (name, sort_order, is_default) VALUES (?, ?, ?)",
            params![model.name, order, i32::from(model.is_default)],
        )?;

        let id = ModelId::new(self.conn.last_insert_rowid());
        self.get(id)?
            .ok_or_else(|| Error::Database(format!("model {id} vanished after insert")))
    }

    fn get(&self, id: ModelId) -> Result<Option<Model>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, sort_order, is_default FROM models WHERE id = ?",
                params![id],
                Self::parse_model,
            )
            .optional()?)
    }

    fn list(&self) -> Result<Vec<Model>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, sort_order, is_default FROM models ORDER BY sort_order, id")?;
        let models = stmt
            .query_map([], Self::parse_model)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(models)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Model>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, sort_order, is_default FROM models WHERE name = ?",
                params![name],
                Self::parse_model,
            )
            .optional()?)
    }

    fn has_default(&self) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM models WHERE is_default = 1)",
            [],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
