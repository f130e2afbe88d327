//! Folder repository implementation

use crate::error::{Error, Result};
use crate::models::{Folder, FolderId, NewFolder};
use rusqlite::{params, Connection, OptionalExtension};

const FOLDER_COLUMNS: &str =
    "id, name, parent_id, is_read_only, color, pinned_at, created_at, updated_at";

/// Trait for folder storage operations
pub trait FolderRepository {
    /// Insert a new folder
    fn create(&self, folder: &NewFolder) -> Result<Folder>;

    /// Get a folder by ID
    fn get(&self, id: FolderId) -> Result<Option<Folder>>;

    /// List every folder in id order
    fn list(&self) -> Result<Vec<Folder>>;

    /// First folder (lowest id) with exactly this name
    fn find_by_name(&self, name: &str) -> Result<Option<Folder>>;

    /// The root default folder (lowest-id root)
    fn default_folder(&self) -> Result<Option<Folder>>;

    /// Write every mutable column of `folder`
    fn update(&self, folder: &Folder) -> Result<()>;

    /// Whether `ancestor` appears on the parent chain of `folder` (or is `folder`)
    fn is_self_or_ancestor(&self, ancestor: FolderId, folder: FolderId) -> Result<bool>;
}

/// `SQLite` implementation of `FolderRepository`
pub struct SqliteFolderRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteFolderRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_folder(row: &rusqlite::Row<'_>) -> rusqlite::Result<Folder> {
        Ok(Folder {
            id: row.get(0)?,
            name: row.get(1)?,
            parent_id: row.get(2)?,
            is_read_only: row.get::<_, i32>(3)? != 0,
            color: row.get(4)?,
            pinned_at: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FolderRepository for SqliteFolderRepository<'_> {
    fn create(&self, folder: &NewFolder) -> Result<Folder> {
        if folder.name.trim().is_empty() {
            return Err(Error::InvalidInput("folder name cannot be empty".into()));
        }

        self.conn.execute(
            "INSERT INTO folders (name, parent_id, is_read_only, color, pinned_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                folder.name,
                folder.parent_id,
                i32::from(folder.is_read_only),
                folder.color,
                folder.pinned_at,
                folder.created_at,
                folder.updated_at
            ],
        )?;

        let id = FolderId::new(self.conn.last_insert_rowid());
        self.get(id)?
            .ok_or_else(|| Error::Database(format!("folder {id} vanished after insert")))
    }

    fn get(&self, id: FolderId) -> Result<Option<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::parse_folder)
            .optional()?)
    }

    fn list(&self) -> Result<Vec<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let folders = stmt
            .query_map([], Self::parse_folder)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(folders)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE name = ? ORDER BY id LIMIT 1");
        Ok(self
            .conn
            .query_row(&sql, params![name], Self::parse_folder)
            .optional()?)
    }

    fn default_folder(&self) -> Result<Option<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_id IS NULL ORDER BY id LIMIT 1"
        );
        Ok(self
            .conn
            .query_row(&sql, [], Self::parse_folder)
            .optional()?)
    }

    fn update(&self, folder: &Folder) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE folders
             SET name = ?, parent_id = ?, is_read_only = ?, color = ?, pinned_at = ?, updated_at = ?
             WHERE id = ?",
            params![
                folder.name,
                folder.parent_id,
                i32::from(folder.is_read_only),
                folder.color,
                folder.pinned_at,
                folder.updated_at,
                folder.id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(format!("folder {}", folder.id)));
        }
        Ok(())
    }

    fn is_self_or_ancestor(&self, ancestor: FolderId, folder: FolderId) -> Result<bool> {
        let found: bool = self.conn.query_row(
            "WITH RECURSIVE chain(id, parent_id) AS (
                 SELECT id, parent_id FROM folders WHERE id = ?1
                 UNION
                 SELECT f.id, f.parent_id FROM folders f JOIN chain c ON f.id = c.parent_id
             )
             SELECT EXISTS(SELECT 1 FROM chain WHERE id = ?2)",
            params![folder, ancestor],
            |row| row.get(0),
        )?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DEFAULT_FOLDER_NAME};

    fn setup() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_default_folder_seeded() {
        let db = setup();
        let repo = SqliteFolderRepository::new(db.connection());

        let default = repo.default_folder().unwrap().unwrap();
        assert_eq!(default.name, DEFAULT_FOLDER_NAME);
        assert!(default.is_root());
    }

    #[test]
    fn test_create_and_find_by_name() {
        let db = setup();
        let repo = SqliteFolderRepository::new(db.connection());

        let work = repo.create(&NewFolder::new("Work")).unwrap();
        let proj = repo
            .create(&NewFolder::new("Proj").with_parent(work.id))
            .unwrap();

        let found = repo.find_by_name("Proj").unwrap().unwrap();
        assert_eq!(found.id, proj.id);
        assert_eq!(found.parent_id, Some(work.id));
        assert!(repo.find_by_name("proj").unwrap().is_none());
    }

    #[test]
    fn test_rejects_empty_name() {
        let db = setup();
        let repo = SqliteFolderRepository::new(db.connection());
        assert!(repo.create(&NewFolder::new("  ")).is_err());
    }

    #[test]
    fn test_ancestor_chain() {
        let db = setup();
        let repo = SqliteFolderRepository::new(db.connection());

        let a = repo.create(&NewFolder::new("A")).unwrap();
        let b = repo.create(&NewFolder::new("B").with_parent(a.id)).unwrap();
        let c = repo.create(&NewFolder::new("C").with_parent(b.id)).unwrap();

        assert!(repo.is_self_or_ancestor(a.id, c.id).unwrap());
        assert!(repo.is_self_or_ancestor(c.id, c.id).unwrap());
        assert!(!repo.is_self_or_ancestor(c.id, a.id).unwrap());
    }

    #[test]
    fn test_update_missing_folder() {
        let db = setup();
        let repo = SqliteFolderRepository::new(db.connection());

        let mut folder = repo.default_folder().unwrap().unwrap();
        folder.id = FolderId::new(999);
        assert!(matches!(repo.update(&folder), Err(Error::NotFound(_))));
    }
}
