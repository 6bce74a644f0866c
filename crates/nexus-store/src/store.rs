//! Entity store implementation using SQLite.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags, Row, params};
use tracing::{debug, info};

use crate::entity::{Coords, Entity, EntityKind};
use crate::error::{Result, StoreError};

const ENTITY_COLUMNS: &str = r#"id, kind, name, role, company, industry, location, avatar, status, "group", source, coord_x, coord_y"#;

/// Entity store backed by SQLite.
///
/// Uses WAL mode for better concurrent read performance. Queries are
/// read-only after seeding; the orchestrator never mutates entities.
pub struct EntityStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Initialization
// ─────────────────────────────────────────────────────────────────────────────

impl EntityStore {
    /// Open or create an entity store at the given path.
    ///
    /// Creates the database file and initializes the schema if it doesn't
    /// exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;

        info!("Entity store opened at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;

        debug!("In-memory entity store created");
        Ok(store)
    }

    /// Initialize the database with schema and pragmas.
    fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        // Enable WAL mode for better concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                role TEXT,
                company TEXT,
                industry TEXT,
                location TEXT,
                avatar TEXT,
                status TEXT,
                "group" TEXT,
                source TEXT,
                coord_x REAL,
                coord_y REAL
            );

            CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities(kind);
            CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(name);
            "#,
        )?;

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────────────────────────

impl EntityStore {
    /// Insert an entity. The caller owns the id.
    pub fn insert(&self, entity: &Entity) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            INSERT INTO entities (id, kind, name, role, company, industry, location,
                                  avatar, status, "group", source, coord_x, coord_y)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                entity.id,
                entity.kind.as_str(),
                entity.name,
                entity.role,
                entity.company,
                entity.industry,
                entity.location,
                entity.avatar,
                entity.status,
                entity.group,
                entity.source,
                entity.coords.map(|c| c.x),
                entity.coords.map(|c| c.y),
            ],
        )?;

        debug!(id = entity.id, name = %entity.name, "Inserted entity");
        Ok(())
    }

    /// Get an entity by id.
    pub fn get(&self, id: i64) -> Result<Option<Entity>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTITY_COLUMNS} FROM entities WHERE id = ?1"
        ))?;
        let mut rows = stmt.query(params![id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_entity(row)?))
        } else {
            Ok(None)
        }
    }

    /// Number of entities in the store.
    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Case-insensitive substring search across name, role, company,
    /// industry, location, and source.
    ///
    /// No ranking; results are ordered by id so a given store state always
    /// returns the same sequence.
    pub fn find(&self, query: &str) -> Result<Vec<Entity>> {
        let conn = self.conn.lock().unwrap();
        let pattern = like_pattern(query);

        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {ENTITY_COLUMNS}
            FROM entities
            WHERE name LIKE ?1 ESCAPE '\'
               OR role LIKE ?1 ESCAPE '\'
               OR company LIKE ?1 ESCAPE '\'
               OR industry LIKE ?1 ESCAPE '\'
               OR location LIKE ?1 ESCAPE '\'
               OR source LIKE ?1 ESCAPE '\'
            ORDER BY id
            "#
        ))?;

        let mut rows = stmt.query(params![pattern])?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(Self::row_to_entity(row)?);
        }

        debug!(query, matches = entities.len(), "Entity search");
        Ok(entities)
    }

    /// Populate the store with the canonical demo records.
    ///
    /// A no-op when the store already holds entities; returns the number of
    /// records inserted.
    pub fn seed(&self) -> Result<usize> {
        if self.count()? > 0 {
            debug!("Entity store already populated, skipping seed");
            return Ok(0);
        }

        let records = seed_entities();
        for entity in &records {
            self.insert(entity)?;
        }

        info!(count = records.len(), "Seeded entity store");
        Ok(records.len())
    }

    fn row_to_entity(row: &Row<'_>) -> Result<Entity> {
        let kind: String = row.get(1)?;
        let coord_x: Option<f64> = row.get(11)?;
        let coord_y: Option<f64> = row.get(12)?;

        Ok(Entity {
            id: row.get(0)?,
            kind: EntityKind::parse(&kind)?,
            name: row.get(2)?,
            role: row.get(3)?,
            company: row.get(4)?,
            industry: row.get(5)?,
            location: row.get(6)?,
            avatar: row.get(7)?,
            status: row.get(8)?,
            group: row.get(9)?,
            source: row.get(10)?,
            coords: coord_x.zip(coord_y).map(|(x, y)| Coords { x, y }),
        })
    }
}

/// Build a LIKE pattern with `%`, `_`, and `\` escaped so the query string
/// matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// The canonical demo dataset.
fn seed_entities() -> Vec<Entity> {
    vec![
        Entity::person(1, "Elena Silva", "VP Sales", "TechFlow")
            .with_avatar("https://api.dicebear.com/7.x/avataaars/svg?seed=Elena")
            .with_status("Active")
            .with_group("VIP")
            .with_source("LinkedIn Sales Nav")
            .with_coords(30.0, 40.0),
        Entity::person(2, "Marcus Chen", "Head of Growth", "Nubank")
            .with_avatar("https://api.dicebear.com/7.x/avataaars/svg?seed=Marcus")
            .with_status("Active")
            .with_group("Fintech")
            .with_source("Apollo.io")
            .with_coords(65.0, 25.0),
        Entity::person(3, "Sarah Jones", "CRO", "Vtex")
            .with_avatar("https://api.dicebear.com/7.x/avataaars/svg?seed=Sarah")
            .with_status("Unassigned")
            .with_group("Retail")
            .with_source("Clearbit")
            .with_coords(20.0, 70.0),
        Entity::business(101, "TechFlow HQ", "SaaS Platform", "São Paulo")
            .with_avatar("https://api.dicebear.com/7.x/initials/svg?seed=TF")
            .with_status("Target")
            .with_group("High Growth")
            .with_source("Google Places")
            .with_coords(32.0, 38.0),
        Entity::business(102, "Nubank Office", "Fintech", "São Paulo")
            .with_avatar("https://api.dicebear.com/7.x/initials/svg?seed=NB")
            .with_status("Customer")
            .with_group("Enterprise")
            .with_source("Google Places")
            .with_coords(62.0, 22.0),
        Entity::business(103, "Mercado Libre", "E-commerce", "Buenos Aires")
            .with_avatar("https://api.dicebear.com/7.x/initials/svg?seed=ML")
            .with_status("New")
            .with_group("Enterprise")
            .with_source("Internal DB")
            .with_coords(80.0, 60.0),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
