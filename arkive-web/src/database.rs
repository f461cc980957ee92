//! SQLite-backed storage for the archive

use arkive_access::store::ArchiveStore;
use arkive_core::{
    ArkiveError, ArkiveResult, FileEntry, FileMetadata, Group, Node, NodeId, NodeOwnership, User,
    ADMINISTRATORS_GROUP,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::password::hash_password;

/// Default password for the seeded admin account - should be changed in
/// production.
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Fixed ID of the seeded root node.
pub const ROOT_NODE_ID: &str = "1";

fn storage_error(err: sqlx::Error) -> ArkiveError {
    error!("storage query failed: {}", err);
    ArkiveError::dependency_with("storage query failed", err)
}

/// Internal user record including the password hash. Only the public
/// [`User`] shape ever leaves the host.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub password_hash: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            name: self.name,
        }
    }
}

fn node_from_row(row: &SqliteRow) -> Node {
    Node {
        id: row.get("id"),
        name: row.get("name"),
        parent_id: row.get("parent_id"),
        owner_user_id: row.get("owner_user_id"),
        owner_group_id: row.get("owner_group_id"),
        permissions: row.get::<i64, _>("permissions") as u32,
    }
}

/// SQLite store implementing the access engine's storage boundary plus
/// the file/metadata and user plumbing the handlers need.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect, create tables and seed default data.
    pub async fn connect(database_url: &str) -> ArkiveResult<Self> {
        // In-memory databases exist per connection; more than one
        // connection would each see an empty schema.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(storage_error)?;

        let store = Self { pool };
        store.create_tables().await?;
        store.seed_defaults().await?;

        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_tables(&self) -> ArkiveResult<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                name TEXT,
                password_hash TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL
            );

            CREATE TABLE IF NOT EXISTS group_members (
                group_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                PRIMARY KEY (group_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id TEXT,
                owner_user_id TEXT,
                owner_group_id TEXT,
                permissions INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS files (
                id TEXT PRIMARY KEY,
                node_id TEXT NOT NULL,
                name TEXT NOT NULL,
                size INTEGER NOT NULL,
                content_type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                file_data BLOB
            );

            CREATE TABLE IF NOT EXISTS metadata (
                file_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id);
            CREATE INDEX IF NOT EXISTS idx_files_node ON files(node_id);
            CREATE INDEX IF NOT EXISTS idx_metadata_file ON metadata(file_id);
        "#;

        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        debug!("database tables created or already present");
        Ok(())
    }

    /// Seed the Administrators group, the admin user and the root node on
    /// first start.
    async fn seed_defaults(&self) -> ArkiveResult<()> {
        let admin_group_id = match self.find_group_by_name(ADMINISTRATORS_GROUP).await? {
            Some(group) => group.id,
            None => {
                let group = Group {
                    id: Uuid::new_v4().to_string(),
                    name: ADMINISTRATORS_GROUP.to_string(),
                };
                self.create_group(&group).await?;
                group.id
            }
        };

        let admin_user_id = match self.find_user_by_username("admin").await? {
            Some(row) => row.id,
            None => {
                let user = User {
                    id: Uuid::new_v4().to_string(),
                    username: "admin".to_string(),
                    name: Some("Administrator".to_string()),
                };
                self.create_user(&user, &hash_password(DEFAULT_ADMIN_PASSWORD)?)
                    .await?;
                info!("created default admin user");
                user.id
            }
        };

        self.add_group_member(&admin_group_id, &admin_user_id).await?;

        if self.find_node(ROOT_NODE_ID).await?.is_none() {
            let root = Node {
                id: ROOT_NODE_ID.to_string(),
                name: "Root".to_string(),
                parent_id: None,
                owner_user_id: None,
                owner_group_id: Some(admin_group_id),
                permissions: 63,
            };
            self.create_node(&root).await?;
            info!("created root node");
        }

        Ok(())
    }

    // ---- users and groups ----

    pub async fn create_user(&self, user: &User, password_hash: &str) -> ArkiveResult<()> {
        sqlx::query("INSERT INTO users (id, username, name, password_hash) VALUES (?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.name)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    pub async fn find_user(&self, id: &str) -> ArkiveResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, name FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            username: row.get("username"),
            name: row.get("name"),
        }))
    }

    pub async fn find_user_by_username(&self, username: &str) -> ArkiveResult<Option<UserRow>> {
        let row =
            sqlx::query("SELECT id, username, name, password_hash FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(row.map(|row| UserRow {
            id: row.get("id"),
            username: row.get("username"),
            name: row.get("name"),
            password_hash: row.get("password_hash"),
        }))
    }

    pub async fn create_group(&self, group: &Group) -> ArkiveResult<()> {
        sqlx::query("INSERT INTO groups (id, name) VALUES (?, ?)")
            .bind(&group.id)
            .bind(&group.name)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    pub async fn find_group(&self, id: &str) -> ArkiveResult<Option<Group>> {
        let row = sqlx::query("SELECT id, name FROM groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(|row| Group {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    pub async fn find_group_by_name(&self, name: &str) -> ArkiveResult<Option<Group>> {
        let row = sqlx::query("SELECT id, name FROM groups WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(|row| Group {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    pub async fn add_group_member(&self, group_id: &str, user_id: &str) -> ArkiveResult<()> {
        sqlx::query("INSERT OR IGNORE INTO group_members (group_id, user_id) VALUES (?, ?)")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    pub async fn list_groups(&self) -> ArkiveResult<Vec<Group>> {
        let rows = sqlx::query("SELECT id, name FROM groups ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(rows
            .iter()
            .map(|row| Group {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    pub async fn group_members(&self, group_id: &str) -> ArkiveResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.username, u.name
            FROM users u
            JOIN group_members gm ON u.id = gm.user_id
            WHERE gm.group_id = ?
            ORDER BY u.username ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .iter()
            .map(|row| User {
                id: row.get("id"),
                username: row.get("username"),
                name: row.get("name"),
            })
            .collect())
    }

    // ---- nodes ----

    pub async fn create_node(&self, node: &Node) -> ArkiveResult<()> {
        sqlx::query(
            r#"
            INSERT INTO nodes (id, name, parent_id, owner_user_id, owner_group_id, permissions)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&node.id)
        .bind(&node.name)
        .bind(&node.parent_id)
        .bind(&node.owner_user_id)
        .bind(&node.owner_group_id)
        .bind(node.permissions as i64)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    pub async fn rename_node(&self, id: &str, name: &str) -> ArkiveResult<()> {
        let result = sqlx::query("UPDATE nodes SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(ArkiveError::not_found("node"));
        }
        Ok(())
    }

    pub async fn set_node_permissions(&self, id: &str, permissions: u32) -> ArkiveResult<()> {
        let result = sqlx::query("UPDATE nodes SET permissions = ? WHERE id = ?")
            .bind(permissions as i64)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(ArkiveError::not_found("node"));
        }
        Ok(())
    }

    /// Delete a node and everything below it: descendant nodes, their
    /// files and their metadata, all in one transaction.
    pub async fn delete_node_tree(&self, id: &str) -> ArkiveResult<()> {
        let rows = sqlx::query(
            r#"
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM nodes WHERE id = ?
                UNION ALL
                SELECT n.id FROM nodes n JOIN subtree s ON n.parent_id = s.id
            )
            SELECT id FROM subtree
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        if rows.is_empty() {
            return Err(ArkiveError::not_found("node"));
        }

        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        for row in &rows {
            let node_id: String = row.get("id");
            sqlx::query(
                "DELETE FROM metadata WHERE file_id IN (SELECT id FROM files WHERE node_id = ?)",
            )
            .bind(&node_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

            sqlx::query("DELETE FROM files WHERE node_id = ?")
                .bind(&node_id)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;

            sqlx::query("DELETE FROM nodes WHERE id = ?")
                .bind(&node_id)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }
        tx.commit().await.map_err(storage_error)?;

        info!("deleted node {} and {} descendants", id, rows.len() - 1);
        Ok(())
    }

    // ---- files and metadata ----

    pub async fn save_file(
        &self,
        node_id: &str,
        name: &str,
        size: i64,
        content_type: &str,
        data: Vec<u8>,
        metadata: Vec<FileMetadata>,
    ) -> ArkiveResult<FileEntry> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        sqlx::query(
            r#"
            INSERT INTO files (id, node_id, name, size, content_type, created_at, file_data)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(node_id)
        .bind(name)
        .bind(size)
        .bind(content_type)
        .bind(created_at.to_rfc3339())
        .bind(&data)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        for meta in &metadata {
            sqlx::query("INSERT INTO metadata (file_id, key, value) VALUES (?, ?, ?)")
                .bind(&id)
                .bind(&meta.key)
                .bind(&meta.value)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }
        tx.commit().await.map_err(storage_error)?;

        Ok(FileEntry {
            id,
            node_id: node_id.to_string(),
            name: name.to_string(),
            size,
            content_type: content_type.to_string(),
            created_at,
            file_data: None,
            metadata,
        })
    }

    /// Node a file belongs to; the permission gate runs against this
    /// before the file itself is fetched.
    pub async fn find_file_node(&self, file_id: &str) -> ArkiveResult<Option<NodeId>> {
        let row = sqlx::query("SELECT node_id FROM files WHERE id = ?")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(|row| row.get("node_id")))
    }

    pub async fn find_file(&self, id: &str, with_data: bool) -> ArkiveResult<Option<FileEntry>> {
        let columns = if with_data {
            "id, node_id, name, size, content_type, created_at, file_data"
        } else {
            "id, node_id, name, size, content_type, created_at, NULL AS file_data"
        };

        let row = sqlx::query(&format!("SELECT {} FROM files WHERE id = ?", columns))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at: String = row.get("created_at");
        let created_at: DateTime<Utc> = created_at
            .parse()
            .map_err(|e| ArkiveError::dependency(format!("bad timestamp in files table: {}", e)))?;

        let file_data: Option<Vec<u8>> = row.get("file_data");

        let mut entry = FileEntry {
            id: row.get("id"),
            node_id: row.get("node_id"),
            name: row.get("name"),
            size: row.get("size"),
            content_type: row.get("content_type"),
            created_at,
            file_data: file_data.map(|data| BASE64.encode(data)),
            metadata: Vec::new(),
        };
        entry.metadata = self.file_metadata(&entry.id).await?;

        Ok(Some(entry))
    }

    async fn file_metadata(&self, file_id: &str) -> ArkiveResult<Vec<FileMetadata>> {
        let rows = sqlx::query("SELECT key, value FROM metadata WHERE file_id = ?")
            .bind(file_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(rows
            .iter()
            .map(|row| FileMetadata {
                key: row.get("key"),
                value: row.get("value"),
            })
            .collect())
    }

    pub async fn delete_file(&self, id: &str) -> ArkiveResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("DELETE FROM metadata WHERE file_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(ArkiveError::not_found("file"));
        }
        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }

    /// Replace every metadata entry of a file in one transaction.
    pub async fn replace_file_metadata(
        &self,
        file_id: &str,
        entries: &[FileMetadata],
    ) -> ArkiveResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("DELETE FROM metadata WHERE file_id = ?")
            .bind(file_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        for meta in entries {
            sqlx::query("INSERT INTO metadata (file_id, key, value) VALUES (?, ?, ?)")
                .bind(file_id)
                .bind(&meta.key)
                .bind(&meta.value)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }

    /// Delete the named metadata keys of a file in one transaction.
    pub async fn delete_file_metadata(&self, file_id: &str, keys: &[String]) -> ArkiveResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        for key in keys {
            sqlx::query("DELETE FROM metadata WHERE file_id = ? AND key = ?")
                .bind(file_id)
                .bind(key)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }
}

#[async_trait]
impl ArchiveStore for SqliteStore {
    async fn find_node(&self, id: &str) -> ArkiveResult<Option<Node>> {
        let row = sqlx::query(
            "SELECT id, name, parent_id, owner_user_id, owner_group_id, permissions \
             FROM nodes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(|row| node_from_row(&row)))
    }

    async fn find_node_parent(&self, id: &str) -> ArkiveResult<Option<NodeId>> {
        let row = sqlx::query("SELECT parent_id FROM nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.and_then(|row| row.get::<Option<String>, _>("parent_id")))
    }

    async fn update_node_parent(&self, id: &str, new_parent: Option<&str>) -> ArkiveResult<()> {
        let result = sqlx::query("UPDATE nodes SET parent_id = ? WHERE id = ?")
            .bind(new_parent)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(ArkiveError::not_found("node"));
        }
        Ok(())
    }

    async fn find_node_children(&self, parent: &str) -> ArkiveResult<Vec<Node>> {
        let rows = sqlx::query(
            "SELECT id, name, parent_id, owner_user_id, owner_group_id, permissions \
             FROM nodes WHERE parent_id = ? ORDER BY name ASC",
        )
        .bind(parent)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.iter().map(node_from_row).collect())
    }

    async fn find_node_ownership(&self, id: &str) -> ArkiveResult<Option<NodeOwnership>> {
        let row = sqlx::query(
            "SELECT owner_user_id, owner_group_id, permissions FROM nodes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(|row| NodeOwnership {
            owner_user_id: row.get("owner_user_id"),
            owner_group_id: row.get("owner_group_id"),
            permissions: row.get::<i64, _>("permissions") as u32,
        }))
    }

    async fn find_user_groups(&self, user: &str) -> ArkiveResult<Vec<Group>> {
        let rows = sqlx::query(
            r#"
            SELECT g.id, g.name
            FROM groups g
            JOIN group_members gm ON g.id = gm.group_id
            WHERE gm.user_id = ?
            ORDER BY g.name ASC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .iter()
            .map(|row| Group {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn is_member_of_group_named(&self, user: &str, name: &str) -> ArkiveResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM group_members gm
                JOIN groups g ON gm.group_id = g.id
                WHERE gm.user_id = ? AND g.name = ?
            ) AS present
            "#,
        )
        .bind(user)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.get::<i64, _>("present") != 0)
    }
}
