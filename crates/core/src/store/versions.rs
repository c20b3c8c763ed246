//! Store generation management.
//!
//! A generation is created on first open and exists until deleted; stale
//! generations linger until the activation sweep removes them.

use super::connection::StoreDb;
use super::entries::VersionStore;
use crate::Error;
use tokio_rusqlite::params;

impl StoreDb {
    /// Open the store generation for a version tag, creating it if needed.
    ///
    /// Idempotent: opening an already-open version returns a handle over
    /// the same rows.
    pub async fn open_version(&self, version: &str) -> Result<VersionStore, Error> {
        let tag = version.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO store_versions (version, created_at) VALUES (?1, ?2)",
                    params![tag, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(VersionStore { db: self.clone(), version: version.to_string() })
    }

    /// Enumerate every version tag ever created, stale ones included.
    pub async fn list_versions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT version FROM store_versions ORDER BY created_at")?;
                let tags = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(tags)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store generation and all its entries.
    ///
    /// No-op when the tag is absent. Returns the number of entries removed.
    pub async fn delete_version(&self, version: &str) -> Result<u64, Error> {
        let tag = version.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let removed = conn.execute("DELETE FROM entries WHERE version = ?1", params![tag])?;
                conn.execute("DELETE FROM store_versions WHERE version = ?1", params![tag])?;
                Ok(removed as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::entries::StoredResponse;

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.open_version("v1").await.unwrap();
        db.open_version("v1").await.unwrap();

        assert_eq!(db.list_versions().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_list_includes_stale_versions() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.open_version("v1").await.unwrap();
        db.open_version("v2").await.unwrap();

        let tags = db.list_versions().await.unwrap();
        assert_eq!(tags, vec!["v1".to_string(), "v2".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_removes_entries() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let store = db.open_version("v1").await.unwrap();
        let response = StoredResponse::new("GET", "https://example.com/", 200, vec![], b"hello".to_vec());
        store.put("k1", &response).await.unwrap();

        let removed = db.delete_version("v1").await.unwrap();
        assert_eq!(removed, 1);
        assert!(db.list_versions().await.unwrap().is_empty());

        // Reopening after delete starts empty.
        let store = db.open_version("v1").await.unwrap();
        assert!(store.lookup("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let removed = db.delete_version("never-created").await.unwrap();
        assert_eq!(removed, 0);
    }
}
