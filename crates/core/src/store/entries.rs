//! Entry CRUD operations for a single store generation.
//!
//! A [`VersionStore`] is a handle scoped to one version tag; every read and
//! write it performs is namespaced to that tag.

use super::connection::StoreDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// An immutable snapshot of a successful response.
///
/// Captured at the moment it was written; updates are always whole-row
/// overwrites, never partial edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredResponse {
    /// Build a snapshot stamped with the current time.
    pub fn new(method: &str, url: &str, status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            status,
            headers,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A store handle scoped to one version tag.
///
/// Obtained from [`StoreDb::open_version`]; cloning shares the underlying
/// connection, so handles are cheap to move into background write tasks.
#[derive(Clone, Debug)]
pub struct VersionStore {
    pub(crate) db: StoreDb,
    pub(crate) version: String,
}

impl VersionStore {
    /// The version tag this handle is scoped to.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Insert or overwrite a snapshot under the given key.
    ///
    /// Uses UPSERT semantics: overwriting an existing key is silent and
    /// replaces the whole row.
    pub async fn put(&self, key: &str, response: &StoredResponse) -> Result<(), Error> {
        let version = self.version.clone();
        let key = key.to_string();
        let response = response.clone();
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        version, key, method, url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(version, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        version,
                        key,
                        &response.method,
                        &response.url,
                        response.status as i64,
                        headers_json,
                        &response.body,
                        &response.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a snapshot by key.
    ///
    /// Returns None if the key doesn't exist under this version.
    pub async fn lookup(&self, key: &str) -> Result<Option<StoredResponse>, Error> {
        let version = self.version.clone();
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, headers_json, body, stored_at
                     FROM entries WHERE version = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![version, key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                });

                match result {
                    Ok((method, url, status, headers_json, body, stored_at)) => {
                        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::CorruptEntry(e.to_string()))?;
                        Ok(Some(StoredResponse {
                            method,
                            url,
                            status: status as u16,
                            headers,
                            body,
                            stored_at,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored under this version.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        let version = self.version.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE version = ?1",
                    params![version],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::key::compute_request_key;

    fn make_response(url: &str, body: &[u8]) -> StoredResponse {
        StoredResponse::new(
            "GET",
            url,
            200,
            vec![("content-type".to_string(), "text/css".to_string())],
            body.to_vec(),
        )
    }

    #[tokio::test]
    async fn test_put_and_lookup_round_trip() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let store = db.open_version("v1").await.unwrap();
        let response = make_response("https://example.com/app.css", b"body { margin: 0 }");
        let key = compute_request_key("GET", "https://example.com/app.css");

        store.put(&key, &response).await.unwrap();

        let got = store.lookup(&key).await.unwrap().unwrap();
        assert_eq!(got.status, response.status);
        assert_eq!(got.headers, response.headers);
        assert_eq!(got.body, response.body);
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let store = db.open_version("v1").await.unwrap();
        let got = store.lookup("nonexistent").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let store = db.open_version("v1").await.unwrap();
        let key = compute_request_key("GET", "https://example.com/app.css");

        store
            .put(&key, &make_response("https://example.com/app.css", b"old"))
            .await
            .unwrap();
        store
            .put(&key, &make_response("https://example.com/app.css", b"new"))
            .await
            .unwrap();

        let got = store.lookup(&key).await.unwrap().unwrap();
        assert_eq!(got.body, b"new");
        assert_eq!(store.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_versions_are_isolated() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let v1 = db.open_version("v1").await.unwrap();
        let v2 = db.open_version("v2").await.unwrap();
        let key = compute_request_key("GET", "https://example.com/");

        v1.put(&key, &make_response("https://example.com/", b"one"))
            .await
            .unwrap();

        assert!(v1.lookup(&key).await.unwrap().is_some());
        assert!(v2.lookup(&key).await.unwrap().is_none());
    }
}
