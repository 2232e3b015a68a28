//! Generation stores: named request → response collections.
//!
//! A [`Store`] is a handle scoped to one generation name. The `stores` row is
//! created by the first write, so opening a handle never leaves an empty
//! generation behind.

use std::collections::BTreeMap;

use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};
use url::Url;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::http::{Request, Response, ResponseType};

/// Summary of a stored generation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub entries: u64,
    pub created_at: String,
}

/// Metadata of one stored entry, without its body.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub response_type: String,
    pub content_type: Option<String>,
    pub body_bytes: u64,
    pub stored_at: String,
}

/// Fully read entry ready to be written in a single statement.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    response_type: &'static str,
    response_url: Option<String>,
    headers_json: String,
    body: Bytes,
}

impl EntryRow {
    /// Consume the response body; fails for non-GET requests.
    fn build(request: &Request, mut response: Response) -> Result<Self, Error> {
        if request.method != "GET" {
            return Err(Error::UnsupportedMethod(request.method.clone()));
        }

        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::CorruptEntry(format!("failed to encode headers: {e}")))?;
        let body = response.body.take()?;
        let mut url = request.url.clone();
        url.set_fragment(None);

        Ok(Self {
            key_hash: compute_cache_key(&request.method, &request.url),
            method: request.method.clone(),
            url: url.to_string(),
            status: response.status,
            status_text: response.status_text,
            response_type: response.response_type.as_str(),
            response_url: response.url.map(|u| u.to_string()),
            headers_json,
            body,
        })
    }
}

const UPSERT_ENTRY: &str = "INSERT INTO entries (
        store_name, key_hash, method, url, status, status_text,
        response_type, response_url, headers_json, body, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(store_name, key_hash) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status = excluded.status,
        status_text = excluded.status_text,
        response_type = excluded.response_type,
        response_url = excluded.response_url,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

fn ensure_store(conn: &rusqlite::Connection, name: &str, now: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO stores (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        params![name, now],
    )?;
    Ok(())
}

fn write_entry(conn: &rusqlite::Connection, store: &str, row: &EntryRow, now: &str) -> Result<(), Error> {
    conn.execute(
        UPSERT_ENTRY,
        params![
            store,
            &row.key_hash,
            &row.method,
            &row.url,
            row.status,
            &row.status_text,
            row.response_type,
            &row.response_url,
            &row.headers_json,
            row.body.as_ref(),
            now,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Handle to the store named `name`. Nothing is written until the first put.
    pub fn open_store(&self, name: &str) -> Store {
        Store { db: self.clone(), name: name.to_string() }
    }

    /// Names of every stored generation, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Every stored generation with its entry count.
    pub async fn list_stores(&self) -> Result<Vec<StoreInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, s.created_at, COUNT(e.key_hash)
                     FROM stores s LEFT JOIN entries e ON e.store_name = s.name
                     GROUP BY s.name ORDER BY s.created_at ASC, s.name ASC",
                )?;
                let stores = stmt
                    .query_map([], |row| {
                        Ok(StoreInfo { name: row.get(0)?, created_at: row.get(1)?, entries: row.get::<_, i64>(2)? as u64 })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stores)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and all its entries.
    ///
    /// Returns false if no such store existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

/// Handle to one generation's entries.
#[derive(Clone, Debug)]
pub struct Store {
    db: CacheDb,
    name: String,
}

impl Store {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the entry matching `request`.
    ///
    /// Non-GET requests never match. Each hit materializes a fresh response
    /// with its own readable body.
    pub async fn get(&self, request: &Request) -> Result<Option<Response>, Error> {
        if request.method != "GET" {
            return Ok(None);
        }
        self.get_by_key(compute_cache_key(&request.method, &request.url)).await
    }

    /// Look up a `GET` entry by URL.
    pub async fn get_url(&self, url: &Url) -> Result<Option<Response>, Error> {
        self.get_by_key(compute_cache_key("GET", url)).await
    }

    async fn get_by_key(&self, key_hash: String) -> Result<Option<Response>, Error> {
        let name = self.name.clone();
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<(u16, String, String, Option<String>, String, Vec<u8>)>, Error> {
                let result = conn.query_row(
                    "SELECT status, status_text, response_type, response_url, headers_json, body
                     FROM entries WHERE store_name = ?1 AND key_hash = ?2",
                    params![name, key_hash],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((status, status_text, response_type, response_url, headers_json, body)) = row else {
            return Ok(None);
        };

        let headers: BTreeMap<String, String> =
            serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let response_type: ResponseType = response_type.parse().map_err(Error::CorruptEntry)?;
        let url = response_url.as_deref().map(Url::parse).transpose().map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Ok(Some(Response {
            status,
            status_text,
            headers,
            response_type,
            url,
            body: Bytes::from(body).into(),
        }))
    }

    /// Store `response` under `request`, replacing any previous entry.
    ///
    /// Consumes the response body; pass a duplicate if the caller still needs it.
    pub async fn put(&self, request: &Request, response: Response) -> Result<(), Error> {
        let row = EntryRow::build(request, response)?;
        let name = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &name, &now)?;
                write_entry(&tx, &name, &row, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store every pair in one transaction.
    ///
    /// Either all entries (and the store itself, if new) are committed or none are.
    pub async fn put_many(&self, entries: Vec<(Request, Response)>) -> Result<(), Error> {
        let rows = entries
            .into_iter()
            .map(|(request, response)| EntryRow::build(&request, response))
            .collect::<Result<Vec<_>, _>>()?;
        let name = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &name, &now)?;
                for row in &rows {
                    write_entry(&tx, &name, row, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Metadata of every entry, ordered by URL.
    pub async fn entries(&self) -> Result<Vec<EntryMeta>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, method, url, status, response_type, headers_json, LENGTH(body), stored_at
                     FROM entries WHERE store_name = ?1 ORDER BY url ASC",
                )?;
                let rows = stmt
                    .query_map(params![name], |row| {
                        let headers_json: String = row.get(5)?;
                        let content_type = serde_json::from_str::<BTreeMap<String, String>>(&headers_json)
                            .ok()
                            .and_then(|h| h.get("content-type").cloned());
                        Ok(EntryMeta {
                            key_hash: row.get(0)?,
                            method: row.get(1)?,
                            url: row.get(2)?,
                            status: row.get(3)?,
                            response_type: row.get(4)?,
                            content_type,
                            body_bytes: row.get::<_, i64>(6)? as u64,
                            stored_at: row.get(7)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }
}
