//! Entry reads and writes within one generation.
//!
//! Entries are keyed by request identity (method + URL). Every write
//! replaces the whole stored response.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::message::{Request, Response, strip_search};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// Lookup options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Compare URLs without their query string.
    pub ignore_search: bool,
}

/// Metadata for one stored entry, without the body.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub generation: String,
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body_len: u64,
    pub stored_at: String,
}

/// Handle to one named generation.
#[derive(Debug, Clone)]
pub struct GenerationCache {
    db: CacheDb,
    name: String,
}

/// Row shape prepared outside the connection thread.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    url_no_search: String,
    status_code: u16,
    headers_json: String,
    body: Vec<u8>,
    response_url: Option<String>,
}

/// Raw stored response as read back from SQLite.
struct StoredResponse {
    status_code: u16,
    headers_json: String,
    body: Vec<u8>,
    response_url: Option<String>,
}

impl StoredResponse {
    fn into_response(self) -> Result<Response, Error> {
        let headers: Vec<(String, String)> =
            serde_json::from_str(&self.headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let url = self
            .response_url
            .map(|u| Url::parse(&u).map_err(|e| Error::CorruptEntry(e.to_string())))
            .transpose()?;
        Ok(Response { status: self.status_code, headers, body: self.body.into(), url })
    }
}

fn read_stored(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredResponse> {
    Ok(StoredResponse { status_code: row.get(0)?, headers_json: row.get(1)?, body: row.get(2)?, response_url: row.get(3)? })
}

impl GenerationCache {
    pub(crate) fn new(db: CacheDb, name: String) -> Self {
        Self { db, name }
    }

    /// The generation name this handle writes to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the stored response for a request.
    ///
    /// Only GET requests can match.
    pub async fn match_request(&self, request: &Request, opts: MatchOptions) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        self.match_url(&request.url, opts).await
    }

    /// Look up the stored GET response for a URL.
    ///
    /// With `ignore_search`, the earliest stored entry whose URL matches
    /// without the query string wins.
    pub async fn match_url(&self, url: &Url, opts: MatchOptions) -> Result<Option<Response>, Error> {
        let generation = self.name.clone();
        let (sql, key) = if opts.ignore_search {
            (
                "SELECT status_code, headers_json, body, response_url FROM entries
                 WHERE generation = ?1 AND method = 'GET' AND url_no_search = ?2
                 ORDER BY rowid ASC LIMIT 1",
                strip_search(url).to_string(),
            )
        } else {
            (
                "SELECT status_code, headers_json, body, response_url FROM entries
                 WHERE generation = ?1 AND key_hash = ?2",
                compute_cache_key("GET", url.as_str()),
            )
        };

        let stored = self
            .db
            .conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                match conn.query_row(sql, params![generation, key], read_stored) {
                    Ok(s) => Ok(Some(s)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        stored.map(StoredResponse::into_response).transpose()
    }

    /// Store a response for a request, replacing any previous entry.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_all(&[(request.clone(), response.clone())]).await
    }

    /// Store several responses in one transaction.
    ///
    /// Either every pair is written or none is.
    pub async fn put_all(&self, pairs: &[(Request, Response)]) -> Result<(), Error> {
        let rows = pairs
            .iter()
            .map(|(req, resp)| entry_row(req, resp))
            .collect::<Result<Vec<_>, _>>()?;
        let generation = self.name.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO entries (
                            generation, key_hash, method, url, url_no_search,
                            status_code, headers_json, body, response_url, stored_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                        ON CONFLICT(generation, key_hash) DO UPDATE SET
                            method = excluded.method,
                            url = excluded.url,
                            url_no_search = excluded.url_no_search,
                            status_code = excluded.status_code,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            response_url = excluded.response_url,
                            stored_at = excluded.stored_at",
                    )?;
                    for row in &rows {
                        stmt.execute(params![
                            &generation,
                            &row.key_hash,
                            &row.method,
                            &row.url,
                            &row.url_no_search,
                            row.status_code,
                            &row.headers_json,
                            &row.body,
                            &row.response_url,
                            &stored_at,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(generation = %self.name, count = pairs.len(), "stored cache entries");
        Ok(())
    }

    /// Metadata for every entry in this generation, in storage order.
    pub async fn entries(&self) -> Result<Vec<EntryMeta>, Error> {
        let generation = self.name.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<(String, String, u16, String, i64, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status_code, headers_json, length(body), stored_at
                     FROM entries WHERE generation = ?1 ORDER BY rowid ASC",
                )?;
                let rows = stmt
                    .query_map(params![generation], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(method, url, status_code, headers_json, body_len, stored_at)| {
                let headers: Vec<(String, String)> =
                    serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                let content_type = headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                    .map(|(_, v)| v.clone());
                Ok(EntryMeta {
                    generation: self.name.clone(),
                    method,
                    url,
                    status_code,
                    content_type,
                    body_len: body_len as u64,
                    stored_at,
                })
            })
            .collect()
    }
}

fn entry_row(request: &Request, response: &Response) -> Result<EntryRow, Error> {
    if !request.is_get() {
        return Err(Error::InvalidInput(format!("only GET requests can be cached, got {}", request.method)));
    }
    if response.status == 206 {
        return Err(Error::InvalidInput(format!("partial response for {} cannot be cached", request.url)));
    }

    let headers_json =
        serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(format!("bad headers: {e}")))?;

    Ok(EntryRow {
        key_hash: compute_cache_key(&request.method, request.url.as_str()),
        method: request.method.clone(),
        url: request.url.to_string(),
        url_no_search: request.url_without_search().to_string(),
        status_code: response.status,
        headers_json,
        body: response.body.to_vec(),
        response_url: response.url.as_ref().map(Url::to_string),
    })
}
