//! Partition and entry operations on the SQLite cache.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use super::storage::CacheStorage;
use crate::Error;
use crate::http::{Request, Response, ResponseSource};

/// An entry ready to be written, owned so it can move onto the database thread.
struct NewEntry {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl NewEntry {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        let mut url = request.url.clone();
        url.set_fragment(None);
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Ok(Self {
            key_hash: request.cache_key(),
            method: request.method.to_ascii_uppercase(),
            url: url.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers_json,
            body: response.body.to_vec(),
        })
    }
}

/// Raw columns of a stored entry: status, status text, headers JSON, body.
type EntryRow = (u16, String, String, Vec<u8>);

fn decode(row: EntryRow) -> Result<Response, Error> {
    let (status, status_text, headers_json, body) = row;
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;

    Ok(Response { status, status_text, headers, body: Bytes::from(body), source: ResponseSource::Cache })
}

fn ensure_partition(conn: &rusqlite::Connection, partition: &str, now: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
        params![partition, now],
    )?;
    Ok(())
}

fn insert_entry(conn: &rusqlite::Connection, partition: &str, entry: &NewEntry, now: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO entries (
            partition, key_hash, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(partition, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            partition,
            &entry.key_hash,
            &entry.method,
            &entry.url,
            entry.status,
            &entry.status_text,
            &entry.headers_json,
            &entry.body,
            now,
        ],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, partition: &str) -> Result<(), Error> {
        let partition = partition.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_partition(conn, &partition, &now)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, partition: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![partition],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, partition: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM partitions WHERE name = ?1", params![partition])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let partition = partition.to_string();
        let entry = NewEntry::new(request, response)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_partition(&tx, &partition, &now)?;
                insert_entry(&tx, &partition, &entry, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_batch(&self, partition: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let partition = partition.to_string();
        let entries = entries
            .iter()
            .map(|(req, resp)| NewEntry::new(req, resp))
            .collect::<Result<Vec<_>, _>>()?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_partition(&tx, &partition, &now)?;
                for entry in &entries {
                    insert_entry(&tx, &partition, entry, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, partition: &str, request: &Request) -> Result<Option<Response>, Error> {
        let partition = partition.to_string();
        let key_hash = request.cache_key();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    "SELECT status, status_text, headers_json, body FROM entries
                    WHERE partition = ?1 AND key_hash = ?2",
                    params![partition, key_hash],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(decode).transpose()
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key_hash = request.cache_key();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    "SELECT e.status, e.status_text, e.headers_json, e.body
                    FROM entries e JOIN partitions p ON p.name = e.partition
                    WHERE e.key_hash = ?1
                    ORDER BY p.rowid ASC
                    LIMIT 1",
                    params![key_hash],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(decode).transpose()
    }

    async fn entry_urls(&self, partition: &str) -> Result<Vec<String>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE partition = ?1 ORDER BY url ASC")?;
                let urls = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    async fn partition_size(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let size: i64 = conn.query_row(
                    "SELECT COALESCE(SUM(LENGTH(body)), 0) FROM entries WHERE partition = ?1",
                    params![partition],
                    |row| row.get(0),
                )?;
                Ok(size as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Destination;
    use url::Url;

    fn request(path: &str) -> Request {
        let url = Url::parse("http://localhost:3000").unwrap().join(path).unwrap();
        Request::get(url, Destination::Document)
    }

    fn response(body: &str) -> Response {
        Response {
            status: 200,
            status_text: "OK".into(),
            headers: vec![("content-type".into(), "text/html".into())],
            body: Bytes::copy_from_slice(body.as_bytes()),
            source: ResponseSource::Network,
        }
    }

    #[tokio::test]
    async fn test_put_and_match_in() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("static-v2", &request("/"), &response("<html>shell</html>"))
            .await
            .unwrap();

        let hit = db.match_in("static-v2", &request("/")).await.unwrap().unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(hit.body, Bytes::from_static(b"<html>shell</html>"));
        assert_eq!(hit.content_type(), Some("text/html"));
        assert_eq!(hit.source, ResponseSource::Cache);

        assert!(db.match_in("dynamic-v2", &request("/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_creates_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.has("dynamic-v2").await.unwrap());
        db.put("dynamic-v2", &request("/share"), &response("share")).await.unwrap();
        assert!(db.has("dynamic-v2").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("dynamic-v2", &request("/search"), &response("first")).await.unwrap();
        db.put("dynamic-v2", &request("/search"), &response("second")).await.unwrap();

        let urls = db.entry_urls("dynamic-v2").await.unwrap();
        assert_eq!(urls, vec!["http://localhost:3000/search".to_string()]);

        let hit = db.match_in("dynamic-v2", &request("/search")).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("static-v2").await.unwrap();
        db.put("dynamic-v2", &request("/"), &response("dynamic")).await.unwrap();
        db.put("static-v2", &request("/"), &response("static")).await.unwrap();

        let hit = db.match_any(&request("/")).await.unwrap().unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"static"));
    }

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("static-v1").await.unwrap();
        db.open("dynamic-v1").await.unwrap();
        db.open("static-v1").await.unwrap();

        assert_eq!(db.keys().await.unwrap(), vec!["static-v1".to_string(), "dynamic-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("static-v1", &request("/"), &response("old")).await.unwrap();

        assert!(db.delete("static-v1").await.unwrap());
        assert!(!db.delete("static-v1").await.unwrap());
        assert!(db.match_any(&request("/")).await.unwrap().is_none());
        assert!(db.entry_urls("static-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_batch_and_size() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![(request("/"), response("12345")), (request("/manage"), response("678"))];
        db.put_batch("static-v2", &entries).await.unwrap();

        assert_eq!(db.entry_urls("static-v2").await.unwrap().len(), 2);
        assert_eq!(db.partition_size("static-v2").await.unwrap(), 8);
        assert_eq!(db.partition_size("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fragment_not_stored() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("dynamic-v2", &request("/share#today"), &response("share")).await.unwrap();

        let urls = db.entry_urls("dynamic-v2").await.unwrap();
        assert_eq!(urls, vec!["http://localhost:3000/share".to_string()]);
        assert!(db.match_in("dynamic-v2", &request("/share")).await.unwrap().is_some());
    }
}
