//! Scripted backends for controller tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;
use wird_core::{CacheStorage, Destination, Error, Request, Response, ResponseSource};

use crate::fetch::Network;

pub(crate) const ORIGIN: &str = "http://localhost:3000";

pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub(crate) fn doc(path: &str) -> Request {
    Request::get(url(path), Destination::Document)
}

pub(crate) fn asset(path: &str, destination: Destination) -> Request {
    Request::get(url(path), destination)
}

#[derive(Clone)]
enum Scripted {
    Respond(u16, Bytes),
    Fail,
    Hang,
}

/// In-process network: answers from a script and records every call.
///
/// Unscripted URLs answer 404.
#[derive(Default)]
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, path: &str, status: u16, body: &str) {
        self.script(path, Scripted::Respond(status, Bytes::copy_from_slice(body.as_bytes())));
    }

    pub(crate) fn fail(&self, path: &str) {
        self.script(path, Scripted::Fail);
    }

    pub(crate) fn hang(&self, path: &str) {
        self.script(path, Scripted::Hang);
    }

    /// Every fetch is rejected while offline.
    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, path: &str) -> usize {
        let target = url(path).to_string();
        self.calls.lock().unwrap().iter().filter(|u| **u == target).count()
    }

    fn script(&self, path: &str, scripted: Scripted) {
        self.routes.lock().unwrap().insert(url(path).to_string(), scripted);
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let key = request.url.to_string();
        self.calls.lock().unwrap().push(key.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{key}: offline")));
        }

        let scripted = self.routes.lock().unwrap().get(&key).cloned();
        match scripted {
            Some(Scripted::Respond(status, body)) => Ok(Response {
                status,
                status_text: if (200..300).contains(&status) { "OK".into() } else { "Error".into() },
                headers: vec![("content-type".into(), "text/html".into())],
                body,
                source: ResponseSource::Network,
            }),
            Some(Scripted::Fail) => Err(Error::Network(format!("{key}: connection refused"))),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Ok(Response {
                status: 404,
                status_text: "Not Found".into(),
                headers: Vec::new(),
                body: Bytes::new(),
                source: ResponseSource::Network,
            }),
        }
    }
}

/// Storage whose every operation fails, as if the quota were exhausted.
pub(crate) struct BrokenStorage;

fn broken() -> Error {
    Error::CorruptEntry("storage unavailable".into())
}

#[async_trait]
impl CacheStorage for BrokenStorage {
    async fn open(&self, _partition: &str) -> Result<(), Error> {
        Err(broken())
    }

    async fn has(&self, _partition: &str) -> Result<bool, Error> {
        Err(broken())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Err(broken())
    }

    async fn delete(&self, _partition: &str) -> Result<bool, Error> {
        Err(broken())
    }

    async fn put(&self, _partition: &str, _request: &Request, _response: &Response) -> Result<(), Error> {
        Err(broken())
    }

    async fn put_batch(&self, _partition: &str, _entries: &[(Request, Response)]) -> Result<(), Error> {
        Err(broken())
    }

    async fn match_in(&self, _partition: &str, _request: &Request) -> Result<Option<Response>, Error> {
        Err(broken())
    }

    async fn match_any(&self, _request: &Request) -> Result<Option<Response>, Error> {
        Err(broken())
    }

    async fn entry_urls(&self, _partition: &str) -> Result<Vec<String>, Error> {
        Err(broken())
    }

    async fn partition_size(&self, _partition: &str) -> Result<u64, Error> {
        Err(broken())
    }
}
