// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory remote service for unit tests.

use crate::dns::DnsDomain;
use crate::errors::ApiError;
use crate::remote::RemoteApi;
use crate::resource::{ResourceKind, Scope};
use crate::sonar::RuntimeStatus;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

type CollectionKey = (ResourceKind, Option<i64>);

fn key(kind: ResourceKind, scope: &Scope) -> CollectionKey {
    match scope {
        Scope::Account => (kind, None),
        Scope::Domain { id, .. } => (kind, Some(*id)),
    }
}

/// Stateful fake recording every mutating call as `"<phase> <kind> <id|name>"`.
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    store: Mutex<HashMap<CollectionKey, Vec<Value>>>,
    domains: Vec<DnsDomain>,
    next_id: AtomicI64,
    fail_on: Option<String>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            store: Mutex::new(HashMap::new()),
            domains: Vec::new(),
            next_id: AtomicI64::new(100),
            fail_on: None,
        }
    }

    /// Fail the call rendered as `call`; earlier calls succeed.
    pub fn failing_on(call: &str) -> Self {
        Self {
            fail_on: Some(call.to_string()),
            ..Self::new()
        }
    }

    pub fn with_domain(mut self, id: i64, name: &str) -> Self {
        self.domains.push(DnsDomain {
            id,
            name: name.to_string(),
            ..DnsDomain::default()
        });
        self
    }

    pub fn seed(&self, kind: ResourceKind, scope: &Scope, items: Vec<Value>) {
        self.store.lock().unwrap().insert(key(kind, scope), items);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn items(&self, kind: ResourceKind, scope: &Scope) -> Vec<Value> {
        self.store
            .lock()
            .unwrap()
            .get(&key(kind, scope))
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail_on.as_deref() == Some(call.as_str()) {
            return Err(ApiError::UnexpectedStatus {
                method: "POST".to_string(),
                url: "https://api.test/".to_string(),
                status: 400,
                body: r#"{"errors":["rejected"]}"#.to_string(),
            });
        }
        Ok(())
    }
}

fn parse(payload: &[u8]) -> Map<String, Value> {
    serde_json::from_slice(payload).unwrap()
}

#[async_trait]
impl RemoteApi for FakeApi {
    async fn fetch_collection(
        &self,
        kind: ResourceKind,
        scope: &Scope,
    ) -> Result<Vec<Value>, ApiError> {
        Ok(self.items(kind, scope))
    }

    async fn create(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        payload: &[u8],
    ) -> Result<(), ApiError> {
        let mut item = parse(payload);
        let name = item
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.record(format!("create {kind} {name}"))?;

        item.insert(
            "id".to_string(),
            Value::from(self.next_id.fetch_add(1, Ordering::SeqCst)),
        );
        self.store
            .lock()
            .unwrap()
            .entry(key(kind, scope))
            .or_default()
            .push(Value::Object(item));
        Ok(())
    }

    async fn update(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        id: i64,
        payload: &[u8],
    ) -> Result<(), ApiError> {
        self.record(format!("update {kind} {id}"))?;

        let mut store = self.store.lock().unwrap();
        let items = store.entry(key(kind, scope)).or_default();
        if let Some(Value::Object(item)) = items
            .iter_mut()
            .find(|item| item.get("id").and_then(Value::as_i64) == Some(id))
        {
            item.extend(parse(payload));
        }
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, scope: &Scope, id: i64) -> Result<(), ApiError> {
        self.record(format!("delete {kind} {id}"))?;

        self.store
            .lock()
            .unwrap()
            .entry(key(kind, scope))
            .or_default()
            .retain(|item| item.get("id").and_then(Value::as_i64) != Some(id));
        Ok(())
    }

    async fn fetch_status(&self, _kind: ResourceKind, _id: i64) -> Result<RuntimeStatus, ApiError> {
        Ok(RuntimeStatus::Up)
    }

    async fn fetch_domains(&self) -> Result<Vec<DnsDomain>, ApiError> {
        Ok(self.domains.clone())
    }
}
