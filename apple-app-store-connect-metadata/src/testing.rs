//! In-memory stand-in for the App Store Connect endpoints `run` touches.

use std::sync::{Mutex, MutexGuard};

use apple_app_store_connect_api_client::{Method, RequestError, Requester};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
struct Row {
    parent_id: String,
    kind: &'static str,
    id: String,
    attributes: Map<String, Value>,
}

impl Row {
    fn to_value(&self) -> Value {
        json!({"type": self.kind, "id": self.id, "attributes": self.attributes})
    }
}

#[derive(Debug, Default)]
pub struct FakeStore {
    versions: Vec<Row>,
    version_localizations: Vec<Row>,
    app_infos: Vec<Row>,
    app_info_localizations: Vec<Row>,
    reject_creates: bool,
    corrupt_creates: bool,
    fail_category: bool,
    next_id: usize,
    pub category: Option<String>,
    pub calls: Vec<(Method, String, Option<Value>)>,
    pub created: Vec<(String, String)>,
}

impl FakeStore {
    pub const APP_ID: &'static str = "6741234567";
    pub const VERSION_ID: &'static str = "version-1";
    pub const APP_INFO_ID: &'static str = "info-2";
    pub const EN_VERSION_LOC_ID: &'static str = "vloc-en";
    pub const JA_VERSION_LOC_ID: &'static str = "vloc-ja";
    pub const EN_INFO_LOC_ID: &'static str = "iloc-en";
    pub const JA_INFO_LOC_ID: &'static str = "iloc-ja";

    /// One version in `state`, one live app info and one editable app info.
    pub fn new(state: &str) -> Self {
        let mut store = Self::default();
        store.versions.push(Row {
            parent_id: Self::APP_ID.to_owned(),
            kind: "appStoreVersions",
            id: Self::VERSION_ID.to_owned(),
            attributes: attributes(json!({"appStoreState": state, "versionString": "1.0"})),
        });
        store.app_infos.push(Row {
            parent_id: Self::APP_ID.to_owned(),
            kind: "appInfos",
            id: "info-1".to_owned(),
            attributes: attributes(json!({"appStoreState": "READY_FOR_SALE"})),
        });
        store.app_infos.push(Row {
            parent_id: Self::APP_ID.to_owned(),
            kind: "appInfos",
            id: Self::APP_INFO_ID.to_owned(),
            attributes: attributes(json!({"appStoreState": "PREPARE_FOR_SUBMISSION"})),
        });
        store
    }

    pub fn with_en_us(mut self) -> Self {
        self.version_localizations.push(Row {
            parent_id: Self::VERSION_ID.to_owned(),
            kind: "appStoreVersionLocalizations",
            id: Self::EN_VERSION_LOC_ID.to_owned(),
            attributes: attributes(json!({
                "locale": "en-US",
                "description": "English description",
                "keywords": null,
                "supportUrl": null
            })),
        });
        self.app_info_localizations.push(Row {
            parent_id: Self::APP_INFO_ID.to_owned(),
            kind: "appInfoLocalizations",
            id: Self::EN_INFO_LOC_ID.to_owned(),
            attributes: attributes(json!({"locale": "en-US", "name": "Daimoku Counter"})),
        });
        self
    }

    pub fn with_ja(mut self) -> Self {
        self.version_localizations.push(Row {
            parent_id: Self::VERSION_ID.to_owned(),
            kind: "appStoreVersionLocalizations",
            id: Self::JA_VERSION_LOC_ID.to_owned(),
            attributes: attributes(json!({"locale": "ja"})),
        });
        self.app_info_localizations.push(Row {
            parent_id: Self::APP_INFO_ID.to_owned(),
            kind: "appInfoLocalizations",
            id: Self::JA_INFO_LOC_ID.to_owned(),
            attributes: attributes(json!({"locale": "ja", "name": "題目カウンター"})),
        });
        self
    }

    pub fn without_versions(mut self) -> Self {
        self.versions.clear();
        self
    }

    pub fn rejecting_creates(mut self) -> Self {
        self.reject_creates = true;
        self
    }

    pub fn corrupting_creates(mut self) -> Self {
        self.corrupt_creates = true;
        self
    }

    pub fn failing_category(mut self) -> Self {
        self.fail_category = true;
        self
    }

    fn handle(
        &mut self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, RequestError> {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        match (method.as_str(), segments.as_slice()) {
            ("GET", ["apps", app_id, "appStoreVersions"]) => {
                let states: Vec<&str> = query
                    .strip_prefix("filter[appStoreState]=")
                    .map(|s| s.split(',').collect())
                    .unwrap_or_default();
                let data: Vec<Value> = self
                    .versions
                    .iter()
                    .filter(|r| r.parent_id == *app_id)
                    .filter(|r| {
                        states.is_empty()
                            || r.attributes["appStoreState"]
                                .as_str()
                                .map(|s| states.contains(&s))
                                .unwrap_or(false)
                    })
                    .map(Row::to_value)
                    .collect();
                Ok(Some(json!({ "data": data })))
            }
            ("GET", ["apps", app_id, "appInfos"]) => Ok(Some(list(&self.app_infos, app_id))),
            ("GET", ["appStoreVersions", id, "appStoreVersionLocalizations"]) => {
                Ok(Some(list(&self.version_localizations, id)))
            }
            ("GET", ["appInfos", id, "appInfoLocalizations"]) => {
                Ok(Some(list(&self.app_info_localizations, id)))
            }
            ("POST", ["appStoreVersionLocalizations"]) => {
                self.create(body, "appStoreVersionLocalizations", "appStoreVersion", "vloc")
            }
            ("POST", ["appInfoLocalizations"]) => {
                self.create(body, "appInfoLocalizations", "appInfo", "iloc")
            }
            ("PATCH", ["appStoreVersionLocalizations", id]) => {
                update(&mut self.version_localizations, id, body)
            }
            ("PATCH", ["appInfoLocalizations", id]) => {
                update(&mut self.app_info_localizations, id, body)
            }
            ("PATCH", ["appInfos", id]) => {
                if self.fail_category {
                    return Err(http(409, "ENTITY_ERROR.RELATIONSHIP.INVALID"));
                }
                let row = self
                    .app_infos
                    .iter()
                    .find(|r| r.id == *id)
                    .ok_or_else(|| http(404, "NOT_FOUND"))?;
                self.category = body
                    .and_then(|b| b["data"]["relationships"]["primaryCategory"]["data"]["id"].as_str())
                    .map(ToOwned::to_owned);
                Ok(Some(json!({ "data": row.to_value() })))
            }
            _ => Err(http(404, "NOT_FOUND")),
        }
    }

    fn create(
        &mut self,
        body: Option<&Value>,
        kind: &'static str,
        relationship: &str,
        id_prefix: &str,
    ) -> Result<Option<Value>, RequestError> {
        if self.reject_creates {
            return Err(http(409, "ENTITY_ERROR.ATTRIBUTE.INVALID.DUPLICATE"));
        }
        if self.corrupt_creates {
            return Err(RequestError::Decode(
                serde_json::from_str::<Value>("{").unwrap_err(),
            ));
        }

        let data = &body.ok_or_else(|| http(400, "PARAMETER_ERROR"))?["data"];
        self.next_id += 1;
        let row = Row {
            parent_id: data["relationships"][relationship]["data"]["id"]
                .as_str()
                .unwrap_or_default()
                .to_owned(),
            kind,
            id: format!("{id_prefix}-{}", self.next_id),
            attributes: data["attributes"].as_object().cloned().unwrap_or_default(),
        };
        let value = row.to_value();
        self.created.push((format!("/{kind}"), row.id.clone()));

        match kind {
            "appStoreVersionLocalizations" => self.version_localizations.push(row),
            _ => self.app_info_localizations.push(row),
        }
        Ok(Some(json!({ "data": value })))
    }
}

fn attributes(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn http(status: u16, code: &str) -> RequestError {
    RequestError::Http {
        status,
        body: json!({"errors": [{"status": status.to_string(), "code": code}]}).to_string(),
    }
}

fn list(rows: &[Row], parent_id: &str) -> Value {
    let data: Vec<Value> = rows
        .iter()
        .filter(|r| r.parent_id == parent_id)
        .map(Row::to_value)
        .collect();
    json!({ "data": data })
}

fn update(rows: &mut [Row], id: &str, body: Option<&Value>) -> Result<Option<Value>, RequestError> {
    let row = rows
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| http(404, "NOT_FOUND"))?;
    if let Some(attributes) = body.and_then(|b| b["data"]["attributes"].as_object()) {
        for (k, v) in attributes {
            row.attributes.insert(k.clone(), v.clone());
        }
    }
    Ok(Some(json!({ "data": row.to_value() })))
}

//
#[derive(Debug)]
pub struct FakeApi {
    store: Mutex<FakeStore>,
}

impl FakeApi {
    pub fn new(store: FakeStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    pub fn store(&self) -> MutexGuard<'_, FakeStore> {
        self.store.lock().unwrap()
    }

    /// Calls whose method matches and whose path contains `fragment`.
    pub fn count(&self, method: &str, fragment: &str) -> usize {
        self.store()
            .calls
            .iter()
            .filter(|(m, p, _)| m.as_str() == method && p.contains(fragment))
            .count()
    }

    pub fn last_body(&self, method: &str, path: &str) -> Option<Value> {
        self.store()
            .calls
            .iter()
            .rev()
            .find(|(m, p, _)| m.as_str() == method && p == path)
            .and_then(|(_, _, body)| body.clone())
    }

    pub fn last_created_id(&self, path: &str) -> Option<String> {
        self.store()
            .created
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, id)| id.clone())
    }
}

#[async_trait]
impl Requester for FakeApi {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>, RequestError> {
        let mut store = self.store();
        store
            .calls
            .push((method.clone(), path.to_owned(), body.cloned()));
        store.handle(&method, path, body)
    }
}
