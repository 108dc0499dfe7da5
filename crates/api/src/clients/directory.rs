//! Typed clients for the resident and region lookup services.
//!
//! Both services are best-effort enrichments. A missing entry in a
//! lookup result is a normal, typed outcome; transport and decode
//! failures are logged and degrade to the same outcome. They never fail
//! the primary request.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use civica_core::types::DbId;
use serde::Serialize;
use serde_json::Value;

/// Identifying fields of a resident, as returned by the resident service.
#[derive(Debug, Clone, Serialize)]
pub struct ResidentSummary {
    pub id: DbId,
    pub name: String,
    pub region_id: Option<DbId>,
    pub region_name: Option<String>,
}

/// A resident summary plus the raw record, used for verification
/// snapshots.
#[derive(Debug, Clone)]
pub struct ResidentRecord {
    pub summary: ResidentSummary,
    pub record: Value,
}

/// Identifying fields of a region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub id: DbId,
    pub name: String,
}

/// Resident decoration attached to loan and verification payloads.
/// Unresolvable residents get a `Resident #N` placeholder name.
#[derive(Debug, Clone, Serialize)]
pub struct ResidentRef {
    pub id: DbId,
    pub name: String,
    pub region_name: Option<String>,
}

/// Lookup interface over the resident service.
#[async_trait]
pub trait ResidentDirectory: Send + Sync {
    /// Fetch a single resident's full record. `None` covers both an
    /// unknown resident and an unreachable service.
    async fn find_by_id(&self, id: DbId) -> Option<ResidentRecord>;

    /// Fetch summaries for a batch of ids. The map may be partial.
    async fn find_by_ids(&self, ids: &[DbId]) -> HashMap<DbId, ResidentSummary>;
}

/// Lookup interface over the region service.
#[async_trait]
pub trait RegionDirectory: Send + Sync {
    /// Fetch summaries for a batch of ids. The map may be partial.
    async fn find_by_ids(&self, ids: &[DbId]) -> HashMap<DbId, RegionSummary>;
}

/// HTTP client for the resident service's JSON API.
pub struct HttpResidentDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpResidentDirectory {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ResidentDirectory for HttpResidentDirectory {
    async fn find_by_id(&self, id: DbId) -> Option<ResidentRecord> {
        let url = format!("{}/api/residents/{id}", self.base_url);
        let body = fetch_json(&self.client, &url, "resident").await?;
        let resident = body.pointer("/data/resident")?;
        resident_record(resident)
    }

    async fn find_by_ids(&self, ids: &[DbId]) -> HashMap<DbId, ResidentSummary> {
        if ids.is_empty() {
            return HashMap::new();
        }
        let joined = join_ids(ids);
        let url = format!(
            "{}/api/residents?ids={joined}&with_pagination=false",
            self.base_url
        );
        let Some(body) = fetch_json(&self.client, &url, "resident").await else {
            return HashMap::new();
        };

        let mut summaries = HashMap::new();
        if let Some(residents) = body.pointer("/data/residents").and_then(Value::as_array) {
            for resident in residents {
                if let Some(summary) = resident_summary(resident) {
                    summaries.insert(summary.id, summary);
                }
            }
        }
        summaries
    }
}

/// HTTP client for the region service's JSON API.
pub struct HttpRegionDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegionDirectory {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RegionDirectory for HttpRegionDirectory {
    async fn find_by_ids(&self, ids: &[DbId]) -> HashMap<DbId, RegionSummary> {
        if ids.is_empty() {
            return HashMap::new();
        }
        let joined = join_ids(ids);
        let url = format!(
            "{}/api/regions?ids={joined}&with_pagination=false",
            self.base_url
        );
        let Some(body) = fetch_json(&self.client, &url, "region").await else {
            return HashMap::new();
        };

        let mut summaries = HashMap::new();
        if let Some(regions) = body.pointer("/data/regions").and_then(Value::as_array) {
            for region in regions {
                let (Some(id), Some(name)) = (
                    region.get("id").and_then(Value::as_i64),
                    region.get("name").and_then(Value::as_str),
                ) else {
                    continue;
                };
                summaries.insert(id, RegionSummary { id, name: name.to_string() });
            }
        }
        summaries
    }
}

/// Decorate a set of resident ids for a listing.
///
/// Gaps are filled with `Resident #N` placeholders; region names the
/// resident service did not embed are resolved through the region
/// directory, itself best-effort.
pub async fn resolve_resident_refs(
    residents: &dyn ResidentDirectory,
    regions: &dyn RegionDirectory,
    ids: &[DbId],
) -> HashMap<DbId, ResidentRef> {
    let summaries = residents.find_by_ids(ids).await;

    let missing_regions: Vec<DbId> = summaries
        .values()
        .filter(|summary| summary.region_name.is_none())
        .filter_map(|summary| summary.region_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let region_names = if missing_regions.is_empty() {
        HashMap::new()
    } else {
        regions.find_by_ids(&missing_regions).await
    };

    ids.iter()
        .map(|&id| {
            let entry = match summaries.get(&id) {
                Some(summary) => ResidentRef {
                    id,
                    name: summary.name.clone(),
                    region_name: summary.region_name.clone().or_else(|| {
                        summary
                            .region_id
                            .and_then(|rid| region_names.get(&rid).map(|r| r.name.clone()))
                    }),
                },
                None => ResidentRef {
                    id,
                    name: format!("Resident #{id}"),
                    region_name: None,
                },
            };
            (id, entry)
        })
        .collect()
}

async fn fetch_json(client: &reqwest::Client, url: &str, service: &str) -> Option<Value> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, url, "{service} service unreachable, degrading");
            return None;
        }
    };
    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), url, "{service} service returned an error, degrading");
        return None;
    }
    match response.json().await {
        Ok(body) => Some(body),
        Err(err) => {
            tracing::warn!(error = %err, url, "{service} service returned malformed JSON, degrading");
            None
        }
    }
}

fn join_ids(ids: &[DbId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn resident_summary(value: &Value) -> Option<ResidentSummary> {
    let id = value.get("id").and_then(Value::as_i64)?;
    let name = value.get("name").and_then(Value::as_str)?.to_string();
    let region_id = value.get("region_id").and_then(Value::as_i64);
    let region_name = value
        .pointer("/region/name")
        .and_then(Value::as_str)
        .map(String::from);
    Some(ResidentSummary {
        id,
        name,
        region_id,
        region_name,
    })
}

fn resident_record(value: &Value) -> Option<ResidentRecord> {
    let summary = resident_summary(value)?;
    Some(ResidentRecord {
        summary,
        record: value.clone(),
    })
}
