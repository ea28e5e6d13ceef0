//! InfluxDB 1.x HTTP backend.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use simwatch_core::config::InfluxConfig;
use simwatch_core::{MetricPoint, SeriesValue};

use crate::error::StoreError;
use crate::line_protocol::encode_line;
use crate::MetricStore;

/// Writes line protocol to `/write` and reads last values through InfluxQL
/// on `/query`.
#[derive(Debug, Clone)]
pub struct InfluxStore {
    base_url: String,
    database: String,
    username: Option<String>,
    password: Option<String>,
    client: reqwest::Client,
}

impl InfluxStore {
    pub fn new(config: &InfluxConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        info!(url = %config.base_url(), db = %config.database, "Storage: InfluxDB backend");
        Ok(Self {
            base_url: config.base_url(),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        })
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", self.database.clone())];
        if let Some(ref u) = self.username {
            params.push(("u", u.clone()));
        }
        if let Some(ref p) = self.password {
            params.push(("p", p.clone()));
        }
        params
    }

    /// Create the database if it does not exist (idempotent on the server).
    pub async fn ensure_database(&self) -> Result<(), StoreError> {
        let q = format!("CREATE DATABASE \"{}\"", self.database.replace('"', "\\\""));
        let mut params = self.auth_params();
        params.push(("q", q));
        let resp = self
            .client
            .post(format!("{}/query", self.base_url))
            .query(&params)
            .send()
            .await?;
        check_status(resp).await.map(|_| ())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<String, StoreError> {
    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Build the last-value InfluxQL statement for a measurement regex.
pub fn last_value_query(pattern: &Regex, field: &str) -> String {
    format!(
        "SELECT LAST(\"{}\") FROM /{}/ GROUP BY *",
        field.replace('"', "\\\""),
        pattern.as_str().replace('/', "\\/"),
    )
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Series {
    name: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Decode a `/query` response body into one value per series.
///
/// Empty tag values (InfluxDB reports missing tags as `""` under
/// `GROUP BY *`) are dropped so they never reach message templates.
pub fn parse_last_values(body: &str) -> Result<Vec<SeriesValue>, StoreError> {
    let resp: QueryResponse = serde_json::from_str(body)?;
    if let Some(err) = resp.error {
        return Err(StoreError::Query(err));
    }

    let mut out = Vec::new();
    for result in resp.results {
        if let Some(err) = result.error {
            return Err(StoreError::Query(err));
        }
        for series in result.series {
            let Some(col) = series.columns.iter().position(|c| c == "last") else {
                continue;
            };
            let value = series
                .values
                .iter()
                .rev()
                .find_map(|row| row.get(col).and_then(serde_json::Value::as_f64));
            let Some(value) = value else {
                continue;
            };
            let tags = series
                .tags
                .into_iter()
                .filter(|(_, v)| !v.is_empty())
                .collect();
            out.push(SeriesValue {
                measurement: series.name,
                tags,
                value,
            });
        }
    }
    Ok(out)
}

#[async_trait]
impl MetricStore for InfluxStore {
    async fn write_points(&self, points: &[MetricPoint]) -> Result<(), StoreError> {
        let body: Vec<String> = points.iter().filter_map(encode_line).collect();
        if body.is_empty() {
            return Ok(());
        }

        let mut params = self.auth_params();
        params.push(("precision", "ns".to_string()));
        let resp = self
            .client
            .post(format!("{}/write", self.base_url))
            .query(&params)
            .body(body.join("\n"))
            .send()
            .await?;
        check_status(resp).await?;
        debug!(points = body.len(), "wrote points to InfluxDB");
        Ok(())
    }

    async fn last_values(
        &self,
        pattern: &Regex,
        field: &str,
    ) -> Result<Vec<SeriesValue>, StoreError> {
        let mut params = self.auth_params();
        params.push(("q", last_value_query(pattern, field)));
        let resp = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&params)
            .send()
            .await?;
        let body = check_status(resp).await?;
        parse_last_values(&body)
    }
}
