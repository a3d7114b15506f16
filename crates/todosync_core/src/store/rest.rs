use super::{ListOrder, StoreError, TaskStore};
use crate::config::StoreConfig;
use crate::model::{NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, warn};

const REST_PREFIX: &str = "rest/v1";

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// [`TaskStore`] backed by a PostgREST endpoint (Supabase `rest/v1`).
pub struct RestStore {
    http: Client,
    base_url: String,
    table: String,
    anon_key: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/{}/{}", self.base_url, REST_PREFIX, self.table)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.http
            .request(method, self.table_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }
}

fn id_filter(id: &TaskId) -> (&'static str, String) {
    ("id", format!("eq.{id}"))
}

/// Picks the most useful human-readable message out of a failed response body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            message: Some(message),
            ..
        }) if !message.trim().is_empty() => message.trim().to_string(),
        Ok(ApiErrorBody {
            details: Some(details),
            ..
        }) if !details.trim().is_empty() => details.trim().to_string(),
        Ok(_) => String::new(),
        Err(_) => body.trim().to_string(),
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            warn!(status = status.as_u16(), error = %err, "could not read error body");
            String::new()
        }
    };
    Err(StoreError::Api {
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

async fn decode_rows(response: Response) -> Result<Vec<Task>, StoreError> {
    let body = response.text().await?;
    parse_rows(&body)
}

/// A blank body (204, or `return=minimal` honoured by a proxy) means no rows.
fn parse_rows(body: &str) -> Result<Vec<Task>, StoreError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(|err| StoreError::InvalidResponse(err.to_string()))
}

#[async_trait]
impl TaskStore for RestStore {
    async fn list(&self, order: ListOrder) -> Result<Vec<Task>, StoreError> {
        debug!(table = %self.table, order = %order.to_query(), "list: called");
        let response = self
            .request(Method::GET)
            .query(&[("select", "*".to_string()), ("order", order.to_query())])
            .send()
            .await?;
        let tasks = decode_rows(check(response).await?).await?;
        debug!(count = tasks.len(), "list: decoded rows");
        Ok(tasks)
    }

    async fn insert(&self, task: &NewTask) -> Result<Option<Task>, StoreError> {
        debug!(table = %self.table, "insert: called");
        let response = self
            .request(Method::POST)
            .query(&[("select", "*")])
            .header("Prefer", "return=representation")
            .json(std::slice::from_ref(task))
            .send()
            .await?;
        let rows = decode_rows(check(response).await?).await?;
        if rows.is_empty() {
            debug!("insert: store echoed no record");
        }
        Ok(rows.into_iter().next())
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), StoreError> {
        debug!(%id, completed = patch.completed, "update: called");
        let response = self
            .request(Method::PATCH)
            .query(&[id_filter(id)])
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        debug!(%id, "delete: called");
        let response = self
            .request(Method::DELETE)
            .query(&[id_filter(id)])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
