// libs/shared/database/src/data_api.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::store::{DeleteOutcome, DocumentStore, UpdateOutcome};

/// HTTP client for a Mongo-flavoured Data API endpoint.
///
/// Every store operation maps to `POST {base}/action/{name}` with a JSON
/// body carrying the data source, database, collection and the operation's
/// filter/update/projection documents. The endpoint executes each action as
/// one atomic command, which is what gives `update_one` its conditional
/// compare-and-set behavior.
pub struct DataApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    data_source: String,
    database: String,
}

impl DataApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.data_api_url.clone(),
            api_key: config.data_api_key.clone(),
            data_source: config.data_source.clone(),
            database: config.database.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("api-key", key);
        }
        headers
    }

    async fn action<T>(&self, name: &str, collection: &str, mut body: Map<String, Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/action/{}", self.base_url, name);
        debug!("Data API {} on {}.{}", name, self.database, collection);

        body.insert("dataSource".to_string(), json!(self.data_source));
        body.insert("database".to_string(), json!(self.database));
        body.insert("collection".to_string(), json!(collection));

        let response = self
            .client
            .post(&url)
            .headers(self.get_headers())
            .json(&Value::Object(body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Data API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("Data API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}

#[derive(serde::Deserialize)]
struct FindOneResponse {
    document: Option<Value>,
}

#[derive(serde::Deserialize)]
struct FindResponse {
    documents: Vec<Value>,
}

#[derive(serde::Deserialize)]
struct InsertOneResponse {
    #[serde(rename = "insertedId")]
    inserted_id: String,
}

#[async_trait]
impl DocumentStore for DataApiClient {
    async fn find_one(&self, collection: &str, filter: Value) -> Result<Option<Value>> {
        let mut body = Map::new();
        body.insert("filter".to_string(), filter);

        let response: FindOneResponse = self.action("findOne", collection, body).await?;
        Ok(response.document)
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Value,
        projection: Option<Value>,
    ) -> Result<Vec<Value>> {
        let mut body = Map::new();
        body.insert("filter".to_string(), filter);
        if let Some(projection) = projection {
            body.insert("projection".to_string(), projection);
        }

        let response: FindResponse = self.action("find", collection, body).await?;
        Ok(response.documents)
    }

    async fn insert_one(&self, collection: &str, document: Value) -> Result<String> {
        let mut body = Map::new();
        body.insert("document".to_string(), document);

        let response: InsertOneResponse = self.action("insertOne", collection, body).await?;
        Ok(response.inserted_id)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Value,
        update: Value,
    ) -> Result<UpdateOutcome> {
        let mut body = Map::new();
        body.insert("filter".to_string(), filter);
        body.insert("update".to_string(), update);

        self.action("updateOne", collection, body).await
    }

    async fn delete_one(&self, collection: &str, filter: Value) -> Result<DeleteOutcome> {
        let mut body = Map::new();
        body.insert("filter".to_string(), filter);

        self.action("deleteOne", collection, body).await
    }
}
