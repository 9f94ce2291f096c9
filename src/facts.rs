use async_trait::async_trait;
use log::debug;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::catalog::BirdRecord;
use crate::factoid::{BirdSource, SourceError};
use crate::request::parse_successful_response;

#[derive(Debug, Deserialize)]
struct FactsBird {
    name: String,
    // the facts service sends its own image too, we always look one up ourselves
    description: String,
}

/// Remote facts service keyed by a small integer id, an alternative to the
/// builtin catalog
pub struct FactsApi {
    client: Client,
    base_url: Url,
    id_range: u32,
}

impl FactsApi {
    pub fn new(client: Client, base_url: Url, id_range: u32) -> Self {
        Self {
            client,
            base_url,
            id_range,
        }
    }

    pub fn bird_url(&self, id: u32) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), id)
    }

    pub async fn fetch(&self, id: u32) -> Result<BirdRecord, SourceError> {
        let url = self.bird_url(id);
        debug!("Looking up bird facts at {}", url);
        let response = self.client.get(&url).send().await?;
        let bird = parse_successful_response::<FactsBird>(response).await?;
        Ok(BirdRecord {
            name: bird.name,
            description: bird.description,
        })
    }
}

#[async_trait]
impl BirdSource for FactsApi {
    async fn next_bird(&self) -> Result<BirdRecord, SourceError> {
        let id = rand::thread_rng().gen_range(0..self.id_range.max(1));
        self.fetch(id).await
    }
}
