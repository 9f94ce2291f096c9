use std::fmt::Display;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{BirdCatalog, BirdRecord};
use crate::image::{ImageResolver, DEFAULT_IMAGE};
use crate::request::HttpError;

pub const DISGUISED_BIRD_NAME: &str = "Bird in disguise";

/// The card handed to the front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factoid {
    pub name: String,
    pub description: String,
    pub image: String,
}

impl Factoid {
    /// Stand-in card for when we couldn't even figure out which bird to show
    pub fn in_disguise(reason: &dyn Display) -> Self {
        Self {
            name: DISGUISED_BIRD_NAME.to_owned(),
            description: format!("This bird is in disguise because: {}", reason),
            image: DEFAULT_IMAGE.to_owned(),
        }
    }

    pub fn is_disguised(&self) -> bool {
        self.name == DISGUISED_BIRD_NAME
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0}")]
    Http(#[from] HttpError),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Http(HttpError::ReqwestError(err))
    }
}

/// Where the bird on the card comes from
#[async_trait]
pub trait BirdSource: Send + Sync {
    async fn next_bird(&self) -> Result<BirdRecord, SourceError>;
}

#[async_trait]
impl BirdSource for BirdCatalog {
    async fn next_bird(&self) -> Result<BirdRecord, SourceError> {
        Ok(self.pick().clone())
    }
}

pub struct FactoidAggregator {
    source: Box<dyn BirdSource>,
    resolver: ImageResolver,
}

impl FactoidAggregator {
    pub fn new(source: Box<dyn BirdSource>, resolver: ImageResolver) -> Self {
        Self { source, resolver }
    }

    /// Always comes back with a complete card. Upstream failures only show up
    /// in the content of the card itself.
    pub async fn produce(&self) -> Factoid {
        let bird = match self.source.next_bird().await {
            Ok(bird) => bird,
            Err(err) => {
                warn!("Couldn't find a bird to show: {}", err);
                return Factoid::in_disguise(&err);
            }
        };
        debug!("Picked {}", bird.name);
        let image = self.resolver.resolve(&bird.name).await;
        Factoid {
            name: bird.name,
            description: bird.description,
            image,
        }
    }
}
