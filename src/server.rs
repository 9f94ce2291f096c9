use std::convert::Infallible;
use std::net::TcpListener;
use std::sync::Arc;

use axum::body::{Bytes, Full};
use axum::extract::{Extension, Query};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{AddExtensionLayer, Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::BirdCatalog;
use crate::config::{BirdSourceKind, Config};
use crate::factoid::{BirdSource, FactoidAggregator};
use crate::facts::FactsApi;
use crate::image::{ImageResolver, DEFAULT_IMAGE};
use crate::request::upstream_client;

pub struct Context {
    pub aggregator: FactoidAggregator,
    pub resolver: ImageResolver,
}

impl Context {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = upstream_client(&config.user_agent, config.upstream_timeout)?;
        let resolver = || {
            ImageResolver::new(
                client.clone(),
                config.image_search_url.clone(),
                config.image_search_client_id.clone(),
            )
        };
        let source: Box<dyn BirdSource> = match config.bird_source {
            BirdSourceKind::Catalog => Box::new(BirdCatalog::default()),
            BirdSourceKind::Facts => Box::new(FactsApi::new(
                client.clone(),
                config.facts_api_url.clone(),
                config.facts_id_range,
            )),
        };
        Ok(Context {
            aggregator: FactoidAggregator::new(source, resolver()),
            resolver: resolver(),
        })
    }
}

#[derive(Debug)]
pub enum AppError {
    Serialization(serde_json::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(inner: serde_json::Error) -> Self {
        AppError::Serialization(inner)
    }
}

impl IntoResponse for AppError {
    type Body = Full<Bytes>;
    type BodyError = Infallible;

    fn into_response(self) -> Response<Self::Body> {
        let (status, error_message) = match self {
            AppError::Serialization(err) => {
                error!("Failed to serialize response: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

fn json_response<T: Serialize>(value: &T) -> Result<Response<Full<Bytes>>, AppError> {
    let body = serde_json::to_vec(value)?;
    let mut response = Response::new(Full::from(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

async fn random_bird(
    Extension(state): Extension<Arc<Context>>,
) -> Result<Response<Full<Bytes>>, AppError> {
    let factoid = state.aggregator.produce().await;
    json_response(&factoid)
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    #[serde(rename = "birdName")]
    bird_name: Option<String>,
}

async fn bird_image(
    Extension(state): Extension<Arc<Context>>,
    Query(query): Query<ImageQuery>,
) -> Result<Response<Full<Bytes>>, AppError> {
    let image = match query.bird_name.as_deref() {
        None | Some("") => DEFAULT_IMAGE.to_owned(),
        Some(name) => state.resolver.resolve(name).await,
    };
    json_response(&image)
}

/// Serves until the listener goes away. Taking a bound listener lets callers
/// pick port 0 and find out where we ended up.
pub async fn run_server(ctx: Arc<Context>, listener: TcpListener) -> anyhow::Result<()> {
    listener.set_nonblocking(true)?;
    info!("Starting server on {}", listener.local_addr()?);
    let router = Router::new()
        .route("/", get(random_bird))
        .route("/image", get(bird_image))
        .layer(AddExtensionLayer::new(ctx));
    axum::Server::from_tcp(listener)?
        .serve(router.into_make_service())
        .await?;
    Ok(())
}
