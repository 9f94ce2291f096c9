use std::time::Duration;

use log::error;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug)]
pub struct ResponseErrorContext {
    pub body: String,
    pub code: StatusCode,
}

/// Wrapper for providing actual useful information about
/// why responses failed since reqwest throws that information
/// away when it encounters errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Failed response code {}", .0.code)]
    FailStatus(ResponseErrorContext),
    #[error("Unexpected body from upstream ({reason}): {}", .context.body)]
    UnexpectedBody {
        context: ResponseErrorContext,
        reason: serde_json::Error,
    },
    #[error("Request error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

pub async fn parse_successful_response<T: DeserializeOwned>(
    response: Response,
) -> Result<T, HttpError> {
    let response_code = response.status();
    let url = response.url().clone();
    let response_body = response.text().await?;
    if !response_code.is_success() {
        // reqwest doesn't give us the response body as
        // context when trying to handle invalid responses
        return Err(HttpError::FailStatus(ResponseErrorContext {
            body: response_body,
            code: response_code,
        }));
    }
    serde_json::from_str::<T>(&response_body).map_err(|reason| {
        error!("Failed to parse response from {}", url);
        HttpError::UnexpectedBody {
            context: ResponseErrorContext {
                body: response_body,
                code: response_code,
            },
            reason,
        }
    })
}

/// The one client every outbound call goes through. Upstreams are network bound
/// so nothing is allowed to wait on them forever.
pub fn upstream_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
}
