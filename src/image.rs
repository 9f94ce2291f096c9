use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::request::{parse_successful_response, HttpError};

/// Shown whenever we can't come up with a real picture of the bird
pub const DEFAULT_IMAGE: &str =
    "https://www.pokemonmillennium.net/wp-content/uploads/2015/11/missingno.png";

#[derive(Debug, Default, Deserialize)]
pub struct ImageUrls {
    pub thumb: Option<String>,
    pub small: Option<String>,
    pub regular: Option<String>,
    pub full: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageCandidate {
    #[serde(default)]
    pub urls: ImageUrls,
}

#[derive(Debug, Deserialize)]
pub struct ImageSearchResponse {
    #[serde(default)]
    pub results: Vec<ImageCandidate>,
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image search failed: {0}")]
    Http(#[from] HttpError),
    #[error("Image search returned no results")]
    NoResults,
    #[error("Best image result has neither a full nor a regular url")]
    NoUsableUrl,
    #[error("Image search returned an invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: url::ParseError },
}

impl From<reqwest::Error> for ImageError {
    fn from(err: reqwest::Error) -> Self {
        ImageError::Http(HttpError::ReqwestError(err))
    }
}

fn non_empty(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|url| !url.is_empty())
}

impl ImageSearchResponse {
    /// Only the first result is ever considered, and we go for the
    /// highest resolution it offers
    pub fn best_url(&self) -> Result<&str, ImageError> {
        let first = self.results.first().ok_or(ImageError::NoResults)?;
        non_empty(&first.urls.full)
            .or_else(|| non_empty(&first.urls.regular))
            .ok_or(ImageError::NoUsableUrl)
    }
}

/// Replaces `from` wherever it shows up in `url`, unless the match is really
/// the start of a longer number (`w=2000` is not `w=200`)
fn replace_param(url: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(url.len() + to.len());
    let mut rest = url;
    while let Some(position) = rest.find(from) {
        let end = position + from.len();
        let longer_number = rest[end..].starts_with(|c: char| c.is_ascii_digit());
        out.push_str(&rest[..position]);
        out.push_str(if longer_number { from } else { to });
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

/// The search provider encodes size and quality straight into the image url.
/// Bumping them is plain text substitution, anything we don't recognize is
/// left alone.
pub fn upgrade_quality(url: &str) -> String {
    let wider = replace_param(url, "w=200", "w=2000");
    replace_param(&wider, "q=80", "q=100")
}

pub struct ImageResolver {
    client: Client,
    search_url: Url,
    client_id: Option<String>,
}

impl ImageResolver {
    pub fn new(client: Client, search_url: Url, client_id: Option<String>) -> Self {
        Self {
            client,
            search_url,
            client_id,
        }
    }

    pub fn search_query(&self, bird_name: &str) -> Url {
        let mut url = self.search_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", "1")
                .append_pair("query", bird_name)
                .append_pair("per_page", "1");
            if let Some(client_id) = &self.client_id {
                query.append_pair("client_id", client_id);
            }
        }
        url
    }

    pub async fn try_resolve(&self, bird_name: &str) -> Result<String, ImageError> {
        let response = self
            .client
            .get(self.search_query(bird_name))
            .send()
            .await?;
        let search = parse_successful_response::<ImageSearchResponse>(response).await?;
        let image = upgrade_quality(search.best_url()?);
        Url::parse(&image).map_err(|reason| ImageError::InvalidUrl {
            url: image.clone(),
            reason,
        })?;
        Ok(image)
    }

    /// Never fails, every problem along the way ends up as [`DEFAULT_IMAGE`]
    pub async fn resolve(&self, bird_name: &str) -> String {
        match self.try_resolve(bird_name).await {
            Ok(image) => {
                debug!("Resolved image for {:?}: {}", bird_name, image);
                image
            }
            Err(err) => {
                warn!("Falling back to default image for {:?}: {}", bird_name, err);
                DEFAULT_IMAGE.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{upgrade_quality, ImageError, ImageResolver, ImageSearchResponse, DEFAULT_IMAGE};
    use crate::request::upstream_client;

    const UNSPLASH_LIKE: &str = r#"{
        "total": 1,
        "results": [{
            "id": "abc",
            "urls": {
                "thumb": "https://images.example.com/photo-1?w=200&q=80&fm=jpg",
                "small": "https://images.example.com/photo-1?w=400&q=80&fm=jpg",
                "regular": "https://images.example.com/photo-1?w=1080&q=80&fm=jpg",
                "full": "https://images.example.com/photo-1?q=80&fm=jpg&w=200&fit=max"
            }
        }]
    }"#;

    fn resolver_for(base: &str, client_id: Option<&str>) -> ImageResolver {
        ImageResolver::new(
            upstream_client("birdfacts-test", Duration::from_secs(5)).unwrap(),
            Url::parse(&format!("{}/search/photos", base)).unwrap(),
            client_id.map(str::to_owned),
        )
    }

    async fn serving(body: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .respond_with(body)
            .mount(&server)
            .await;
        server
    }

    fn closed_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[test]
    fn upgrades_width_and_quality_in_any_order() {
        assert_eq!(
            upgrade_quality("https://x.test/a?w=200&q=80"),
            "https://x.test/a?w=2000&q=100"
        );
        assert_eq!(
            upgrade_quality("https://x.test/a?q=80&fit=crop&w=200"),
            "https://x.test/a?q=100&fit=crop&w=2000"
        );
    }

    #[test]
    fn upgrade_leaves_unknown_urls_alone() {
        let url = "https://x.test/photo?width=640&quality=75";
        assert_eq!(upgrade_quality(url), url);
        assert_eq!(upgrade_quality(""), "");
    }

    #[test]
    fn upgrade_is_idempotent() {
        let once = upgrade_quality("https://x.test/a?w=200&q=80");
        assert_eq!(upgrade_quality(&once), once);
        let already = "https://x.test/a?w=2000&q=100";
        assert_eq!(upgrade_quality(already), already);
    }

    #[test]
    fn upgrade_rewrites_every_occurrence() {
        assert_eq!(
            upgrade_quality("https://x.test/w=200/a?w=200"),
            "https://x.test/w=2000/a?w=2000"
        );
    }

    #[test]
    fn prefers_full_then_regular() {
        let full: ImageSearchResponse = serde_json::from_str(UNSPLASH_LIKE).unwrap();
        assert_eq!(
            full.best_url().unwrap(),
            "https://images.example.com/photo-1?q=80&fm=jpg&w=200&fit=max"
        );

        let regular_only: ImageSearchResponse = serde_json::from_str(
            r#"{"results": [{"urls": {"full": "", "regular": "https://x.test/regular"}}]}"#,
        )
        .unwrap();
        assert_eq!(regular_only.best_url().unwrap(), "https://x.test/regular");
    }

    #[test]
    fn empty_candidates_are_errors() {
        let empty: ImageSearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(matches!(empty.best_url(), Err(ImageError::NoResults)));

        let missing: ImageSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(missing.best_url(), Err(ImageError::NoResults)));

        let blank: ImageSearchResponse = serde_json::from_str(
            r#"{"results": [{"urls": {"thumb": "https://x.test/t", "full": null}}]}"#,
        )
        .unwrap();
        assert!(matches!(blank.best_url(), Err(ImageError::NoUsableUrl)));
    }

    #[test]
    fn search_query_escapes_the_name() {
        let resolver = resolver_for("http://search.test", Some("key"));
        let url = resolver.search_query("Blue Jay & friends?");
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("page".to_owned(), "1".to_owned()),
                ("query".to_owned(), "Blue Jay & friends?".to_owned()),
                ("per_page".to_owned(), "1".to_owned()),
                ("client_id".to_owned(), "key".to_owned()),
            ]
        );
        assert!(!url.as_str().contains("Blue Jay & friends"));
    }

    #[tokio::test]
    async fn resolves_and_upgrades_the_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/photos"))
            .and(query_param("query", "Snowy Owl"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "1"))
            .and(query_param("client_id", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(UNSPLASH_LIKE))
            .expect(1)
            .mount(&server)
            .await;

        let image = resolver_for(&server.uri(), Some("secret"))
            .resolve("Snowy Owl")
            .await;
        assert_eq!(
            image,
            "https://images.example.com/photo-1?q=100&fm=jpg&w=2000&fit=max"
        );
    }

    #[tokio::test]
    async fn empty_results_give_the_placeholder() {
        let server =
            serving(ResponseTemplate::new(200).set_body_string(r#"{"total":0,"results":[]}"#))
                .await;
        let image = resolver_for(&server.uri(), None).resolve("Dodo").await;
        assert_eq!(image, DEFAULT_IMAGE);
    }

    #[tokio::test]
    async fn bad_upstream_responses_give_the_placeholder() {
        for template in vec![
            ResponseTemplate::new(200).set_body_string("<html>nope</html>"),
            ResponseTemplate::new(401).set_body_string(r#"{"errors":["OAuth error"]}"#),
            ResponseTemplate::new(200)
                .set_body_string(r#"{"results":[{"urls":{"full":"not a url"}}]}"#),
        ] {
            let server = serving(template).await;
            let image = resolver_for(&server.uri(), None).resolve("Kea").await;
            assert_eq!(image, DEFAULT_IMAGE);
        }
    }

    #[tokio::test]
    async fn network_errors_give_the_placeholder() {
        let resolver = resolver_for(&closed_port(), None);
        assert!(matches!(
            resolver.try_resolve("Kea").await,
            Err(ImageError::Http(_))
        ));
        assert_eq!(resolver.resolve("Kea").await, DEFAULT_IMAGE);
    }

    #[tokio::test]
    async fn odd_names_still_produce_a_url() {
        let server = serving(ResponseTemplate::new(200).set_body_string(UNSPLASH_LIKE)).await;
        let resolver = resolver_for(&server.uri(), None);
        for name in vec!["", "   ", "100% owl/#?&=", "Émeu 🐦"] {
            let image = resolver.resolve(name).await;
            assert!(!image.is_empty());
            assert!(Url::parse(&image).is_ok());
        }
    }
}
