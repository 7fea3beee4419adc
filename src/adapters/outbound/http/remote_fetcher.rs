use std::sync::Arc;

use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, redirect, Client};
use tracing::debug;
use url::Url;

use super::egress::{EgressPolicy, GuardedResolver};
use super::FetchError;

const MAX_REDIRECTS: usize = 10;

/// A fully buffered remote response
#[derive(Debug, Clone)]
pub struct FetchedObject {
    pub body: Bytes,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// HTTP client whose every hop is checked against an [`EgressPolicy`]
#[derive(Clone)]
pub struct RemoteFetcher {
    client: Client,
    policy: Arc<EgressPolicy>,
}

impl RemoteFetcher {
    /// Create a fetcher enforcing `policy`
    pub fn new(policy: EgressPolicy) -> Result<Self, FetchError> {
        let policy = Arc::new(policy);
        let redirect_policy = policy.clone();

        let client = Client::builder()
            .dns_resolver(Arc::new(GuardedResolver::new(policy.clone())))
            // a proxy would make the resolver check the proxy instead of the destination
            .no_proxy()
            .redirect(redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    return attempt.error("too many redirects");
                }
                match redirect_policy.check_url(attempt.url()) {
                    Ok(()) => attempt.follow(),
                    Err(e) => attempt.error(e),
                }
            }))
            .build()?;

        Ok(Self { client, policy })
    }

    /// Fetch `source` and buffer the whole body.
    /// Non-2xx responses are errors.
    pub async fn fetch(&self, source: &str) -> Result<FetchedObject, FetchError> {
        let url = Url::parse(source).map_err(|e| FetchError::InvalidUrl {
            url: source.to_string(),
            source: e,
        })?;
        self.policy.check_url(&url)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let content_length = response.content_length();
        let body = response.bytes().await?;

        debug!(url = %source, size = body.len(), "Fetched remote source");

        Ok(FetchedObject {
            body,
            content_type,
            content_length,
        })
    }
}
