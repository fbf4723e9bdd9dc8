use http::Extensions;
use reqwest_middleware::{Middleware, Next};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Logs every outbound request once it completes.
///
/// Only host and path are recorded: query strings carry the NCBI API key.
#[derive(Clone, Debug, Default)]
pub(crate) struct TraceMiddleware;

impl TraceMiddleware {
    pub(crate) fn new() -> Self {
        Self
    }
}

pub(crate) fn redacted_target(url: &reqwest::Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or("unknown-host"),
        url.path()
    )
}

#[async_trait::async_trait]
impl Middleware for TraceMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let method = req.method().clone();
        let target = redacted_target(req.url());
        let start = Instant::now();

        let result = next.run(req, extensions).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(resp) => debug!(
                %method,
                url = target.as_str(),
                status = resp.status().as_u16(),
                elapsed_ms,
                "upstream request completed"
            ),
            Err(err) => warn!(
                %method,
                url = target.as_str(),
                elapsed_ms,
                error = %err,
                "upstream request failed"
            ),
        }
        result
    }
}
