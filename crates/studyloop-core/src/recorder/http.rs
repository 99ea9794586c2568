use async_trait::async_trait;
use url::Url;

use super::SessionRecorder;
use crate::error::RecorderError;
use crate::session::CompletedSession;

/// Posts completed sessions as JSON to a remote endpoint.
///
/// Mirrors the session API contract: one POST per session, an optional
/// bearer token, any non-success status is a rejection.
#[derive(Debug)]
pub struct HttpRecorder {
    client: reqwest::Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpRecorder {
    /// # Errors
    ///
    /// Returns `RecorderError::InvalidEndpoint` when the URL does not parse.
    pub fn new(endpoint: &str, auth_token: Option<String>) -> Result<Self, RecorderError> {
        let endpoint = Url::parse(endpoint).map_err(|source| RecorderError::InvalidEndpoint {
            url: endpoint.to_string(),
            source,
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            auth_token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SessionRecorder for HttpRecorder {
    async fn record(&self, session: &CompletedSession) -> Result<(), RecorderError> {
        let mut request = self.client.post(self.endpoint.clone()).json(session);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RecorderError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
