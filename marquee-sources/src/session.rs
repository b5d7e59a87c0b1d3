//! HTTP session shared by provider calls.
//!
//! A [`Session`] is a connection-pooling handle. One session is opened per
//! aggregation fan-out and closed once every load has finished.

use std::future::Future;

use marquee_core::config::HttpConfig;

use crate::errors::SourceError;

/// Pooled HTTP client handed to every provider call.
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
}

impl Session {
    /// Opens a session configured from `config`.
    ///
    /// # Errors
    ///
    /// - `SourceError::Network` - If the HTTP client cannot be built
    pub fn open(config: &HttpConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SourceError::Network {
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        tracing::trace!("Opened HTTP session");
        Ok(Self { client })
    }

    /// Wraps an existing client, e.g. one shared with other services.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The pooled client requests are sent through.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Closes the session, releasing pooled connections held by this handle.
    pub fn close(self) {
        tracing::trace!("Closed HTTP session");
        drop(self.client);
    }
}

/// Drives `future` to completion on a private current-thread runtime.
///
/// # Errors
///
/// - `SourceError::Runtime` - If called from inside an async runtime, or if
///   the runtime cannot be created
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, SourceError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(SourceError::Runtime {
            reason: "blocking call made inside an async runtime".to_string(),
        });
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SourceError::Runtime {
            reason: format!("Failed to start blocking runtime: {e}"),
        })?;

    Ok(runtime.block_on(future))
}
