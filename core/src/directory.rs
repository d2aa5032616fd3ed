//! The remote client directory as seen by the fetch controller.

use async_trait::async_trait;
use tracing::{error, warn};

use crate::client::ClinicClient;
use crate::error::ApiError;
use crate::session::CredentialStore;
use crate::transport::Transport;
use crate::types::ClientRecord;

/// Source of the client collection.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn fetch_clients(&self) -> Result<Vec<ClientRecord>, ApiError>;
}

/// `GET /clients` over a [`Transport`], authenticated from a
/// [`CredentialStore`].
///
/// A 401 or 422 clears the store. Sending the user back to a login screen is
/// left to whoever renders the resulting error.
pub struct HttpClientDirectory<T, C> {
    client: ClinicClient,
    transport: T,
    credentials: C,
}

impl<T: Transport, C: CredentialStore> HttpClientDirectory<T, C> {
    pub fn new(client: ClinicClient, transport: T, credentials: C) -> Self {
        Self {
            client,
            transport,
            credentials,
        }
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }
}

#[async_trait]
impl<T: Transport, C: CredentialStore> ClientDirectory for HttpClientDirectory<T, C> {
    async fn fetch_clients(&self) -> Result<Vec<ClientRecord>, ApiError> {
        let token = self.credentials.token();
        let req = self.client.build_list_clients(token.as_deref());
        let response = self.transport.execute(req).await?;

        self.client.parse_list_clients(response).map_err(|e| {
            if e.invalidates_session() {
                warn!(status = e.status(), "credential rejected, clearing stored token");
                self.credentials.clear();
            } else {
                error!(status = e.status(), error = %e, "client list request failed");
            }
            e
        })
    }
}

#[async_trait]
impl<D: ClientDirectory + ?Sized> ClientDirectory for std::sync::Arc<D> {
    async fn fetch_clients(&self) -> Result<Vec<ClientRecord>, ApiError> {
        (**self).fetch_clients().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::session::MemoryCredentialStore;

    /// Replies with a fixed response and remembers the last request.
    struct Canned {
        response: Result<HttpResponse, ApiError>,
        seen: Mutex<Option<HttpRequest>>,
    }

    impl Canned {
        fn new(response: Result<HttpResponse, ApiError>) -> Self {
            Self {
                response,
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            *self.seen.lock().unwrap() = Some(request);
            self.response.clone()
        }
    }

    fn directory(
        response: Result<HttpResponse, ApiError>,
        token: Option<&str>,
    ) -> HttpClientDirectory<Arc<Canned>, Arc<MemoryCredentialStore>> {
        let store = match token {
            Some(t) => MemoryCredentialStore::with_token(t),
            None => MemoryCredentialStore::new(),
        };
        HttpClientDirectory::new(
            ClinicClient::new("http://clinic.test/api"),
            Arc::new(Canned::new(response)),
            Arc::new(store),
        )
    }

    #[tokio::test]
    async fn sends_stored_token() {
        let dir = directory(Ok(HttpResponse::new(200, r#"{"data":[]}"#)), Some("abc"));
        let clients = dir.fetch_clients().await.unwrap();
        assert!(clients.is_empty());

        let seen = dir.transport.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.path, "http://clinic.test/api/clients");
        assert_eq!(seen.header("authorization"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn rejected_token_is_cleared() {
        for status in [401, 422] {
            let dir = directory(
                Ok(HttpResponse::new(status, r#"{"success":false,"message":"bad token"}"#)),
                Some("abc"),
            );
            let err = dir.fetch_clients().await.unwrap_err();
            assert_eq!(err.status(), status);
            assert!(dir.credentials().token().is_none(), "{status}");
        }
    }

    #[tokio::test]
    async fn server_error_keeps_token() {
        let dir = directory(Ok(HttpResponse::new(500, "")), Some("abc"));
        let err = dir.fetch_clients().await.unwrap_err();
        assert_eq!(err.status(), 500);
        assert_eq!(dir.credentials().token().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn connectivity_failure_passes_through() {
        let dir = directory(Err(ApiError::connectivity("refused")), Some("abc"));
        let err = dir.fetch_clients().await.unwrap_err();
        assert!(err.is_connectivity());
        assert_eq!(dir.credentials().token().as_deref(), Some("abc"));
    }
}
