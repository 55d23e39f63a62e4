//! Provides a client for the Books API backend.
//!
//! `BooksClient` exposes two layers: a raw `get` that records whatever the
//! backend answers (used by the contract checks), and typed calls for each
//! route that turn unexpected statuses into `AppError::Status`.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    AuthResponse, Book, GeneratedBook, LoginPayload, NewBook, ProbeResponse, RegisterPayload,
    ResponseBody, UpdateBook,
};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How often `wait_until_ready` polls the root route.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Longest body excerpt carried in a status error.
const ERROR_BODY_LIMIT: usize = 200;

/// An asynchronous client for one Books API backend.
#[derive(Clone)]
pub struct BooksClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BooksClient {
    /// Creates a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Returns a copy of this client that authenticates with `token`.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    /// Returns a copy of this client that sends no credentials.
    pub fn anonymous(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() || path == "/" {
            // `GET {BACKEND_URL}` with nothing appended
            return format!("{}/", self.base_url);
        }
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    // --- Raw access ---

    /// Sends `GET {path}` and records status, decoded body and latency.
    ///
    /// Only transport failures are errors; any HTTP status is a valid result.
    pub async fn get(&self, path: &str) -> Result<ProbeResponse> {
        let started = Instant::now();
        let response = self.request(Method::GET, path).send().await.map_err(|e| {
            error!("GET {} failed: {}", path, e);
            AppError::Api(e.into())
        })?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(path, status, elapsed_ms, "Raw GET completed");
        Ok(ProbeResponse {
            status,
            body: ResponseBody::from_bytes(&bytes),
            elapsed_ms,
        })
    }

    /// `GET /`
    pub async fn root(&self) -> Result<ProbeResponse> {
        self.get("/").await
    }

    /// `GET /test`
    #[cfg(test)]
    #[allow(dead_code)]
    pub async fn test_route(&self) -> Result<ProbeResponse> {
        self.get("/test").await
    }

    /// Polls `GET /` until the backend answers with any status, or `deadline` passes.
    ///
    /// Each attempt is cut off at the remaining deadline, so a host that accepts
    /// connections but never replies cannot hold the caller for the client timeout.
    pub async fn wait_until_ready(&self, deadline: Duration) -> Result<()> {
        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let remaining = deadline.saturating_sub(started.elapsed());
            match tokio::time::timeout(remaining, self.root()).await {
                Ok(Ok(resp)) => {
                    info!(
                        "Backend at {} is up (status {} after {} attempt(s))",
                        self.base_url, resp.status, attempts
                    );
                    return Ok(());
                },
                Ok(Err(e)) => {
                    debug!("Backend not ready yet (attempt {}): {}", attempts, e);
                },
                Err(_) => {
                    debug!("Attempt {} got no answer before the deadline", attempts);
                },
            }
            if started.elapsed() + READY_POLL_INTERVAL > deadline {
                warn!(
                    "Gave up waiting for {} after {} attempt(s)",
                    self.base_url, attempts
                );
                return Err(AppError::NotReady(self.base_url.clone()));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    // --- Typed routes ---

    /// `GET /books`
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let response = self.send(Method::GET, "/books", None::<&()>).await?;
        let response = expect_status(Method::GET, "/books", response, &[StatusCode::OK]).await?;
        let books: Vec<Book> = decode(response).await?;
        debug!("Received {} books", books.len());
        Ok(books)
    }

    /// `GET /books/{id}`; `None` on 404.
    pub async fn get_book(&self, id: Uuid) -> Result<Option<Book>> {
        let path = format!("/books/{}", id);
        let response = self.send(Method::GET, &path, None::<&()>).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = expect_status(Method::GET, &path, response, &[StatusCode::OK]).await?;
        Ok(Some(decode(response).await?))
    }

    /// `POST /books`; the backend answers 201 with the stored record.
    pub async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let response = self.send(Method::POST, "/books", Some(book)).await?;
        let response =
            expect_status(Method::POST, "/books", response, &[StatusCode::CREATED]).await?;
        let created: Book = decode(response).await?;
        info!("Created book {} ({:?})", created.id, created.book_name);
        Ok(created)
    }

    /// `PATCH /books/{id}`; `None` on 404.
    pub async fn update_book(&self, id: Uuid, patch: &UpdateBook) -> Result<Option<Book>> {
        let path = format!("/books/{}", id);
        let response = self.send(Method::PATCH, &path, Some(patch)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = expect_status(Method::PATCH, &path, response, &[StatusCode::OK]).await?;
        Ok(Some(decode(response).await?))
    }

    /// `DELETE /books/{id}`; `true` on 204, `false` on 404.
    pub async fn delete_book(&self, id: Uuid) -> Result<bool> {
        let path = format!("/books/{}", id);
        let response = self.send(Method::DELETE, &path, None::<&()>).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        expect_status(Method::DELETE, &path, response, &[StatusCode::NO_CONTENT]).await?;
        Ok(true)
    }

    /// `POST /register`
    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse> {
        let response = self.send(Method::POST, "/register", Some(payload)).await?;
        let response =
            expect_status(Method::POST, "/register", response, &[StatusCode::CREATED]).await?;
        decode(response).await
    }

    /// `POST /login`
    pub async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse> {
        let response = self.send(Method::POST, "/login", Some(payload)).await?;
        let response = expect_status(Method::POST, "/login", response, &[StatusCode::OK]).await?;
        decode(response).await
    }

    /// `POST /generate-book`
    pub async fn generate_book(&self) -> Result<GeneratedBook> {
        let response = self.send(Method::POST, "/generate-book", None::<&()>).await?;
        let response =
            expect_status(Method::POST, "/generate-book", response, &[StatusCode::OK]).await?;
        decode(response).await
    }

    async fn send<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder.send().await.map_err(|e| {
            error!("{} {} failed: {}", method, path, e);
            AppError::Api(e.into())
        })
    }
}

/// Passes the response through when its status is one of `accepted`.
async fn expect_status(
    method: Method,
    path: &str,
    response: Response,
    accepted: &[StatusCode],
) -> Result<Response> {
    let status = response.status();
    if accepted.contains(&status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    if status == StatusCode::UNAUTHORIZED {
        error!("{} {} was rejected with 401. Check BOOKS_API_TOKEN or the login credentials.", method, path);
    } else {
        error!("{} {} returned unexpected status {}", method, path, status);
    }
    Err(AppError::Status {
        method: method.to_string(),
        path: path.to_string(),
        status: status.as_u16(),
        body: excerpt,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!("Error parsing response JSON: {}", e);
        AppError::from(e)
    })
}
