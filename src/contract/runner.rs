//! Runs a list of checks against a live backend and collects a report.

use super::checks::{evaluate, Check, CheckOutcome};
use crate::api::BooksClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Outcomes of one suite run, in check order.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<CheckOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs `checks` one after another.
///
/// A request that fails outright is recorded as a failed outcome and the
/// remaining checks still run. `on_progress` is called after each check.
pub async fn run_suite<F>(client: &BooksClient, checks: &[Check], mut on_progress: F) -> SuiteReport
where
    F: FnMut(&CheckOutcome),
{
    let started_at = Utc::now();
    let mut outcomes = Vec::with_capacity(checks.len());

    for check in checks {
        info!("Running check {:?}: {} {}", check.name, check.method, check.path);
        let outcome = match client.get(&check.path).await {
            Ok(response) => evaluate(check, &response),
            Err(e) => CheckOutcome::transport_failure(check, e.to_string()),
        };
        if outcome.passed() {
            info!("Check {:?} passed", check.name);
        } else {
            warn!("Check {:?} failed: {}", check.name, outcome.failures.join("; "));
        }
        on_progress(&outcome);
        outcomes.push(outcome);
    }

    SuiteReport {
        base_url: client.base_url().to_string(),
        started_at,
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::contract::smoke_suite;
    use mockito::Server;

    // Mocks are removed when dropped, so they travel with the server.
    async fn healthy_backend() -> (mockito::ServerGuard, Vec<mockito::Mock>) {
        let mut server = Server::new_async().await;
        let root = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body("Works")
            .create_async()
            .await;
        let books = server
            .mock("GET", "/books")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let test = server
            .mock("GET", "/test")
            .with_status(200)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body("works")
            .create_async()
            .await;
        (server, vec![root, books, test])
    }

    fn client_for(server: &mockito::ServerGuard) -> BooksClient {
        BooksClient::new(&Config::new(&server.url()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn healthy_backend_passes_smoke_suite() {
        let (server, _mocks) = healthy_backend().await;
        let mut seen = 0;

        let report = run_suite(&client_for(&server), &smoke_suite(), |_| seen += 1).await;

        assert!(report.is_success(), "{:?}", report.outcomes);
        assert_eq!(report.passed(), 3);
        assert_eq!(seen, 3);
        assert_eq!(report.base_url, server.url());
    }

    #[tokio::test]
    async fn missing_test_route_fails_only_that_check() {
        let mut server = Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("Works")
            .create_async()
            .await;
        let _books = server
            .mock("GET", "/books")
            .with_status(200)
            .with_body(r#"[{"id":"5f1f7a4e-2b9c-4a8e-9d8e-3c1a2b3c4d5e","book_name":"Dune","author":"Frank Herbert"}]"#)
            .create_async()
            .await;
        // No mock for /test: mockito answers 501.

        let report = run_suite(&client_for(&server), &smoke_suite(), |_| {}).await;

        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes[2].check.path, "/test");
        assert_eq!(report.outcomes[2].failures.len(), 2);
    }

    #[tokio::test]
    async fn unreachable_backend_fails_every_check_without_aborting() {
        let client = BooksClient::new(&Config::new("http://127.0.0.1:9").unwrap()).unwrap();

        let report = run_suite(&client, &smoke_suite(), |_| {}).await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.failed(), 3);
        assert!(report.outcomes.iter().all(|o| o.status.is_none()));
    }
}
