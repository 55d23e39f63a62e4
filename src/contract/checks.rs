//! Contract checks and their pure evaluation against a recorded response.

use crate::models::ProbeResponse;
use serde::Serialize;

/// What the body of a response must look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BodyExpectation {
    /// Text (or a JSON string) equal to this value, case-sensitive.
    Exact(String),
    /// A JSON array of any length.
    JsonArray,
}

/// One request/assert pair.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: String,
    pub method: String,
    pub path: String,
    pub body: BodyExpectation,
    /// `None` leaves the status unasserted.
    pub status: Option<u16>,
}

impl Check {
    pub fn get(name: &str, path: &str, body: BodyExpectation, status: Option<u16>) -> Self {
        Self {
            name: name.to_string(),
            method: "GET".to_string(),
            path: path.to_string(),
            body,
            status,
        }
    }
}

/// The result of running one check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub check: Check,
    /// `None` when the request never produced a response.
    pub status: Option<u16>,
    pub elapsed_ms: Option<u64>,
    /// Every assertion that did not hold. Empty means the check passed.
    pub failures: Vec<String>,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Outcome for a check whose request failed before any response arrived.
    pub fn transport_failure(check: &Check, reason: String) -> Self {
        Self {
            check: check.clone(),
            status: None,
            elapsed_ms: None,
            failures: vec![format!("request failed: {}", reason)],
        }
    }
}

/// The Books API smoke contract: root greeting, book list and test route.
pub fn smoke_suite() -> Vec<Check> {
    vec![
        Check::get("test works /", "/", BodyExpectation::Exact("Works".to_string()), None),
        Check::get("GET /books", "/books", BodyExpectation::JsonArray, Some(200)),
        Check::get(
            "GET /test",
            "/test",
            BodyExpectation::Exact("works".to_string()),
            Some(200),
        ),
    ]
}

/// Checks `response` against `check`, collecting every failed assertion.
pub fn evaluate(check: &Check, response: &ProbeResponse) -> CheckOutcome {
    let mut failures = Vec::new();

    match &check.body {
        BodyExpectation::Exact(expected) => {
            if response.body.as_str() != Some(expected.as_str()) {
                failures.push(format!(
                    "expected body {:?}, got {}",
                    expected,
                    response.body.describe()
                ));
            }
        },
        BodyExpectation::JsonArray => {
            if !response.body.is_array() {
                failures.push(format!(
                    "expected a JSON array, got {}",
                    response.body.describe()
                ));
            }
        },
    }

    if let Some(expected) = check.status {
        if response.status != expected {
            failures.push(format!(
                "expected status {}, got {}",
                expected, response.status
            ));
        }
    }

    CheckOutcome {
        check: check.clone(),
        status: Some(response.status),
        elapsed_ms: Some(response.elapsed_ms),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseBody;
    use rstest::rstest;
    use serde_json::json;

    fn response(status: u16, body: ResponseBody) -> ProbeResponse {
        ProbeResponse {
            status,
            body,
            elapsed_ms: 1,
        }
    }

    fn text(s: &str) -> ResponseBody {
        ResponseBody::Text(s.to_string())
    }

    #[test]
    fn smoke_suite_matches_the_backend_contract() {
        let suite = smoke_suite();
        let paths: Vec<&str> = suite.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["/", "/books", "/test"]);
        assert_eq!(suite[0].status, None);
        assert_eq!(suite[1].body, BodyExpectation::JsonArray);
        assert_eq!(suite[2].status, Some(200));
        assert!(suite.iter().all(|c| c.method == "GET"));
    }

    #[rstest]
    // root status is never asserted
    #[case(0, 200, text("Works"), true)]
    #[case(0, 500, text("Works"), true)]
    #[case(0, 200, ResponseBody::Json(json!("Works")), true)]
    #[case(0, 200, text("works"), false)]
    #[case(0, 200, ResponseBody::Empty, false)]
    #[case(1, 200, ResponseBody::Json(json!([])), true)]
    #[case(1, 200, ResponseBody::Json(json!([{"id": 1}])), true)]
    #[case(1, 200, ResponseBody::Json(json!({"books": []})), false)]
    #[case(1, 401, ResponseBody::Json(json!([])), false)]
    #[case(1, 200, text("[]x"), false)]
    #[case(2, 200, text("works"), true)]
    #[case(2, 200, text("Works"), false)]
    #[case(2, 404, text("works"), false)]
    fn evaluates_smoke_checks(
        #[case] index: usize,
        #[case] status: u16,
        #[case] body: ResponseBody,
        #[case] should_pass: bool,
    ) {
        let check = &smoke_suite()[index];
        let outcome = evaluate(check, &response(status, body));
        assert_eq!(outcome.passed(), should_pass, "{:?}", outcome.failures);
        assert_eq!(outcome.status, Some(status));
    }

    #[test]
    fn every_failed_assertion_is_reported() {
        let check = &smoke_suite()[2];
        let outcome = evaluate(check, &response(404, text("Not Found")));
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.failures[0].contains("expected body \"works\""));
        assert!(outcome.failures[1].contains("expected status 200, got 404"));
    }

    #[test]
    fn transport_failure_has_no_status() {
        let check = &smoke_suite()[1];
        let outcome = CheckOutcome::transport_failure(check, "connection refused".to_string());
        assert!(!outcome.passed());
        assert_eq!(outcome.status, None);
        assert!(outcome.failures[0].contains("connection refused"));
    }
}
