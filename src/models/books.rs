//! Wire types exchanged with the Books API backend.
//!
//! Includes structs for:
//! - Book records and the payloads used to create and patch them.
//! - Users and the register/login payloads, plus the `{ user, token }` auth response.
//! - The raw `ProbeResponse` captured for contract evaluation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Books ---

/// A single book as returned by `/books` and `/books/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Book {
    pub id: Uuid,
    pub book_name: String,
    pub author: String,
}

/// Body for `POST /books`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewBook {
    pub book_name: String,
    pub author: String,
}

/// Body for `PATCH /books/{id}`. Absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateBook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Output of `POST /generate-book`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratedBook {
    pub book: String,
    pub author: String,
}

// --- Users ---

/// A registered user. The backend also sends the password hash; it is not kept.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Response of both `/register` and `/login`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

// --- Raw responses ---

/// Decoded body of a raw response.
///
/// A body that parses as JSON is kept as a `serde_json::Value`, anything else
/// as text. This is how a JS client exposes `response.data`, so a plain-text
/// `Works` and a JSON `"Works"` both read as the same string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
    Empty,
}

impl ResponseBody {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return ResponseBody::Empty;
        }
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) {
            return ResponseBody::Json(value);
        }
        ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// The body as a string, if it is text or a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) => Some(s),
            ResponseBody::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ResponseBody::Json(serde_json::Value::Array(_)))
    }

    /// Short human description used in failure messages.
    pub fn describe(&self) -> String {
        const MAX: usize = 60;
        let raw = match self {
            ResponseBody::Json(serde_json::Value::Array(items)) => {
                return format!("array of {} item(s)", items.len())
            },
            ResponseBody::Json(serde_json::Value::Object(_)) => return "JSON object".to_string(),
            ResponseBody::Json(v) => v.to_string(),
            ResponseBody::Text(s) => format!("{:?}", s),
            ResponseBody::Empty => return "empty body".to_string(),
        };
        if raw.chars().count() > MAX {
            let cut: String = raw.chars().take(MAX).collect();
            format!("{}…", cut)
        } else {
            raw
        }
    }
}

/// Status, decoded body and latency of a single request.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: ResponseBody,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_body_is_text() {
        let body = ResponseBody::from_bytes(b"Works");
        assert_eq!(body, ResponseBody::Text("Works".to_string()));
        assert_eq!(body.as_str(), Some("Works"));
    }

    #[test]
    fn json_string_reads_as_str() {
        let body = ResponseBody::from_bytes(br#""works""#);
        assert_eq!(body.as_str(), Some("works"));
        assert!(!body.is_array());
    }

    #[test]
    fn json_array_is_array() {
        let body = ResponseBody::from_bytes(b"[]");
        assert!(body.is_array());
        assert_eq!(body.describe(), "array of 0 item(s)");
    }

    #[test]
    fn empty_body() {
        assert_eq!(ResponseBody::from_bytes(b""), ResponseBody::Empty);
    }

    #[test]
    fn long_text_is_truncated_in_description() {
        let long = "x".repeat(200);
        let described = ResponseBody::Text(long).describe();
        assert!(described.ends_with('…'));
        assert!(described.chars().count() <= 62);
    }

    #[test]
    fn book_deserializes_from_backend_json() {
        let value = json!({
            "id": "5f1f7a4e-2b9c-4a8e-9d8e-3c1a2b3c4d5e",
            "book_name": "Dune",
            "author": "Frank Herbert"
        });
        let book: Book = serde_json::from_value(value).unwrap();
        assert_eq!(book.book_name, "Dune");
    }

    #[test]
    fn update_book_skips_absent_fields() {
        let patch = UpdateBook {
            author: Some("New".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"author": "New"}));
    }

    #[test]
    fn auth_response_drops_password_hash() {
        let value = json!({
            "user": {
                "id": "5f1f7a4e-2b9c-4a8e-9d8e-3c1a2b3c4d5e",
                "username": "ada",
                "email": "ada@example.com",
                "password": "$argon2id$v=19$...",
                "created_at": "2024-03-10T12:00:00"
            },
            "token": "abc"
        });
        let auth: AuthResponse = serde_json::from_value(value).unwrap();
        assert_eq!(auth.user.username, "ada");
        let back = serde_json::to_value(&auth.user).unwrap();
        assert!(back.get("password").is_none());
        assert!(!format!("{:?}", auth).contains("argon2"));
    }
}
