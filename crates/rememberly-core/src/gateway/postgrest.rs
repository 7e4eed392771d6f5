//! PostgREST implementation of the remote gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::RemoteGateway;
use crate::auth::SessionSource;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{
    Note, NoteId, NoteInsert, NotePatch, Reminder, ReminderId, ReminderInsert, ReminderPatch,
};
use crate::util::compact_text;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const CLIENT_INFO: &str = concat!("rememberly-rs/", env!("CARGO_PKG_VERSION"));

const NOTES: &str = "notes";
const REMINDERS: &str = "reminders";

/// Talks to `<supabase>/rest/v1` on behalf of the current session.
pub struct PostgrestGateway {
    rest_url: String,
    anon_key: String,
    client: Client,
    session: Arc<dyn SessionSource>,
}

impl PostgrestGateway {
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionSource>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            rest_url: config.rest_url(),
            anon_key: config.supabase_anon_key.clone(),
            client,
            session,
        })
    }

    async fn request(&self, method: Method, table: &str) -> Result<RequestBuilder> {
        let bearer = match self.session.session().await? {
            Some(session) => session.access_token,
            None => self.anon_key.clone(),
        };

        Ok(self
            .client
            .request(method, format!("{}/{table}", self.rest_url))
            .header("apikey", &self.anon_key)
            .header("X-Client-Info", CLIENT_INFO)
            .bearer_auth(bearer))
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let response = check(request.send().await?).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    async fn insert_row<T: DeserializeOwned>(
        &self,
        table: &str,
        row: &impl serde::Serialize,
    ) -> Result<T> {
        let request = self
            .request(Method::POST, table)
            .await?
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(row);
        let response = check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn update_row(&self, table: &str, id: &str, patch: &impl serde::Serialize) -> Result<()> {
        let request = self
            .request(Method::PATCH, table)
            .await?
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(patch);
        check(request.send().await?).await?;
        Ok(())
    }

    async fn delete_row(&self, table: &str, id: &str) -> Result<()> {
        let request = self
            .request(Method::DELETE, table)
            .await?
            .query(&[("id", format!("eq.{id}"))]);
        check(request.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteGateway for PostgrestGateway {
    async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let request = self.request(Method::GET, NOTES).await?.query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("order", "created_at.desc".to_string()),
        ]);
        self.fetch_rows(request).await
    }

    async fn insert_note(&self, note: &NoteInsert) -> Result<Note> {
        self.insert_row(NOTES, note).await
    }

    async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        self.update_row(NOTES, &id.as_str(), patch).await
    }

    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        self.delete_row(NOTES, &id.as_str()).await
    }

    async fn list_active_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let request = self.request(Method::GET, REMINDERS).await?.query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("is_completed", "eq.false".to_string()),
            ("order", "remind_at.asc".to_string()),
        ]);
        self.fetch_rows(request).await
    }

    async fn insert_reminder(&self, reminder: &ReminderInsert) -> Result<Reminder> {
        self.insert_row(REMINDERS, reminder).await
    }

    async fn update_reminder(&self, id: &ReminderId, patch: &ReminderPatch) -> Result<()> {
        self.update_row(REMINDERS, &id.as_str(), patch).await
    }

    async fn delete_reminder(&self, id: &ReminderId) -> Result<()> {
        self.delete_row(REMINDERS, &id.as_str()).await
    }

    async fn ping(&self) -> Result<()> {
        let request = self
            .request(Method::GET, NOTES)
            .await?
            .query(&[("select", "id"), ("limit", "1")]);
        check(request.send().await?).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    code: Option<String>,
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = parse_postgrest_error(status, &body);
    tracing::debug!(status = status.as_u16(), %message, "PostgREST request failed");
    Err(Error::Api(message))
}

fn parse_postgrest_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorBody>(body) {
        if let Some(message) = payload.message.filter(|message| !message.trim().is_empty()) {
            tracing::trace!(
                code = payload.code.as_deref().unwrap_or_default(),
                details = payload.details.as_deref().unwrap_or_default(),
                hint = payload.hint.as_deref().unwrap_or_default(),
                "PostgREST error detail"
            );
            return message.trim().to_string();
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthSession, AuthUser, StaticSession};
    use crate::models::{NewNote, NoteType};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer, signed_in: bool) -> PostgrestGateway {
        let config = ClientConfig::from_parts(Some(server.uri()), Some("anon".into()), None)
            .unwrap();
        let session = signed_in.then(|| AuthSession {
            access_token: "user-token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX,
            user: AuthUser {
                id: "user-1".to_string(),
                email: None,
            },
        });
        PostgrestGateway::new(&config, Arc::new(StaticSession::new(session))).unwrap()
    }

    fn note_row(id: &str, created_at: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "user_id": "user-1",
            "title": "Title",
            "original_content": "Body",
            "summary": "Summary",
            "type": "url",
            "tags": ["tech"],
            "source_url": "https://example.com",
            "file_url": null,
            "created_at": created_at,
            "updated_at": created_at
        })
    }

    #[tokio::test]
    async fn list_notes_filters_by_user_and_orders_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/notes"))
            .and(query_param("user_id", "eq.user-1"))
            .and(query_param("order", "created_at.desc"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                note_row("0190a3c8-0000-7000-8000-000000000002", "2024-05-02T10:00:00Z"),
                note_row("0190a3c8-0000-7000-8000-000000000001", "2024-05-01T10:00:00Z"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let notes = gateway(&server, true).list_notes("user-1").await.unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].kind, NoteType::Url);
        assert_eq!(notes[0].source_url.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn insert_note_requests_single_representation() {
        let server = MockServer::start().await;
        let insert = NoteInsert {
            user_id: "user-1".to_string(),
            note: NewNote::new(
                NoteType::Url,
                "https://example.com",
                "Title",
                "Body",
                "Summary",
                vec!["tech".to_string()],
            ),
        };
        Mock::given(method("POST"))
            .and(path("/rest/v1/notes"))
            .and(header("prefer", "return=representation"))
            .and(header("accept", SINGLE_OBJECT))
            .and(body_json(serde_json::to_value(&insert).unwrap()))
            .respond_with(ResponseTemplate::new(201).set_body_json(note_row(
                "0190a3c8-0000-7000-8000-000000000003",
                "2024-05-03T10:00:00Z",
            )))
            .mount(&server)
            .await;

        let note = gateway(&server, true).insert_note(&insert).await.unwrap();
        assert_eq!(note.title, "Title");
    }

    #[tokio::test]
    async fn list_active_reminders_excludes_completed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/reminders"))
            .and(query_param("is_completed", "eq.false"))
            .and(query_param("order", "remind_at.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let reminders = gateway(&server, true)
            .list_active_reminders("user-1")
            .await
            .unwrap();
        assert!(reminders.is_empty());
    }

    #[tokio::test]
    async fn update_reminder_sends_explicit_null_handle() {
        let server = MockServer::start().await;
        let id = ReminderId::new();
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/reminders"))
            .and(query_param("id", format!("eq.{id}")))
            .and(body_json(serde_json::json!({
                "is_completed": true,
                "notification_id": null
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        gateway(&server, true)
            .update_reminder(&id, &ReminderPatch::completed())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn signed_out_requests_use_anon_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/notes"))
            .and(query_param("limit", "1"))
            .and(header("authorization", "Bearer anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        gateway(&server, false).ping().await.unwrap();
    }

    #[tokio::test]
    async fn postgrest_errors_pass_message_through() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/notes"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "code": "42501",
                "details": null,
                "hint": null,
                "message": "new row violates row-level security policy for table \"notes\""
            })))
            .mount(&server)
            .await;

        let error = gateway(&server, true)
            .delete_note(&NoteId::new())
            .await
            .unwrap_err();
        assert!(!error.is_offline());
        assert_eq!(
            error.to_string(),
            "new row violates row-level security policy for table \"notes\""
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_offline() {
        let config = ClientConfig::from_parts(
            Some("http://127.0.0.1:9".into()),
            Some("anon".into()),
            None,
        )
        .unwrap();
        let gateway =
            PostgrestGateway::new(&config, Arc::new(StaticSession::default())).unwrap();

        let error = gateway.ping().await.unwrap_err();
        assert!(error.is_offline());
    }

    #[test]
    fn error_body_without_message_falls_back_to_status() {
        assert_eq!(
            parse_postgrest_error(StatusCode::BAD_GATEWAY, ""),
            "HTTP 502"
        );
        assert_eq!(
            parse_postgrest_error(StatusCode::BAD_REQUEST, "plain failure"),
            "plain failure"
        );
    }
}
