// ABOUTME: Client factory and typed REST surface for the Appwrite-compatible backend platform
// ABOUTME: Admin clients carry the service API key, session clients carry an end-user session secret

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("platform returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl PlatformError {
    /// The platform rejected a create because the record already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, PlatformError::Api { status: 409, .. })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn api_error(status: u16, body: &str) -> PlatformError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());
    PlatformError::Api { status, message }
}

/// Email token issued by the platform; the secret itself goes to the user's inbox.
#[derive(Debug, Deserialize)]
pub struct Token {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentList<T> {
    pub total: u64,
    pub documents: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "sizeOriginal")]
    pub size_original: u64,
}

/// A single query filter, serialized into the platform's JSON query syntax.
#[derive(Debug, Clone)]
pub struct Query(Value);

impl Query {
    pub fn equal(attribute: &str, value: &str) -> Self {
        Self(json!({"method": "equal", "attribute": attribute, "values": [value]}))
    }

    pub fn equal_any(attribute: &str, values: &[String]) -> Self {
        Self(json!({"method": "equal", "attribute": attribute, "values": values}))
    }

    /// Substring match on strings, membership on array attributes.
    pub fn contains(attribute: &str, value: &str) -> Self {
        Self(json!({"method": "contains", "attribute": attribute, "values": [value]}))
    }

    pub fn or(queries: Vec<Query>) -> Self {
        let values: Vec<Value> = queries.into_iter().map(|q| q.0).collect();
        Self(json!({"method": "or", "values": values}))
    }

    pub fn order_asc(attribute: &str) -> Self {
        Self(json!({"method": "orderAsc", "attribute": attribute}))
    }

    pub fn order_desc(attribute: &str) -> Self {
        Self(json!({"method": "orderDesc", "attribute": attribute}))
    }

    pub fn limit(count: u32) -> Self {
        Self(json!({"method": "limit", "values": [count]}))
    }

    pub(crate) fn encode(&self) -> String {
        self.0.to_string()
    }
}

enum Auth {
    Key(String),
    Session(String),
}

/// One client per request; construction is cheap and holds no cross-request state.
pub struct Client {
    http: reqwest::Client,
    endpoint: String,
    project: String,
    auth: Auth,
}

/// Client holding the long-lived service credentials. Account issuance and
/// cross-user lookups only; never use it for reads the platform should
/// access-control per user.
pub fn create_admin_client(config: &Config) -> Client {
    Client::new(config, Auth::Key(config.api_key.clone()))
}

/// Client scoped to the end-user session secret read from the cookie.
pub fn create_session_client(config: &Config, secret: &str) -> Client {
    Client::new(config, Auth::Session(secret.to_string()))
}

impl Client {
    fn new(config: &Config, auth: Auth) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            project: config.project.clone(),
            auth,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.endpoint, path);
        let builder = self
            .http
            .request(method, url)
            .header("x-appwrite-project", &self.project);
        match &self.auth {
            Auth::Key(key) => builder.header("x-appwrite-key", key),
            Auth::Session(secret) => builder.header("x-appwrite-session", secret),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, PlatformError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), PlatformError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(())
    }

    // Account operations

    /// Ask the platform to email a one-time passcode. Creates an unregistered
    /// account placeholder when the email has never been seen.
    pub async fn create_email_token(&self, email: &str) -> Result<Token, PlatformError> {
        let body = json!({"userId": "unique()", "email": email});
        self.send(self.request(Method::POST, "/account/tokens/email").json(&body))
            .await
    }

    /// Exchange an account id and emailed passcode for a session.
    pub async fn create_session(
        &self,
        account_id: &str,
        secret: &str,
    ) -> Result<Session, PlatformError> {
        let body = json!({"userId": account_id, "secret": secret});
        self.send(self.request(Method::POST, "/account/sessions/token").json(&body))
            .await
    }

    /// Resolve the account behind this client's session secret.
    pub async fn get_account(&self) -> Result<Account, PlatformError> {
        self.send(self.request(Method::GET, "/account")).await
    }

    pub async fn delete_current_session(&self) -> Result<(), PlatformError> {
        self.send_empty(self.request(Method::DELETE, "/account/sessions/current"))
            .await
    }

    // Document operations

    fn documents_path(&self, database_id: &str, collection_id: &str) -> String {
        format!(
            "/databases/{}/collections/{}/documents",
            urlencoding::encode(database_id),
            urlencoding::encode(collection_id)
        )
    }

    fn document_path(&self, database_id: &str, collection_id: &str, document_id: &str) -> String {
        format!(
            "{}/{}",
            self.documents_path(database_id, collection_id),
            urlencoding::encode(document_id)
        )
    }

    pub async fn create_document<T: DeserializeOwned>(
        &self,
        database_id: &str,
        collection_id: &str,
        data: &Value,
    ) -> Result<T, PlatformError> {
        let body = json!({"documentId": "unique()", "data": data});
        let path = self.documents_path(database_id, collection_id);
        self.send(self.request(Method::POST, &path).json(&body)).await
    }

    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList<T>, PlatformError> {
        let params: Vec<(&str, String)> =
            queries.iter().map(|q| ("queries[]", q.encode())).collect();
        let path = self.documents_path(database_id, collection_id);
        self.send(self.request(Method::GET, &path).query(&params)).await
    }

    pub async fn update_document<T: DeserializeOwned>(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Value,
    ) -> Result<T, PlatformError> {
        let body = json!({"data": data});
        let path = self.document_path(database_id, collection_id, document_id);
        self.send(self.request(Method::PATCH, &path).json(&body)).await
    }

    pub async fn delete_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), PlatformError> {
        let path = self.document_path(database_id, collection_id, document_id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    // Storage operations

    pub async fn create_file(
        &self,
        bucket_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredFile, PlatformError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("fileId", "unique()")
            .part("file", part);
        let path = format!("/storage/buckets/{}/files", urlencoding::encode(bucket_id));
        self.send(self.request(Method::POST, &path).multipart(form)).await
    }

    pub async fn delete_file(&self, bucket_id: &str, file_id: &str) -> Result<(), PlatformError> {
        let path = format!(
            "/storage/buckets/{}/files/{}",
            urlencoding::encode(bucket_id),
            urlencoding::encode(file_id)
        );
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    /// URL the browser can render the stored bytes from.
    pub fn file_view_url(&self, bucket_id: &str, file_id: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}",
            self.endpoint,
            urlencoding::encode(bucket_id),
            urlencoding::encode(file_id),
            urlencoding::encode(&self.project)
        )
    }

    /// URL that forces a download of the stored bytes.
    pub fn file_download_url(&self, bucket_id: &str, file_id: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/download?project={}",
            self.endpoint,
            urlencoding::encode(bucket_id),
            urlencoding::encode(file_id),
            urlencoding::encode(&self.project)
        )
    }
}
