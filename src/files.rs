// ABOUTME: File action service: upload, list, rename, share, delete, space usage
// ABOUTME: Every mutation echoes its revalidation path so the UI knows which view went stale

use axum::{
    extract::{Multipart, Path, Query as UrlQuery, State},
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::appwrite::{self, Query};
use crate::auth::{self, Resolution};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::session;
use crate::types::{
    get_file_type, DownloadUrlResponse, FileActionRequest, FileActionResponse, FileDoc,
    FileListResponse, ListFilesParams, TotalSpace, UploadResponse, UserDoc,
};
use crate::AppState;

/// Store the bytes in the bucket, then create the metadata document. The
/// stored object must not outlive a failed document create.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let config = &state.config;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut owner_id: Option<String> = None;
    let mut account_id: Option<String> = None;
    let mut path: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((name, content_type, bytes.to_vec()));
            }
            Some("ownerId") => owner_id = Some(read_text(field).await?),
            Some("accountId") => account_id = Some(read_text(field).await?),
            Some("path") => path = Some(read_text(field).await?),
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AppError::BadRequest("missing file field".to_string()))?;
    let owner_id = owner_id.ok_or_else(|| AppError::BadRequest("missing ownerId".to_string()))?;
    let account_id =
        account_id.ok_or_else(|| AppError::BadRequest("missing accountId".to_string()))?;
    let path = path.ok_or_else(|| AppError::BadRequest("missing path".to_string()))?;

    let (file_type, extension) = get_file_type(&file_name);

    let admin = appwrite::create_admin_client(config);
    let stored = admin
        .create_file(&config.bucket_id, &file_name, bytes, &content_type)
        .await?;

    let data = json!({
        "type": file_type,
        "name": stored.name,
        "url": admin.file_view_url(&config.bucket_id, &stored.id),
        "extension": extension,
        "size": stored.size_original,
        "owner": owner_id,
        "accountId": account_id,
        "users": [],
        "bucketFileId": stored.id,
    });

    match admin
        .create_document::<FileDoc>(&config.database_id, &config.files_collection_id, &data)
        .await
    {
        Ok(created) => Ok(Json(UploadResponse {
            file: created,
            revalidate: path,
        })),
        Err(err) => {
            if let Err(cleanup) = admin.delete_file(&config.bucket_id, &stored.id).await {
                tracing::error!(
                    "failed to remove stored object {} after document failure: {}",
                    stored.id,
                    cleanup
                );
            }
            Err(AppError::Platform(err))
        }
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Files the current user owns or is shared into, filtered and sorted per the
/// query string. Reads go through the session client so the platform applies
/// its own access rules.
pub async fn list_files(
    State(state): State<AppState>,
    jar: CookieJar,
    UrlQuery(params): UrlQuery<ListFilesParams>,
) -> Result<Json<FileListResponse>> {
    let config = &state.config;
    let (secret, user) = require_session(config, &jar).await?;

    let queries = build_file_queries(&user, &params)?;
    let client = appwrite::create_session_client(config, &secret);
    let result = client
        .list_documents::<FileDoc>(&config.database_id, &config.files_collection_id, &queries)
        .await
        .map_err(|e| AppError::Lookup(e.to_string()))?;

    Ok(Json(FileListResponse {
        total: result.total,
        files: result.documents,
    }))
}

pub async fn file_action(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Json(req): Json<FileActionRequest>,
) -> Result<Json<FileActionResponse>> {
    let config = &state.config;
    let revalidate = match req {
        FileActionRequest::Rename {
            name,
            extension,
            path,
        } => {
            rename_file(config, &file_id, &name, &extension).await?;
            path
        }
        FileActionRequest::Share { emails, path } => {
            update_file_users(config, &file_id, &emails).await?;
            path
        }
        FileActionRequest::Delete {
            bucket_file_id,
            path,
        } => {
            delete_file(config, &file_id, &bucket_file_id).await?;
            path
        }
    };

    Ok(Json(FileActionResponse {
        success: true,
        revalidate,
    }))
}

/// Per-category byte totals for everything the current user owns.
pub async fn total_space_used(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<TotalSpace>> {
    let config = &state.config;
    let (secret, user) = require_session(config, &jar).await?;

    let client = appwrite::create_session_client(config, &secret);
    let result = client
        .list_documents::<FileDoc>(
            &config.database_id,
            &config.files_collection_id,
            &[Query::equal("owner", &user.id)],
        )
        .await
        .map_err(|e| AppError::Lookup(e.to_string()))?;

    let mut space = TotalSpace::new();
    for file in &result.documents {
        space.add(file);
    }
    Ok(Json(space))
}

pub async fn download_url(
    State(state): State<AppState>,
    Path(bucket_file_id): Path<String>,
) -> Json<DownloadUrlResponse> {
    let admin = appwrite::create_admin_client(&state.config);
    Json(DownloadUrlResponse {
        url: admin.file_download_url(&state.config.bucket_id, &bucket_file_id),
    })
}

async fn require_session(
    config: &Config,
    jar: &CookieJar,
) -> Result<(String, UserDoc)> {
    let Some(secret) = session::session_secret(jar) else {
        return Err(AppError::Unauthorized("no session cookie".to_string()));
    };
    match auth::resolve_current_user(config, jar).await {
        Resolution::Found(user) => Ok((secret, user)),
        absent => Err(AppError::Unauthorized(format!("no current user: {absent:?}"))),
    }
}

fn build_file_queries(user: &UserDoc, params: &ListFilesParams) -> Result<Vec<Query>> {
    let mut queries = vec![Query::or(vec![
        Query::equal("owner", &user.id),
        Query::contains("users", &user.email),
    ])];

    if let Some(types) = &params.types {
        let types: Vec<String> = types
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !types.is_empty() {
            queries.push(Query::equal_any("type", &types));
        }
    }

    if let Some(search) = params.search_text.as_deref().filter(|s| !s.is_empty()) {
        queries.push(Query::contains("name", search));
    }

    if let Some(limit) = params.limit {
        queries.push(Query::limit(limit));
    }

    let sort = params.sort.as_deref().unwrap_or("$createdAt-desc");
    let (field, order) = sort
        .rsplit_once('-')
        .ok_or_else(|| AppError::BadRequest(format!("invalid sort key: {sort}")))?;
    queries.push(match order {
        "asc" => Query::order_asc(field),
        "desc" => Query::order_desc(field),
        _ => return Err(AppError::BadRequest(format!("invalid sort order: {order}"))),
    });

    Ok(queries)
}

async fn rename_file(
    config: &Config,
    file_id: &str,
    name: &str,
    extension: &str,
) -> Result<FileDoc> {
    let new_name = if extension.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{extension}")
    };
    let admin = appwrite::create_admin_client(config);
    Ok(admin
        .update_document(
            &config.database_id,
            &config.files_collection_id,
            file_id,
            &json!({"name": new_name}),
        )
        .await?)
}

/// Full overwrite of the access list; removing one user means the caller
/// recomputes the list and resubmits it whole.
async fn update_file_users(
    config: &Config,
    file_id: &str,
    emails: &[String],
) -> Result<FileDoc> {
    let admin = appwrite::create_admin_client(config);
    Ok(admin
        .update_document(
            &config.database_id,
            &config.files_collection_id,
            file_id,
            &json!({"users": emails}),
        )
        .await?)
}

/// Metadata document first, stored bytes second. A failure between the two
/// steps can only orphan unreferenced bytes, never leave a document pointing
/// at deleted storage. Success is reported only when both deletions succeed.
async fn delete_file(
    config: &Config,
    file_id: &str,
    bucket_file_id: &str,
) -> Result<()> {
    let admin = appwrite::create_admin_client(config);
    admin
        .delete_document(&config.database_id, &config.files_collection_id, file_id)
        .await?;
    admin.delete_file(&config.bucket_id, bucket_file_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn user() -> UserDoc {
        UserDoc {
            id: "u1".to_string(),
            full_name: "Alice".to_string(),
            email: "a@b.com".to_string(),
            avatar: String::new(),
            account_id: "acc1".to_string(),
        }
    }

    fn params(types: Option<&str>, search: Option<&str>, sort: Option<&str>) -> ListFilesParams {
        ListFilesParams {
            types: types.map(str::to_string),
            search_text: search.map(str::to_string),
            sort: sort.map(str::to_string),
            limit: None,
        }
    }

    fn decode(queries: &[Query]) -> Vec<Value> {
        queries
            .iter()
            .map(|q| serde_json::from_str(&q.encode()).unwrap())
            .collect()
    }

    #[test]
    fn default_listing_scopes_to_owned_or_shared_sorted_by_creation() {
        let queries = decode(&build_file_queries(&user(), &params(None, None, None)).unwrap());
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0]["method"], "or");
        assert_eq!(queries[0]["values"][0]["attribute"], "owner");
        assert_eq!(queries[0]["values"][1]["attribute"], "users");
        assert_eq!(queries[1]["method"], "orderDesc");
        assert_eq!(queries[1]["attribute"], "$createdAt");
    }

    #[test]
    fn type_filter_and_search_become_queries() {
        let built = build_file_queries(
            &user(),
            &params(Some("image, video"), Some("holiday"), Some("name-asc")),
        )
        .unwrap();
        let queries = decode(&built);
        assert_eq!(queries[1]["method"], "equal");
        assert_eq!(queries[1]["attribute"], "type");
        assert_eq!(queries[1]["values"], serde_json::json!(["image", "video"]));
        assert_eq!(queries[2]["method"], "contains");
        assert_eq!(queries[2]["attribute"], "name");
        assert_eq!(queries[3]["method"], "orderAsc");
        assert_eq!(queries[3]["attribute"], "name");
    }

    #[test]
    fn malformed_sort_is_rejected() {
        assert!(build_file_queries(&user(), &params(None, None, Some("name"))).is_err());
        assert!(build_file_queries(&user(), &params(None, None, Some("name-sideways"))).is_err());
    }

    #[test]
    fn limit_is_forwarded() {
        let built = build_file_queries(
            &user(),
            &ListFilesParams {
                types: None,
                search_text: None,
                sort: None,
                limit: Some(10),
            },
        )
        .unwrap();
        let queries = decode(&built);
        assert!(queries.iter().any(|q| q["method"] == "limit" && q["values"][0] == 10));
    }
}
