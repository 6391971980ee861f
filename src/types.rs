// ABOUTME: Type definitions for API requests, responses, and platform documents
// ABOUTME: Includes user/file document models, the file-action enum, and space usage summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User document as stored in the platform's users collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    #[serde(rename = "$id")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    pub account_id: String,
}

/// File document as stored in the platform's files collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDoc {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub url: String,
    pub extension: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub size: u64,
    pub owner: String,
    pub account_id: String,
    pub users: Vec<String>,
    pub bucket_file_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Document,
    Image,
    Video,
    Audio,
    Other,
}

impl FileType {
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" | "doc" | "docx" | "txt" | "xls" | "xlsx" | "csv" | "rtf" | "ods" | "ppt"
            | "odp" | "md" | "html" | "htm" | "epub" | "pages" | "fig" | "psd" | "ai" | "indd"
            | "xd" | "sketch" => FileType::Document,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" | "heic" => FileType::Image,
            "mp4" | "avi" | "mov" | "mkv" | "webm" => FileType::Video,
            "mp3" | "wav" | "ogg" | "flac" | "aac" | "m4a" => FileType::Audio,
            _ => FileType::Other,
        }
    }
}

/// Split a file name into its category and extension.
pub fn get_file_type(file_name: &str) -> (FileType, String) {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if extension.is_empty() {
        return (FileType::Other, extension);
    }
    (FileType::from_extension(&extension), extension)
}

// Identity API types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySecretRequest {
    pub account_id: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySecretResponse {
    pub session_id: Option<String>,
}

// File API types

/// One mutating action against a file document. The tag picks the handler
/// statically; every variant carries the revalidation path for the UI view
/// it invalidates.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum FileActionRequest {
    #[serde(rename_all = "camelCase")]
    Rename {
        name: String,
        extension: String,
        path: String,
    },
    #[serde(rename_all = "camelCase")]
    Share { emails: Vec<String>, path: String },
    #[serde(rename_all = "camelCase")]
    Delete {
        bucket_file_id: String,
        path: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileActionResponse {
    pub success: bool,
    /// Opaque token naming the UI view the caller must refresh.
    pub revalidate: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesParams {
    /// Comma-separated file categories, e.g. `image,video`.
    #[serde(default)]
    pub types: Option<String>,
    #[serde(default)]
    pub search_text: Option<String>,
    /// `field-order`, e.g. `$createdAt-desc` or `name-asc`.
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    pub total: u64,
    pub files: Vec<FileDoc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file: FileDoc,
    pub revalidate: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrlResponse {
    pub url: String,
}

// Space usage

pub const TOTAL_BUCKET_ALLOWANCE: u64 = 2 * 1024 * 1024 * 1024; // 2 GiB

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub size: u64,
    pub latest_date: Option<DateTime<Utc>>,
}

impl CategorySummary {
    fn add(&mut self, file: &FileDoc) {
        self.size += file.size;
        if self.latest_date.map_or(true, |d| file.updated_at > d) {
            self.latest_date = Some(file.updated_at);
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalSpace {
    pub document: CategorySummary,
    pub image: CategorySummary,
    pub video: CategorySummary,
    pub audio: CategorySummary,
    pub other: CategorySummary,
    pub used: u64,
    pub all: u64,
}

impl TotalSpace {
    pub fn new() -> Self {
        Self {
            all: TOTAL_BUCKET_ALLOWANCE,
            ..Self::default()
        }
    }

    pub fn add(&mut self, file: &FileDoc) {
        let category = match file.file_type {
            FileType::Document => &mut self.document,
            FileType::Image => &mut self.image,
            FileType::Video => &mut self.video,
            FileType::Audio => &mut self.audio,
            FileType::Other => &mut self.other,
        };
        category.add(file);
        self.used += file.size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(name: &str, size: u64, day: u32) -> FileDoc {
        let (file_type, extension) = get_file_type(name);
        let stamp = Utc.with_ymd_and_hms(2025, 6, day, 0, 0, 0).unwrap();
        FileDoc {
            id: format!("doc-{name}"),
            created_at: stamp,
            updated_at: stamp,
            name: name.to_string(),
            url: String::new(),
            extension,
            file_type,
            size,
            owner: "u1".to_string(),
            account_id: "acc1".to_string(),
            users: Vec::new(),
            bucket_file_id: format!("bucket-{name}"),
        }
    }

    #[test]
    fn categorizes_by_extension() {
        assert_eq!(get_file_type("report.PDF"), (FileType::Document, "pdf".into()));
        assert_eq!(get_file_type("photo.jpeg"), (FileType::Image, "jpeg".into()));
        assert_eq!(get_file_type("clip.mov"), (FileType::Video, "mov".into()));
        assert_eq!(get_file_type("song.flac"), (FileType::Audio, "flac".into()));
        assert_eq!(get_file_type("archive.zip"), (FileType::Other, "zip".into()));
        assert_eq!(get_file_type("Makefile"), (FileType::Other, "".into()));
    }

    #[test]
    fn total_space_sums_per_category_and_tracks_latest() {
        let mut space = TotalSpace::new();
        space.add(&file("a.pdf", 100, 1));
        space.add(&file("b.pdf", 50, 3));
        space.add(&file("c.png", 200, 2));

        assert_eq!(space.document.size, 150);
        assert_eq!(space.image.size, 200);
        assert_eq!(space.used, 350);
        assert_eq!(space.all, TOTAL_BUCKET_ALLOWANCE);
        assert_eq!(
            space.document.latest_date,
            Some(Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn file_action_request_dispatches_on_tag() {
        let req: FileActionRequest = serde_json::from_value(serde_json::json!({
            "action": "rename",
            "name": "notes",
            "extension": "txt",
            "path": "/documents"
        }))
        .unwrap();
        assert!(matches!(req, FileActionRequest::Rename { .. }));

        let req: FileActionRequest = serde_json::from_value(serde_json::json!({
            "action": "delete",
            "bucketFileId": "b1",
            "path": "/"
        }))
        .unwrap();
        assert!(matches!(req, FileActionRequest::Delete { .. }));
    }

    #[test]
    fn file_doc_round_trips_platform_field_names() {
        let doc: FileDoc = serde_json::from_value(serde_json::json!({
            "$id": "d1",
            "$createdAt": "2025-06-01T00:00:00.000+00:00",
            "$updatedAt": "2025-06-02T00:00:00.000+00:00",
            "name": "a.pdf",
            "url": "https://backend.example/view",
            "extension": "pdf",
            "type": "document",
            "size": 9,
            "owner": "u1",
            "accountId": "acc1",
            "users": ["b@x.com"],
            "bucketFileId": "bf1"
        }))
        .unwrap();
        assert_eq!(doc.id, "d1");
        assert_eq!(doc.file_type, FileType::Document);
        assert_eq!(doc.users, vec!["b@x.com".to_string()]);
    }
}
