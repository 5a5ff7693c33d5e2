use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    error::{OrganizerError, Result},
    store::FileStore,
    types::{File, Folder},
};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const FILE_FIELDS: &str =
    "nextPageToken, files(id, name, parents, mimeType, fileExtension, md5Checksum, size)";
const FOLDER_FIELDS: &str = "nextPageToken, files(id, name)";

/// Google Drive backed file store
///
/// Talks to the Drive v3 REST API with a caller-supplied OAuth access token:
/// - `files.list` (paginated) for folder and file listings
/// - `files.update` for moves and renames
/// - `files.create` for new folders
#[derive(Clone)]
pub struct DriveStore {
    client: Client,
    base_url: String,
    access_token: String,
    page_size: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveEntry {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    mime_type: Option<String>,
    file_extension: Option<String>,
    md5_checksum: Option<String>,
    size: Option<String>,
}

impl DriveEntry {
    /// Entries without an id or name are unusable and dropped
    fn into_file(self) -> Option<File> {
        Some(File {
            id: self.id?,
            name: self.name?,
            parents: self.parents,
            mime_type: self.mime_type,
            size: self.size,
            content_fingerprint: self.md5_checksum,
            file_extension: self.file_extension,
        })
    }

    fn into_folder(self) -> Option<Folder> {
        Some(Folder {
            id: self.id?,
            name: self.name?,
        })
    }
}

impl DriveStore {
    /// Create a store using the public Drive endpoint
    pub fn new(access_token: String) -> Self {
        let client = Client::builder()
            .user_agent("drive-organizer/0.1")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Point the store at another endpoint (proxies, local test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Number of entries requested per listing page
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }

    /// Fetch every page of a `files.list` query
    async fn list_all(&self, query: &str, fields: &str, parent: &Folder) -> Result<Vec<DriveEntry>> {
        let page_size = self.page_size.to_string();
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.authorized(self.client.get(self.url("files"))).query(&[
                ("q", query),
                ("fields", fields),
                ("pageSize", page_size.as_str()),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = check_status(request.send().await?, &parent.id).await?;
            let page: DriveFileList = response.json().await?;
            debug!("{}: {} more entries", parent.name, page.files.len());
            entries.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(entries)
    }
}

/// Quote a value for use inside a single-quoted Drive query literal
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn children_query(parent: &Folder, folders: bool) -> String {
    let operator = if folders { "=" } else { "!=" };
    format!(
        "mimeType {} '{}' and '{}' in parents and trashed = false",
        operator,
        FOLDER_MIME_TYPE,
        quote(&parent.id)
    )
}

/// Map non-success statuses onto organizer errors
async fn check_status(response: Response, id: &str) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(OrganizerError::NotFound { id: id.to_string() }),
        StatusCode::UNAUTHORIZED => {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Drive rejected the access token".to_string());
            Err(OrganizerError::Unauthorized { message })
        }
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Drive API rate limit exceeded".to_string());
            Err(OrganizerError::RateLimited { message })
        }
        status => {
            let message = format!(
                "Unexpected status {}: {}",
                status,
                response.text().await.unwrap_or_default()
            );
            Err(OrganizerError::InvalidResponse { message })
        }
    }
}

#[async_trait]
impl FileStore for DriveStore {
    async fn list_folders(&self, parent: &Folder) -> Result<Vec<Folder>> {
        let entries = self
            .list_all(&children_query(parent, true), FOLDER_FIELDS, parent)
            .await?;
        Ok(entries.into_iter().filter_map(DriveEntry::into_folder).collect())
    }

    async fn list_files(&self, parent: &Folder) -> Result<Vec<File>> {
        let entries = self
            .list_all(&children_query(parent, false), FILE_FIELDS, parent)
            .await?;
        Ok(entries.into_iter().filter_map(DriveEntry::into_file).collect())
    }

    async fn move_file(&self, file: &File, new_parent_id: &str) -> Result<bool> {
        let mut request = self
            .authorized(self.client.patch(self.url(&format!("files/{}", file.id))))
            .query(&[("addParents", new_parent_id), ("fields", "id, parents")]);
        if !file.parents.is_empty() {
            request = request.query(&[("removeParents", file.parents.join(",").as_str())]);
        }

        let response = check_status(request.json(&json!({})).send().await?, &file.id).await?;
        let updated: DriveEntry = response.json().await?;
        Ok(updated.parents.iter().any(|id| id == new_parent_id))
    }

    async fn rename_file(&self, file: &File, new_name: &str) -> Result<bool> {
        let request = self
            .authorized(self.client.patch(self.url(&format!("files/{}", file.id))))
            .query(&[("fields", "id, name")])
            .json(&json!({ "name": new_name }));

        let response = check_status(request.send().await?, &file.id).await?;
        let updated: DriveEntry = response.json().await?;
        Ok(updated.name.as_deref() == Some(new_name))
    }

    async fn create_folder(&self, parent: &Folder, name: &str) -> Result<Folder> {
        let request = self
            .authorized(self.client.post(self.url("files")))
            .query(&[("fields", "id, name")])
            .json(&json!({
                "name": name,
                "parents": [parent.id],
                "mimeType": FOLDER_MIME_TYPE,
            }));

        let response = check_status(request.send().await?, &parent.id).await?;
        let created: DriveEntry = response.json().await?;
        created
            .into_folder()
            .ok_or_else(|| OrganizerError::InvalidResponse {
                message: format!("Drive returned no id for new folder {}", name),
            })
    }

    fn identifier(&self) -> String {
        format!("drive://{}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn store(server: &mockito::ServerGuard) -> DriveStore {
        DriveStore::new("token".to_string())
            .with_base_url(server.url())
            .with_page_size(2)
    }

    #[test]
    fn test_children_query() {
        let parent = Folder::new("it's", "Odd");
        assert_eq!(
            children_query(&parent, true),
            "mimeType = 'application/vnd.google-apps.folder' and 'it\\'s' in parents and trashed = false"
        );
        assert!(children_query(&parent, false).starts_with("mimeType != "));
    }

    #[test]
    fn test_entry_without_id_is_dropped() {
        let entry: DriveEntry = serde_json::from_str(r#"{"name":"orphan"}"#).unwrap();
        assert!(entry.into_file().is_none());
    }

    #[tokio::test]
    async fn test_list_files_follows_page_tokens() {
        let mut server = mockito::Server::new_async().await;
        let parent = Folder::new("root-id", "Root");
        let query = children_query(&parent, false);

        let first = server
            .mock("GET", "/files")
            .match_header("authorization", "Bearer token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), query.clone()),
                Matcher::UrlEncoded("pageSize".into(), "2".into()),
            ]))
            .with_body(
                r#"{"nextPageToken":"page-2","files":[
                    {"id":"1","name":"a.pdf","parents":["root-id"],"mimeType":"application/pdf","md5Checksum":"aa","size":"10"},
                    {"name":"no-id.txt"}
                ]}"#,
            )
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/files")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), query.clone()),
                Matcher::UrlEncoded("pageToken".into(), "page-2".into()),
            ]))
            .with_body(r#"{"files":[{"id":"2","name":"b.pdf","parents":["root-id"]}]}"#)
            .expect(1)
            .create_async()
            .await;

        let files = store(&server).list_files(&parent).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].content_fingerprint.as_deref(), Some("aa"));
        assert_eq!(files[1].name, "b.pdf");
        assert_eq!(files[1].mime_type, None);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut server = mockito::Server::new_async().await;
        let _limited = server
            .mock("GET", "/files")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;
        let _missing = server
            .mock("PATCH", "/files/gone")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        let _unauthorized = server
            .mock("POST", "/files")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let store = store(&server);
        let parent = Folder::new("p", "P");

        assert!(matches!(
            store.list_folders(&parent).await,
            Err(OrganizerError::RateLimited { message }) if message == "slow down"
        ));
        assert!(matches!(
            store.rename_file(&File::new("gone", "x"), "y").await,
            Err(OrganizerError::NotFound { id }) if id == "gone"
        ));
        assert!(matches!(
            store.create_folder(&parent, "new").await,
            Err(OrganizerError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_move_file_checks_new_parent() {
        let mut server = mockito::Server::new_async().await;
        let _moved = server
            .mock("PATCH", "/files/f1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("addParents".into(), "dest".into()),
                Matcher::UrlEncoded("removeParents".into(), "old1,old2".into()),
            ]))
            .with_body(r#"{"id":"f1","parents":["dest"]}"#)
            .create_async()
            .await;
        let _ignored = server
            .mock("PATCH", "/files/f2")
            .match_query(Matcher::UrlEncoded("addParents".into(), "dest".into()))
            .with_body(r#"{"id":"f2","parents":["old"]}"#)
            .create_async()
            .await;

        let store = store(&server);
        let mut moved = File::new("f1", "a.txt");
        moved.parents = vec!["old1".to_string(), "old2".to_string()];
        assert!(store.move_file(&moved, "dest").await.unwrap());

        let stuck = File::new("f2", "b.txt").in_folder("old");
        assert!(!store.move_file(&stuck, "dest").await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_file_checks_returned_name() {
        let mut server = mockito::Server::new_async().await;
        let _renamed = server
            .mock("PATCH", "/files/f1")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({ "name": "Taxes_2023.pdf" })))
            .with_body(r#"{"id":"f1","name":"Taxes_2023.pdf"}"#)
            .create_async()
            .await;
        let _unchanged = server
            .mock("PATCH", "/files/f2")
            .match_query(Matcher::Any)
            .with_body(r#"{"id":"f2","name":"2023.pdf"}"#)
            .create_async()
            .await;

        let store = store(&server);
        assert!(store
            .rename_file(&File::new("f1", "2023.pdf"), "Taxes_2023.pdf")
            .await
            .unwrap());
        assert!(!store
            .rename_file(&File::new("f2", "2023.pdf"), "Taxes_2023.pdf")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_duplicates_folder_created_once_missing() {
        let mut server = mockito::Server::new_async().await;
        let _listing = server
            .mock("GET", "/files")
            .match_query(Matcher::Any)
            .with_body(r#"{"files":[{"id":"x","name":"Other"}]}"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/files")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({
                "name": "0000_duplicates",
                "parents": ["p"],
                "mimeType": FOLDER_MIME_TYPE,
            })))
            .with_body(r#"{"id":"dupes","name":"0000_duplicates"}"#)
            .expect(1)
            .create_async()
            .await;

        let folder = store(&server)
            .get_or_create_duplicates_folder(&Folder::new("p", "P"))
            .await
            .unwrap();

        create.assert_async().await;
        assert_eq!(folder, Folder::new("dupes", "0000_duplicates"));
    }
}
