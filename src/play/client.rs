//! HTTP implementation of the publishing API.
//!
//! Thin wrapper over `reqwest` against the androidpublisher v3 endpoints.
//! Metadata calls get a request timeout; media uploads are streamed from disk
//! without one, since APKs and expansion files can be arbitrarily large.

use std::path::Path;
use std::time::Duration;

use reqwest::{Body, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use url::Url;

use super::models::{
    Apk, ApksListResponse, AppEdit, ErrorResponse, ExpansionFile, ExpansionFilesUploadResponse,
    Track,
};
use super::{ApiResult, ExpansionFileType, PublishApi};
use crate::error::ApiError;

/// Production endpoint of the publishing API.
const DEFAULT_BASE_URL: &str = "https://androidpublisher.googleapis.com/";

/// Request timeout for metadata calls. Uploads are exempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// MIME type the API expects for APK payloads.
const APK_MIME_TYPE: &str = "application/vnd.android.package-archive";

/// MIME type for mapping and expansion file payloads.
const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";

/// Google Play publishing API client.
///
/// Credential acquisition is out of scope: the client consumes a ready
/// OAuth2 access token with the `androidpublisher` scope.
#[derive(Debug, Clone)]
pub struct PlayClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl PlayClient {
    /// Creates a client against the production endpoint.
    pub fn new(token: impl Into<String>) -> ApiResult<Self> {
        let base_url = Url::parse(DEFAULT_BASE_URL).expect("default endpoint URL is valid");
        Self::with_base_url(token, base_url)
    }

    /// Creates a client against a custom endpoint.
    pub fn with_base_url(token: impl Into<String>, base_url: Url) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("playship/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    fn edits_path(application_id: &str, rest: &str) -> String {
        format!(
            "androidpublisher/v3/applications/{}/edits{}",
            application_id, rest
        )
    }

    fn upload_path(application_id: &str, rest: &str) -> String {
        format!(
            "upload/androidpublisher/v3/applications/{}/edits{}",
            application_id, rest
        )
    }

    async fn file_body(path: &Path) -> ApiResult<(Body, u64)> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| ApiError::File {
                path: path.to_path_buf(),
                source,
            })?;
        let len = file
            .metadata()
            .await
            .map_err(|source| ApiError::File {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        Ok((Body::wrap_stream(ReaderStream::new(file)), len))
    }

    async fn send(&self, request: reqwest::RequestBuilder, operation: &str) -> ApiResult<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::map_transport(e, operation))?;
        Self::check_status(response, operation).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> ApiResult<T> {
        let response = self.send(request, operation).await?;
        response
            .json()
            .await
            .map_err(|e| Self::map_transport(e, operation))
    }

    fn map_transport(error: reqwest::Error, operation: &str) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                operation: operation.to_string(),
            }
        } else {
            ApiError::Transport(error)
        }
    }

    async fn check_status(response: Response, operation: &str) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorResponse = response.json().await.unwrap_or(ErrorResponse { error: None });
        let messages = body.messages();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let reason = if messages.is_empty() {
                format!("HTTP {} during {}", status.as_u16(), operation)
            } else {
                messages.join("; ")
            };
            return Err(ApiError::Credentials { reason });
        }

        Err(ApiError::Api {
            status: status.as_u16(),
            messages,
        })
    }
}

impl PublishApi for PlayClient {
    async fn open_edit(&self, application_id: &str) -> ApiResult<AppEdit> {
        let url = self.url(&Self::edits_path(application_id, ""));
        self.send_json(
            self.http.post(url).timeout(REQUEST_TIMEOUT),
            "opening the edit",
        )
        .await
    }

    async fn list_apks(&self, application_id: &str, edit_id: &str) -> ApiResult<Vec<Apk>> {
        let url = self.url(&Self::edits_path(
            application_id,
            &format!("/{}/apks", edit_id),
        ));
        let response: ApksListResponse = self
            .send_json(
                self.http.get(url).timeout(REQUEST_TIMEOUT),
                "listing existing APKs",
            )
            .await?;
        Ok(response.apks.unwrap_or_default())
    }

    async fn upload_apk(&self, application_id: &str, edit_id: &str, path: &Path) -> ApiResult<Apk> {
        let mut url = self.url(&Self::upload_path(
            application_id,
            &format!("/{}/apks", edit_id),
        ));
        url.set_query(Some("uploadType=media"));

        let (body, len) = Self::file_body(path).await?;
        log::info!("uploading {} ({} bytes)", path.display(), len);
        self.send_json(
            self.http
                .post(url)
                .header(header::CONTENT_TYPE, APK_MIME_TYPE)
                .header(header::CONTENT_LENGTH, len)
                .body(body),
            "uploading the APK",
        )
        .await
    }

    async fn upload_deobfuscation_file(
        &self,
        application_id: &str,
        edit_id: &str,
        version_code: i64,
        file_type: &str,
        path: &Path,
    ) -> ApiResult<()> {
        let mut url = self.url(&Self::upload_path(
            application_id,
            &format!(
                "/{}/apks/{}/deobfuscationFiles/{}",
                edit_id, version_code, file_type
            ),
        ));
        url.set_query(Some("uploadType=media"));

        let (body, len) = Self::file_body(path).await?;
        self.send(
            self.http
                .post(url)
                .header(header::CONTENT_TYPE, OCTET_STREAM_MIME_TYPE)
                .header(header::CONTENT_LENGTH, len)
                .body(body),
            "uploading the mapping file",
        )
        .await?;
        Ok(())
    }

    async fn get_expansion_file(
        &self,
        application_id: &str,
        edit_id: &str,
        version_code: i64,
        file_type: ExpansionFileType,
    ) -> ApiResult<ExpansionFile> {
        let url = self.url(&Self::edits_path(
            application_id,
            &format!("/{}/apks/{}/expansionFiles/{}", edit_id, version_code, file_type),
        ));
        self.send_json(
            self.http.get(url).timeout(REQUEST_TIMEOUT),
            "reading the expansion file entry",
        )
        .await
    }

    async fn upload_expansion_file(
        &self,
        application_id: &str,
        edit_id: &str,
        version_code: i64,
        file_type: ExpansionFileType,
        path: &Path,
    ) -> ApiResult<()> {
        let mut url = self.url(&Self::upload_path(
            application_id,
            &format!("/{}/apks/{}/expansionFiles/{}", edit_id, version_code, file_type),
        ));
        url.set_query(Some("uploadType=media"));

        let (body, len) = Self::file_body(path).await?;
        log::info!("uploading {} ({} bytes)", path.display(), len);
        let _: ExpansionFilesUploadResponse = self
            .send_json(
                self.http
                    .post(url)
                    .header(header::CONTENT_TYPE, OCTET_STREAM_MIME_TYPE)
                    .header(header::CONTENT_LENGTH, len)
                    .body(body),
                "uploading the expansion file",
            )
            .await?;
        Ok(())
    }

    async fn update_expansion_file(
        &self,
        application_id: &str,
        edit_id: &str,
        version_code: i64,
        file_type: ExpansionFileType,
        file: &ExpansionFile,
    ) -> ApiResult<()> {
        let url = self.url(&Self::edits_path(
            application_id,
            &format!("/{}/apks/{}/expansionFiles/{}", edit_id, version_code, file_type),
        ));
        self.send(
            self.http.put(url).timeout(REQUEST_TIMEOUT).json(file),
            "updating the expansion file entry",
        )
        .await?;
        Ok(())
    }

    async fn assign_track(
        &self,
        application_id: &str,
        edit_id: &str,
        track: &Track,
    ) -> ApiResult<()> {
        let url = self.url(&Self::edits_path(
            application_id,
            &format!("/{}/tracks/{}", edit_id, track.track),
        ));
        self.send(
            self.http.put(url).timeout(REQUEST_TIMEOUT).json(track),
            "assigning the track release",
        )
        .await?;
        Ok(())
    }

    async fn commit_edit(&self, application_id: &str, edit_id: &str) -> ApiResult<()> {
        let url = self.url(&Self::edits_path(
            application_id,
            &format!("/{}:commit", edit_id),
        ));
        self.send(
            self.http.post(url).timeout(REQUEST_TIMEOUT),
            "committing the edit",
        )
        .await?;
        Ok(())
    }
}
