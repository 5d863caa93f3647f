pub mod download;
pub mod http_client;

pub use download::{download_to_file_with_options, DownloadOptions, ErrorType};
pub use http_client::HttpDownloader;

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 一次下载请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub cookie: Option<String>,
    pub sha256: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cookie: None,
            sha256: None,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// 下载完成后按 SHA-256 校验
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }
}

/// 下载器接口
#[async_trait]
pub trait Downloader: Send + Sync {
    /// 把请求的内容写入 `dest`
    async fn download(&self, request: &DownloadRequest, dest: &Path) -> AppResult<()>;
}

/// 下载到临时目录中的文件，句柄释放时连同目录一起删除
#[derive(Debug)]
pub struct DownloadedFile {
    path: PathBuf,
    _dir: TempDir,
}

impl DownloadedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 下载到新的临时目录
pub async fn fetch(downloader: &dyn Downloader, request: &DownloadRequest) -> AppResult<DownloadedFile> {
    let dir = TempDir::new()?;
    let path = dir.path().join(file_name_from_url(&request.url)?);

    log::debug!("下载 {} -> {}", request.url, path.display());
    downloader.download(request, &path).await?;

    if !path.exists() {
        return Err(AppError::Download {
            url: request.url.clone(),
            reason: "下载完成后未找到文件".to_string(),
        });
    }

    Ok(DownloadedFile { path, _dir: dir })
}

/// 从下载地址中提取文件名
///
/// SourceForge 的地址以 `/download` 结尾，此时取前一段。
pub fn file_name_from_url(raw: &str) -> AppResult<String> {
    let parsed = url::Url::parse(raw).map_err(|e| AppError::Download {
        url: raw.to_string(),
        reason: format!("无效的 URL: {}", e),
    })?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let name = match segments.as_slice() {
        [.., name, "download"] => *name,
        [.., name] => *name,
        [] => "",
    };

    let decoded = urlencoding::decode(name)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| name.to_string());

    if decoded.is_empty() || decoded.contains(['/', '\\']) {
        return Err(AppError::Download {
            url: raw.to_string(),
            reason: "无法从 URL 推断文件名".to_string(),
        });
    }

    Ok(decoded)
}
