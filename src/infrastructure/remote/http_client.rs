use super::{download_to_file_with_options, DownloadOptions, DownloadRequest, Downloader};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::DownloadConfig;
use crate::infrastructure::installer::utils::create_progress_bar;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// 基于 reqwest 的 HTTP 下载器
pub struct HttpDownloader {
    client: Client,
    config: DownloadConfig,
    show_progress: bool,
}

impl HttpDownloader {
    /// 创建新的 HTTP 下载器
    pub fn new(config: &DownloadConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_sec))
            .timeout(Duration::from_secs(config.read_timeout_sec))
            .user_agent(concat!("winprep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Network {
                message: format!("创建 HTTP 客户端失败: {}", e),
            })?;

        Ok(Self::with_client(client, config))
    }

    /// 使用已经构建好的客户端
    pub fn with_client(client: Client, config: &DownloadConfig) -> Self {
        Self {
            client,
            config: config.clone(),
            show_progress: true,
        }
    }

    /// 关闭进度条输出
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, request: &DownloadRequest, dest: &Path) -> AppResult<()> {
        let mut options = DownloadOptions::from_config(&self.config);
        options.cookie = request.cookie.clone();
        options.expected_sha256 = request.sha256.clone();

        println!("📥 下载 {}", request.url);

        if !self.show_progress {
            return download_to_file_with_options(&self.client, &request.url, dest, |_, _| {}, &options)
                .await;
        }

        let pb = create_progress_bar();
        let pb_clone = pb.clone();
        let result = download_to_file_with_options(
            &self.client,
            &request.url,
            dest,
            move |downloaded, total| {
                if total > 0 && pb_clone.length() != Some(total) {
                    pb_clone.set_length(total);
                }
                pb_clone.set_position(downloaded);
            },
            &options,
        )
        .await;

        match &result {
            Ok(()) => pb.finish_with_message("下载完成"),
            Err(_) => pb.abandon(),
        }
        result
    }
}
