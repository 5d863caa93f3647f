use crate::error::{AppError, AppResult};
use crate::infrastructure::config::DownloadConfig;
use futures_util::StreamExt;
use reqwest::header::COOKIE;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// 错误类型：用于区分临时错误和永久错误
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorType {
    /// 临时错误（网络问题、超时等，可以重试）
    Transient(String),
    /// 永久错误（404、403等，不应重试）
    Permanent(String),
}

/// 下载选项
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub expected_sha256: Option<String>,
    pub cookie: Option<String>,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub exponential_backoff: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self::from_config(&DownloadConfig::default())
    }
}

impl DownloadOptions {
    /// 从配置创建下载选项
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self {
            expected_sha256: None,
            cookie: None,
            retry_count: config.retry_count,
            retry_delay_ms: config.retry_delay_ms,
            exponential_backoff: config.exponential_backoff,
        }
    }

    /// 计算重试延迟（支持指数退避）
    pub(crate) fn calculate_retry_delay(&self, attempt: u32) -> u64 {
        if self.exponential_backoff {
            // 最大不超过 60 秒
            let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
            self.retry_delay_ms.saturating_mul(factor).min(60000)
        } else {
            self.retry_delay_ms
        }
    }
}

/// 单次下载尝试的失败原因
#[derive(Debug)]
struct AttemptError {
    message: String,
    status: Option<u16>,
}

impl AttemptError {
    fn new(message: String) -> Self {
        Self {
            message,
            status: None,
        }
    }
}

/// 判断错误类型
pub(crate) fn classify_error(error: &str, status_code: Option<u16>) -> ErrorType {
    if let Some(code) = status_code {
        match code {
            404 | 403 | 401 => {
                return ErrorType::Permanent(format!("资源不存在或无权访问 (HTTP {})", code))
            }
            500..=599 => return ErrorType::Transient(format!("服务器错误 (HTTP {})", code)),
            _ => {}
        }
    }

    let error_lower = error.to_lowercase();
    if error_lower.contains("timeout") || error_lower.contains("timed out") {
        ErrorType::Transient("连接超时".to_string())
    } else if error_lower.contains("dns") || error_lower.contains("resolve") {
        ErrorType::Transient("DNS 解析失败".to_string())
    } else if error_lower.contains("network") || error_lower.contains("connection") {
        ErrorType::Transient("网络连接问题".to_string())
    } else {
        ErrorType::Transient(error.to_string())
    }
}

/// 验证文件哈希
pub(crate) async fn verify_file_sha256(path: &Path, expected: &str) -> Result<(), String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| e.to_string())?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = file.read(&mut buffer).await.map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[0..n]);
    }

    let actual = hex::encode(hasher.finalize());

    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(format!("SHA256 不匹配: 期望 {}, 实际 {}", expected, actual))
    }
}

/// 下载过程中使用的临时文件，在完整文件名后追加 `.downloading`
pub(crate) fn downloading_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.file_name().unwrap_or_default().to_os_string();
    name.push(".downloading");
    file_path.with_file_name(name)
}

/// 流式下载到文件，支持重试、Cookie 和校验
pub async fn download_to_file_with_options(
    client: &Client,
    url: &str,
    file_path: &Path,
    progress: impl Fn(u64, u64),
    options: &DownloadOptions,
) -> AppResult<()> {
    let mut attempts = 0;

    loop {
        attempts += 1;
        match download_to_file_internal(client, url, file_path, &progress, options).await {
            Ok(()) => {
                if let Some(expected) = &options.expected_sha256 {
                    if let Err(e) = verify_file_sha256(file_path, expected).await {
                        log::warn!(
                            "文件校验失败 (尝试 {}/{}): {}",
                            attempts,
                            options.retry_count + 1,
                            e
                        );
                        let _ = tokio::fs::remove_file(file_path).await;

                        if attempts > options.retry_count {
                            return Err(AppError::Download {
                                url: url.to_string(),
                                reason: format!("校验失败 (已重试 {} 次): {}", options.retry_count, e),
                            });
                        }
                        let delay = options.calculate_retry_delay(attempts);
                        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                        continue;
                    }
                    log::info!("文件 SHA256 校验通过: {}", file_path.display());
                }
                return Ok(());
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(downloading_path(file_path)).await;

                if let ErrorType::Permanent(msg) = classify_error(&e.message, e.status) {
                    return Err(AppError::Download {
                        url: url.to_string(),
                        reason: format!("{}: {}", msg, e.message),
                    });
                }

                if attempts > options.retry_count {
                    return Err(AppError::Download {
                        url: url.to_string(),
                        reason: format!(
                            "已重试 {} 次: {}，文件: {}",
                            options.retry_count,
                            e.message,
                            file_path.display()
                        ),
                    });
                }

                let delay = options.calculate_retry_delay(attempts);
                println!(
                    "⚠️  下载出错 (尝试 {}/{}): {}。{}ms 后重试...",
                    attempts,
                    options.retry_count + 1,
                    e.message,
                    delay
                );
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
        }
    }
}

async fn download_to_file_internal(
    client: &Client,
    url: &str,
    file_path: &Path,
    progress: &impl Fn(u64, u64),
    options: &DownloadOptions,
) -> Result<(), AttemptError> {
    let mut request = client.get(url);
    if let Some(cookie) = &options.cookie {
        request = request.header(COOKIE, cookie);
    }

    let response = request.send().await.map_err(|e| {
        let error_msg = e.to_string();
        if e.is_timeout() {
            AttemptError::new(format!("连接超时: {}", error_msg))
        } else {
            AttemptError::new(format!("网络请求失败: {}", error_msg))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AttemptError {
            message: format!("服务器返回状态码: {}", status),
            status: Some(status.as_u16()),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    // 先写入临时文件，完成后再重命名
    let temp_path = downloading_path(file_path);
    let mut file = tokio::fs::File::create(&temp_path)
        .await
        .map_err(|e| AttemptError::new(format!("创建文件失败: {}", e)))?;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AttemptError::new(format!("读取数据失败: {}", e)))?;
        downloaded += chunk.len() as u64;
        progress(downloaded, total_size);
        file.write_all(&chunk)
            .await
            .map_err(|e| AttemptError::new(format!("写入文件失败: {}", e)))?;
    }

    file.flush()
        .await
        .map_err(|e| AttemptError::new(format!("刷新文件失败: {}", e)))?;
    drop(file);

    tokio::fs::rename(&temp_path, file_path)
        .await
        .map_err(|e| AttemptError::new(format!("重命名文件失败: {}", e)))?;

    Ok(())
}
