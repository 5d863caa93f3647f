use crate::error::{AppError, AppResult};
use crate::infrastructure::config::Config;
use crate::infrastructure::process::{path_arg, CommandRunner, CommandSpec, SystemRunner};
use crate::infrastructure::registry::{system_registry, RegistryWriter};
use crate::infrastructure::remote::{self, DownloadRequest, DownloadedFile, Downloader, HttpDownloader};
use crate::infrastructure::service::{NetServiceController, ServiceController};
use crate::utils::PathUtils;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// 目录加入 PATH 的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPosition {
    Prepend,
    Append,
}

/// 一次准备过程共享的上下文
///
/// 所有与操作系统打交道的部分都通过 trait 对象注入，测试中替换为假实现。
pub struct ProvisionContext {
    pub config: Config,
    pub dry_run: bool,
    runner: Arc<dyn CommandRunner>,
    downloader: Arc<dyn Downloader>,
    registry: Arc<dyn RegistryWriter>,
    services: Arc<dyn ServiceController>,
    /// 子进程和可执行文件查找使用的 PATH，前面步骤加入的目录对后续步骤可见
    search_path: Mutex<Vec<PathBuf>>,
}

impl ProvisionContext {
    /// 使用真实系统实现创建上下文
    pub fn system(config: Config, dry_run: bool, show_progress: bool) -> AppResult<Self> {
        let mut downloader = HttpDownloader::new(&config.download)?;
        if !show_progress {
            downloader = downloader.quiet();
        }

        Ok(Self::new(
            config,
            Arc::new(SystemRunner),
            Arc::new(downloader),
            Arc::from(system_registry()),
            Arc::new(NetServiceController),
        )
        .dry_run(dry_run))
    }

    pub fn new(
        config: Config,
        runner: Arc<dyn CommandRunner>,
        downloader: Arc<dyn Downloader>,
        registry: Arc<dyn RegistryWriter>,
        services: Arc<dyn ServiceController>,
    ) -> Self {
        let search_path = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();

        Self {
            config,
            dry_run: false,
            runner,
            downloader,
            registry,
            services,
            search_path: Mutex::new(search_path),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 替换初始 PATH
    pub fn with_search_path(self, paths: Vec<PathBuf>) -> Self {
        if let Ok(mut guard) = self.search_path.lock() {
            *guard = paths;
        }
        self
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    pub fn registry(&self) -> &dyn RegistryWriter {
        self.registry.as_ref()
    }

    pub fn services(&self) -> &dyn ServiceController {
        self.services.as_ref()
    }

    fn lock_search_path(&self) -> AppResult<MutexGuard<'_, Vec<PathBuf>>> {
        self.search_path.lock().map_err(|_| AppError::Installation {
            message: "PATH 状态锁定失败".to_string(),
        })
    }

    /// 当前 PATH 条目
    pub fn search_path(&self) -> AppResult<Vec<PathBuf>> {
        Ok(self.lock_search_path()?.clone())
    }

    /// 把目录加入进程内 PATH，已存在时返回 false
    pub fn add_search_path(&self, dir: &Path, position: PathPosition) -> AppResult<bool> {
        let mut paths = self.lock_search_path()?;
        if PathUtils::contains(&paths, dir) {
            return Ok(false);
        }
        match position {
            PathPosition::Prepend => paths.insert(0, dir.to_path_buf()),
            PathPosition::Append => paths.push(dir.to_path_buf()),
        }
        Ok(true)
    }

    /// 拼接后的 PATH 值
    pub fn path_env(&self) -> AppResult<OsString> {
        let paths = self.lock_search_path()?;
        env::join_paths(paths.iter()).map_err(|e| AppError::Path {
            path: "PATH".to_string(),
            reason: e.to_string(),
        })
    }

    /// 在当前 PATH 中查找可执行文件
    pub fn which(&self, name: &str) -> Option<PathBuf> {
        let path_env = self.path_env().ok()?;
        let cwd = env::current_dir().ok()?;
        which::which_in(name, Some(path_env), cwd).ok()
    }

    /// 创建带有当前 PATH 的命令
    pub fn command(&self, program: impl Into<PathBuf>) -> AppResult<CommandSpec> {
        Ok(CommandSpec::new(program).path_env(self.path_env()?))
    }

    /// 7-Zip 命令
    pub fn sevenzip(&self) -> AppResult<CommandSpec> {
        let sevenzip = self.config.paths.sevenzip();
        if !sevenzip.exists() {
            return Err(AppError::installation(format!(
                "未找到 7-Zip: {}",
                sevenzip.display()
            )));
        }
        self.command(sevenzip)
    }

    /// 用 7-Zip 解压到指定目录
    pub fn sevenzip_extract(&self, archive: &Path, dest: &Path, extra: &[&str]) -> AppResult<String> {
        let spec = self
            .sevenzip()?
            .arg("x")
            .args(extra.iter().copied())
            .arg(format!("-o{}", path_arg(dest)?))
            .arg(path_arg(archive)?);
        self.runner.capture(&spec)
    }

    /// 静默运行安装程序
    pub fn run_installer(&self, installer: &Path, flags: &[&str]) -> AppResult<()> {
        let spec = self.command(installer)?.args(flags.iter().copied());
        self.runner.run(&spec)
    }

    /// 下载到临时文件
    pub async fn fetch(&self, url: &str) -> AppResult<DownloadedFile> {
        self.fetch_request(&DownloadRequest::new(url)).await
    }

    /// 下载到临时文件，请求未指定校验值时使用配置中该地址的 SHA-256
    pub async fn fetch_request(&self, request: &DownloadRequest) -> AppResult<DownloadedFile> {
        match (&request.sha256, self.config.download.checksums.get(&request.url)) {
            (None, Some(sha256)) => {
                let request = request.clone().with_sha256(sha256.as_str());
                remote::fetch(self.downloader.as_ref(), &request).await
            }
            _ => remote::fetch(self.downloader.as_ref(), request).await,
        }
    }

    /// 工作目录，不存在时创建
    pub fn work_dir(&self) -> AppResult<PathBuf> {
        let dir = self.config.paths.work_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
