//! 测试用的假实现：记录命令、假下载器、本地 HTTP 服务和临时目录中的模拟主机。

use crate::core::context::ProvisionContext;
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::Config;
use crate::infrastructure::process::{CommandRunner, CommandSpec};
use crate::infrastructure::registry::MemoryRegistry;
use crate::infrastructure::remote::{DownloadRequest, Downloader};
use crate::infrastructure::service::NetServiceController;
use async_trait::async_trait;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

type SpecHook = Box<dyn Fn(&CommandSpec) + Send + Sync>;
type SpecPredicate = Box<dyn Fn(&CommandSpec) -> bool + Send + Sync>;
type SpecOutput = Box<dyn Fn(&CommandSpec) -> String + Send + Sync>;

/// 记录所有调用的命令执行器
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    on_run: Mutex<Option<SpecHook>>,
    fail_when: Mutex<Option<SpecPredicate>>,
    probe: Mutex<Option<SpecPredicate>>,
    output: Mutex<Option<SpecOutput>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_when(self, f: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static) -> Self {
        self.set_fail_when(f);
        self
    }

    /// 命令成功时的副作用，用来模拟安装程序生成文件
    pub fn set_on_run(&self, f: impl Fn(&CommandSpec) + Send + Sync + 'static) {
        *self.on_run.lock().unwrap() = Some(Box::new(f));
    }

    pub fn set_fail_when(&self, f: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static) {
        *self.fail_when.lock().unwrap() = Some(Box::new(f));
    }

    pub fn set_probe(&self, f: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static) {
        *self.probe.lock().unwrap() = Some(Box::new(f));
    }

    pub fn set_output(&self, f: impl Fn(&CommandSpec) -> String + Send + Sync + 'static) {
        *self.output.lock().unwrap() = Some(Box::new(f));
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::display).collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn execute(&self, spec: &CommandSpec) -> AppResult<()> {
        self.calls.lock().unwrap().push(spec.clone());
        if let Some(fail) = self.fail_when.lock().unwrap().as_ref() {
            if fail(spec) {
                return Err(AppError::CommandFailed {
                    command: spec.display(),
                    code: Some(1),
                    stderr: String::new(),
                });
            }
        }
        if let Some(hook) = self.on_run.lock().unwrap().as_ref() {
            hook(spec);
        }
        Ok(())
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> AppResult<()> {
        self.execute(spec)
    }

    fn capture(&self, spec: &CommandSpec) -> AppResult<String> {
        self.execute(spec)?;
        Ok(self
            .output
            .lock()
            .unwrap()
            .as_ref()
            .map(|f| f(spec))
            .unwrap_or_default())
    }

    fn probe(&self, spec: &CommandSpec) -> bool {
        self.calls.lock().unwrap().push(spec.clone());
        self.probe
            .lock()
            .unwrap()
            .as_ref()
            .map(|f| f(spec))
            .unwrap_or(false)
    }
}

type ContentFn = Box<dyn Fn(&DownloadRequest) -> Vec<u8> + Send + Sync>;

/// 不访问网络的下载器
#[derive(Default)]
pub struct FakeDownloader {
    requests: Mutex<Vec<DownloadRequest>>,
    content: Mutex<Option<ContentFn>>,
    fail_all: Mutex<bool>,
}

impl FakeDownloader {
    pub fn set_content(&self, f: impl Fn(&DownloadRequest) -> Vec<u8> + Send + Sync + 'static) {
        *self.content.lock().unwrap() = Some(Box::new(f));
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_all.lock().unwrap() = failing;
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, request: &DownloadRequest, dest: &Path) -> AppResult<()> {
        self.requests.lock().unwrap().push(request.clone());
        if *self.fail_all.lock().unwrap() {
            return Err(AppError::Download {
                url: request.url.clone(),
                reason: "HTTP 404".to_string(),
            });
        }
        let bytes = self
            .content
            .lock()
            .unwrap()
            .as_ref()
            .map(|f| f(request))
            .unwrap_or_else(|| b"installer".to_vec());
        fs::write(dest, bytes)?;
        Ok(())
    }
}

/// 临时目录中的模拟 Windows 主机
pub struct TestHost {
    dir: TempDir,
    pub config: Config,
    pub runner: Arc<RecordingRunner>,
    pub downloader: Arc<FakeDownloader>,
    pub registry: Arc<MemoryRegistry>,
}

impl TestHost {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let drive = dir.path().join("C");

        let mut config = Config::new();
        config.paths.system_drive = drive.clone();
        config.paths.windows_dir = drive.join("Windows");
        config.paths.program_files = drive.join("Program Files");
        config.paths.program_files_x86 = drive.join("Program Files (x86)");
        config.paths.python_dir = drive.join("Python27");
        config.paths.opt_dir = drive.join("opt").join("win64");
        config.paths.work_dir = Some(dir.path().join("work"));
        config.buildbot.slave_dir = drive.join("buildslave");

        fs::create_dir_all(&config.paths.windows_dir).unwrap();
        fs::create_dir_all(&config.paths.program_files).unwrap();
        fs::create_dir_all(&config.paths.program_files_x86).unwrap();

        Self {
            dir,
            config,
            runner: Arc::new(RecordingRunner::new()),
            downloader: Arc::new(FakeDownloader::default()),
            registry: Arc::new(MemoryRegistry::new()),
        }
    }

    /// 模拟的系统盘根目录
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("C")
    }

    pub fn context(&self) -> ProvisionContext {
        ProvisionContext::new(
            self.config.clone(),
            self.runner.clone(),
            self.downloader.clone(),
            self.registry.clone(),
            Arc::new(NetServiceController),
        )
        .with_search_path(Vec::new())
    }

    pub fn touch(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    pub fn install_sevenzip(&self) {
        self.touch(&self.config.paths.sevenzip());
    }
}

/// 从 `-o<dir>` 参数中取出解压目录
pub fn output_dir_arg(spec: &CommandSpec) -> Option<PathBuf> {
    spec.args
        .iter()
        .find_map(|a| a.strip_prefix("-o").map(PathBuf::from))
}

/// 本地 HTTP 服务，每个连接依次返回一个预设响应
pub struct TestServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub fn start(responses: Vec<Vec<u8>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        thread::spawn(move || {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let request = read_request(&mut stream);
                recorded.lock().unwrap().push(request);
                let _ = stream.write_all(&response);
                let _ = stream.flush();
            }
        });

        Self { base_url, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 收到的原始请求头
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

pub fn http_200(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

pub fn http_status(code: u16, reason: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        code, reason
    )
    .into_bytes()
}
