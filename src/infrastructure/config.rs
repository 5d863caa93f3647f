use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// 配置文件结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub urls: UrlsConfig,
    #[serde(default)]
    pub cmake: CmakeConfig,
    #[serde(default)]
    pub maven: MavenConfig,
    #[serde(default)]
    pub mingw: MingwConfig,
    #[serde(default)]
    pub jdk: JdkConfig,
    #[serde(default)]
    pub localsolver: LocalSolverConfig,
    #[serde(default)]
    pub buildbot: BuildbotConfig,
}

/// 主机上的文件系统位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// 系统盘根目录，MinGW、Maven、buildslave 等都安装在这里
    pub system_drive: PathBuf,
    pub windows_dir: PathBuf,
    pub program_files: PathBuf,
    pub program_files_x86: PathBuf,
    pub python_dir: PathBuf,
    /// 可选依赖目录，每个子目录会复制到系统盘根目录
    pub opt_dir: PathBuf,
    /// 解压 ISO 等中间产物的工作目录，默认使用系统临时目录
    pub work_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            system_drive: PathBuf::from("C:\\"),
            windows_dir: PathBuf::from("C:\\Windows"),
            program_files: PathBuf::from("C:\\Program Files"),
            program_files_x86: PathBuf::from("C:\\Program Files (x86)"),
            python_dir: PathBuf::from("C:\\Python27"),
            opt_dir: PathBuf::from("C:\\opt\\win64"),
            work_dir: None,
        }
    }
}

impl PathsConfig {
    /// 7-Zip 可执行文件位置
    pub fn sevenzip(&self) -> PathBuf {
        self.program_files_x86.join("7-Zip").join("7z.exe")
    }

    /// 工作目录
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| env::temp_dir().join("winprep"))
    }
}

/// 下载配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub exponential_backoff: bool,
    pub connect_timeout_sec: u64,
    pub read_timeout_sec: u64,
    /// 按下载地址配置的 SHA-256，下载后校验
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub checksums: BTreeMap<String, String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_delay_ms: 1000,
            exponential_backoff: true,
            connect_timeout_sec: 30,
            read_timeout_sec: 1800,
            checksums: BTreeMap::new(),
        }
    }
}

/// 固定地址的安装包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlsConfig {
    pub dotnet: String,
    pub sevenzip: String,
    pub windows_sdk: String,
    pub pywin32: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            dotnet: "http://download.microsoft.com/download/9/5/A/\
                     95A9616B-7A37-4AF6-BC36-D6EA96C8DAAE/dotNetFx40_Full_x86_x64.exe"
                .to_string(),
            sevenzip: "http://downloads.sourceforge.net/sevenzip/7z920.exe".to_string(),
            windows_sdk: "http://download.microsoft.com/download/F/1/0/\
                          F10113F5-B750-4969-A255-274341AC6BCE/GRMSDKX_EN_DVD.iso"
                .to_string(),
            pywin32: "http://sourceforge.net/projects/pywin32/files/pywin32/Build%20219/\
                      pywin32-219.win-amd64-py2.7.exe/download"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmakeConfig {
    pub archive: String,
    /// 可用变量: series, archive
    pub url: String,
}

impl Default for CmakeConfig {
    fn default() -> Self {
        Self {
            archive: "cmake-3.1.0-win32-x86.zip".to_string(),
            url: "http://www.cmake.org/files/v{{series}}/{{archive}}".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MavenConfig {
    pub version: String,
    /// 可用变量: version
    pub url: String,
}

impl Default for MavenConfig {
    fn default() -> Self {
        Self {
            version: "3.2.5".to_string(),
            url: "https://archive.apache.org/dist/maven/maven-3/{{version}}/binaries/\
                  apache-maven-{{version}}-bin.zip"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MingwConfig {
    pub version: String,
    /// 可用变量: version, arch, bits
    pub url: String,
}

impl Default for MingwConfig {
    fn default() -> Self {
        Self {
            version: "4.8.2".to_string(),
            url: "http://sourceforge.net/projects/mingw-w64/files/\
                  Toolchains%20targetting%20Win{{bits}}/Personal%20Builds/\
                  mingw-builds/{{version}}/threads-win32/sjlj/\
                  {{arch}}-{{version}}-release-win32-sjlj-rt_v3-rev4.7z/download"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JdkConfig {
    /// JDK 7 的更新号，例如 60 对应 jdk1.7.0_60
    pub update: u32,
    pub base_url: String,
    /// 下载时附带的许可 Cookie
    pub cookie: String,
    /// 可用变量: base_url, update, arch
    pub url: String,
}

impl Default for JdkConfig {
    fn default() -> Self {
        Self {
            update: 60,
            base_url: "http://download.oracle.com/otn-pub/java/jdk/7u60-b19/".to_string(),
            cookie: "oraclelicense=accept-securebackup-cookie".to_string(),
            url: "{{base_url}}jdk-7u{{update}}-windows-{{arch}}.exe".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSolverConfig {
    /// 形如 4_5_20140710，最后一段为构建日期
    pub version: String,
    /// 可用变量: version, bits
    pub url: String,
    pub license: String,
}

impl Default for LocalSolverConfig {
    fn default() -> Self {
        Self {
            version: "4_5_20140710".to_string(),
            url: "http://www.localsolver.com/downloads/LocalSolver_{{version}}_Win{{bits}}.exe"
                .to_string(),
            license: "FREE_TRIAL = 1\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildbotConfig {
    pub slave_dir: PathBuf,
    pub slave_name: String,
    pub master: String,
    /// 支持 ${VAR} 形式从环境变量读取
    pub password: String,
    /// 通过 pip 安装的 buildslave 包
    pub package: String,
    pub service_name: String,
}

impl Default for BuildbotConfig {
    fn default() -> Self {
        Self {
            slave_dir: PathBuf::from("C:\\buildslave"),
            slave_name: "win2008".to_string(),
            master: "localhost:9989".to_string(),
            password: "${BUILDSLAVE_PASSWORD}".to_string(),
            package: "buildbot-slave".to_string(),
            service_name: "BuildBot".to_string(),
        }
    }
}

impl Config {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从文件加载配置，未指定路径时使用默认位置；文件不存在时使用内置默认值
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => get_config_path()?,
        };

        if !config_path.exists() {
            if path.is_some() {
                return Err(AppError::config(format!(
                    "配置文件不存在: {}",
                    config_path.display()
                )));
            }
            log::debug!("未找到配置文件 {}，使用默认配置", config_path.display());
            return Ok(Config::new());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::config(format!("无法读取配置文件 {}: {}", config_path.display(), e))
        })?;

        Self::from_toml(&content)
    }

    /// 解析 TOML 文本
    pub fn from_toml(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml(&self) -> AppResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 保存配置到文件
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        // 确保配置目录存在
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::config(format!("无法创建配置目录: {}", e)))?;
        }

        fs::write(config_path, self.to_toml()?)
            .map_err(|e| AppError::config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

/// 解析环境变量引用（如 ${VAR_NAME}）
pub fn resolve_env_var(value: &str) -> String {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        env::var(var_name).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}

/// 获取配置文件路径
pub fn get_config_path() -> AppResult<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// 获取配置目录
pub fn get_config_dir() -> AppResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| AppError::config("无法获取用户主目录"))?;

    Ok(home_dir.join(".winprep"))
}
