//! 应用程序常量定义

/// 步骤标识
pub mod step_ids {
    pub const PYTHON_PATH: &str = "python-path";
    pub const CMAKE: &str = "cmake";
    pub const MAVEN: &str = "maven";
    pub const DOTNET: &str = "dotnet";
    pub const SEVENZIP: &str = "7zip";
    pub const WINDOWS_SDK: &str = "windows-sdk";
    pub const LOCALSOLVER_LICENSE: &str = "localsolver-license";
    pub const OPT_DEPS: &str = "opt-deps";
    pub const PYWIN32: &str = "pywin32";
    pub const BUILDBOT: &str = "buildbot";
}

/// 安装程序的静默参数
pub mod installer_flags {
    pub const DOTNET: &[&str] = &["/q", "/norestart"];
    pub const NSIS: &[&str] = &["/S"];
    pub const WINDOWS_SDK: &[&str] = &["-q"];
    pub const JDK: &[&str] = &["/s"];
    pub const BUILDBOT_SERVICE: &[&str] = &["--startup", "auto", "--interactive", "install"];
}

/// 版本信息常量
pub mod version {
    pub const APP_NAME: &str = "winprep";
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
