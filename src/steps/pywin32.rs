use crate::core::constants::step_ids;
use crate::core::{ProvisionContext, Step};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::PathsConfig;
use crate::infrastructure::process::path_arg;
use crate::utils::FileSystemUtils;
use async_trait::async_trait;
use std::path::PathBuf;

const POSTINSTALL_SCRIPT: &str = "pywin32_postinstall.py";

/// Python 解释器位置
pub fn python_exe(paths: &PathsConfig) -> PathBuf {
    paths.python_dir.join("python.exe")
}

fn site_packages(paths: &PathsConfig) -> PathBuf {
    paths.python_dir.join("Lib").join("site-packages")
}

/// pywin32，buildslave 服务依赖它
///
/// 安装包是 bdist_wininst 格式，解开后把 PLATLIB 和 SCRIPTS 放进 site-packages，
/// 再运行随附的 post-install 脚本注册 COM 组件。
pub struct Pywin32Step;

#[async_trait]
impl Step for Pywin32Step {
    fn id(&self) -> String {
        step_ids::PYWIN32.to_string()
    }

    fn description(&self) -> String {
        "pywin32".to_string()
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        Some(site_packages(&ctx.config.paths).join("win32"))
    }

    fn is_installed(&self, ctx: &ProvisionContext) -> AppResult<bool> {
        let spec = ctx
            .command(python_exe(&ctx.config.paths))?
            .args(["-c", "import win32api"]);
        Ok(ctx.runner().probe(&spec))
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let paths = &ctx.config.paths;
        let extract_dir = ctx.work_dir()?.join("pywin32");
        FileSystemUtils::remove_dir_all(&extract_dir)?;

        let package = ctx.fetch(&ctx.config.urls.pywin32).await?;
        ctx.sevenzip_extract(package.path(), &extract_dir, &[])?;

        let site_packages = site_packages(paths);
        for sub in ["PLATLIB", "SCRIPTS"] {
            let dir = extract_dir.join(sub);
            if dir.is_dir() {
                FileSystemUtils::move_children(&dir, &site_packages)?;
            }
        }
        FileSystemUtils::remove_dir_all(&extract_dir)?;

        let postinstall = site_packages.join(POSTINSTALL_SCRIPT);
        if !postinstall.exists() {
            return Err(AppError::installation(format!(
                "安装包中没有 {}",
                POSTINSTALL_SCRIPT
            )));
        }
        let spec = ctx
            .command(python_exe(paths))?
            .arg(path_arg(&postinstall)?)
            .arg("-install");
        ctx.runner().run(&spec)?;

        FileSystemUtils::remove_file(&postinstall)?;
        Ok(())
    }
}
