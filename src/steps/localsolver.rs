use crate::core::constants::step_ids;
use crate::core::{ProvisionContext, Step};
use crate::error::{AppError, AppResult};
use crate::infrastructure::template::render_url;
use crate::utils::FileSystemUtils;
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::path::PathBuf;

/// 7-Zip 解开 NSIS 安装包后，程序文件所在的目录
const NSIS_OUTDIR: &str = "$_OUTDIR";

/// 安装目录名：去掉版本号最后一段构建日期，例如 `4_5_20140710` -> `localsolver_4_5`
pub fn localsolver_dir_name(version: &str) -> AppResult<String> {
    let re = Regex::new(r"^(.*)_.*$").map_err(|e| AppError::config(e.to_string()))?;
    let caps = re.captures(version).ok_or_else(|| {
        AppError::config(format!("无法识别的 LocalSolver 版本号: {}", version))
    })?;
    Ok(format!("localsolver_{}", &caps[1]))
}

/// LocalSolver，直接从 NSIS 安装包中解出文件而不运行安装程序
pub struct LocalSolverStep {
    bits: u32,
}

impl LocalSolverStep {
    pub fn x86() -> Self {
        Self { bits: 32 }
    }

    pub fn x64() -> Self {
        Self { bits: 64 }
    }

    fn install_dir(&self, ctx: &ProvisionContext) -> AppResult<PathBuf> {
        let program_files = if self.bits == 32 {
            &ctx.config.paths.program_files_x86
        } else {
            &ctx.config.paths.program_files
        };
        Ok(program_files.join(localsolver_dir_name(&ctx.config.localsolver.version)?))
    }
}

#[async_trait]
impl Step for LocalSolverStep {
    fn id(&self) -> String {
        format!("localsolver{}", self.bits)
    }

    fn description(&self) -> String {
        format!("LocalSolver ({} 位)", self.bits)
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        self.install_dir(ctx).ok()
    }

    fn is_installed(&self, ctx: &ProvisionContext) -> AppResult<bool> {
        Ok(self.install_dir(ctx)?.exists())
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let localsolver = &ctx.config.localsolver;
        let url = render_url(
            &localsolver.url,
            &json!({ "version": localsolver.version, "bits": self.bits }),
        )?;
        let install_dir = self.install_dir(ctx)?;

        let package = ctx.fetch(&url).await?;
        let staging = tempfile::Builder::new()
            .prefix("localsolver")
            .tempdir_in(ctx.work_dir()?)?;
        ctx.sevenzip_extract(package.path(), staging.path(), &[])?;

        let outdir = staging.path().join(NSIS_OUTDIR);
        if !outdir.is_dir() {
            return Err(AppError::installation(format!(
                "安装包中没有 {} 目录: {}",
                NSIS_OUTDIR, url
            )));
        }
        FileSystemUtils::move_dir(&outdir, &install_dir)?;
        Ok(())
    }
}

/// 免费试用许可文件
pub struct LocalSolverLicenseStep;

impl LocalSolverLicenseStep {
    fn license_path(ctx: &ProvisionContext) -> AppResult<PathBuf> {
        Ok(ctx
            .config
            .paths
            .system_drive
            .join(localsolver_dir_name(&ctx.config.localsolver.version)?)
            .join("license.dat"))
    }
}

#[async_trait]
impl Step for LocalSolverLicenseStep {
    fn id(&self) -> String {
        step_ids::LOCALSOLVER_LICENSE.to_string()
    }

    fn description(&self) -> String {
        "LocalSolver 许可文件".to_string()
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        Self::license_path(ctx).ok()
    }

    /// 内容与配置一致才算完成，旧的许可会被覆盖
    fn is_installed(&self, ctx: &ProvisionContext) -> AppResult<bool> {
        let current = FileSystemUtils::read_to_string_optional(&Self::license_path(ctx)?)?;
        Ok(current.as_deref() == Some(ctx.config.localsolver.license.as_str()))
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let path = Self::license_path(ctx)?;
        FileSystemUtils::write_to_string(&path, &ctx.config.localsolver.license)?;
        println!("📄 已写入 {}", path.display());
        Ok(())
    }
}
