use crate::core::constants::{installer_flags, step_ids};
use crate::core::{ProvisionContext, Step};
use crate::error::AppResult;
use crate::infrastructure::config::Config;
use async_trait::async_trait;
use std::path::PathBuf;

/// 下载安装程序后以固定参数静默运行
pub struct InstallerStep {
    id: &'static str,
    description: &'static str,
    marker: fn(&Config) -> PathBuf,
    url: fn(&Config) -> String,
    flags: &'static [&'static str],
}

impl InstallerStep {
    /// .NET Framework 4，msbuild 需要
    pub fn dotnet() -> Self {
        Self {
            id: step_ids::DOTNET,
            description: ".NET Framework 4",
            marker: |config| {
                config
                    .paths
                    .windows_dir
                    .join("Microsoft.NET")
                    .join("Framework64")
                    .join("v4.0.30319")
            },
            url: |config| config.urls.dotnet.clone(),
            flags: installer_flags::DOTNET,
        }
    }

    pub fn sevenzip() -> Self {
        Self {
            id: step_ids::SEVENZIP,
            description: "7-Zip",
            marker: |config| config.paths.sevenzip(),
            url: |config| config.urls.sevenzip.clone(),
            flags: installer_flags::NSIS,
        }
    }
}

#[async_trait]
impl Step for InstallerStep {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn description(&self) -> String {
        self.description.to_string()
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        Some((self.marker)(&ctx.config))
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let installer = ctx.fetch(&(self.url)(&ctx.config)).await?;
        ctx.run_installer(installer.path(), self.flags)
    }
}
