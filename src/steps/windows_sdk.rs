use crate::core::constants::{installer_flags, step_ids};
use crate::core::{ProvisionContext, Step};
use crate::error::AppResult;
use crate::utils::FileSystemUtils;
use async_trait::async_trait;
use std::path::PathBuf;

/// Windows SDK 7.1，以 ISO 形式发布，先用 7-Zip 解开再运行 setup
pub struct WindowsSdkStep;

#[async_trait]
impl Step for WindowsSdkStep {
    fn id(&self) -> String {
        step_ids::WINDOWS_SDK.to_string()
    }

    fn description(&self) -> String {
        "Windows SDK 7.1".to_string()
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        Some(
            ctx.config
                .paths
                .program_files
                .join("Microsoft SDKs")
                .join("Windows")
                .join("v7.1"),
        )
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let iso = ctx.fetch(&ctx.config.urls.windows_sdk).await?;

        let extract_dir = ctx.work_dir()?.join("winsdk");
        FileSystemUtils::remove_dir_all(&extract_dir)?;

        let result = ctx
            .sevenzip_extract(iso.path(), &extract_dir, &["-tudf"])
            .and_then(|_| {
                ctx.run_installer(&extract_dir.join("setup.exe"), installer_flags::WINDOWS_SDK)
            });

        if let Err(e) = FileSystemUtils::remove_dir_all(&extract_dir) {
            log::warn!("清理 {} 失败: {}", extract_dir.display(), e);
        }
        result
    }
}
