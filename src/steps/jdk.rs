use crate::core::constants::installer_flags;
use crate::core::{ProvisionContext, Step};
use crate::error::AppResult;
use crate::infrastructure::remote::DownloadRequest;
use crate::infrastructure::template::render_url;
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;

/// JDK 7，32 位装在 Program Files (x86)，64 位装在 Program Files
pub struct JdkStep {
    bits: u32,
}

impl JdkStep {
    pub fn x86() -> Self {
        Self { bits: 32 }
    }

    pub fn x64() -> Self {
        Self { bits: 64 }
    }

    fn arch(&self) -> &'static str {
        if self.bits == 32 {
            "i586"
        } else {
            "x64"
        }
    }

    pub fn request(&self, ctx: &ProvisionContext) -> AppResult<DownloadRequest> {
        let jdk = &ctx.config.jdk;
        let url = render_url(
            &jdk.url,
            &json!({
                "base_url": jdk.base_url,
                "update": jdk.update,
                "arch": self.arch(),
            }),
        )?;
        Ok(DownloadRequest::new(url).with_cookie(jdk.cookie.clone()))
    }
}

#[async_trait]
impl Step for JdkStep {
    fn id(&self) -> String {
        format!("jdk{}", self.bits)
    }

    fn description(&self) -> String {
        format!("JDK 7 ({} 位)", self.bits)
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        let program_files = if self.bits == 32 {
            &ctx.config.paths.program_files_x86
        } else {
            &ctx.config.paths.program_files
        };
        Some(
            program_files
                .join("Java")
                .join(format!("jdk1.7.0_{}", ctx.config.jdk.update)),
        )
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let installer = ctx.fetch_request(&self.request(ctx)?).await?;
        ctx.run_installer(installer.path(), installer_flags::JDK)
    }
}
