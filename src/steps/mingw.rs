use crate::core::{ProvisionContext, Step};
use crate::error::AppResult;
use crate::infrastructure::template::render_url;
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;

/// MinGW-w64 工具链架构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MingwArch {
    I686,
    X86_64,
}

impl MingwArch {
    pub fn name(self) -> &'static str {
        match self {
            MingwArch::I686 => "i686",
            MingwArch::X86_64 => "x86_64",
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            MingwArch::I686 => 32,
            MingwArch::X86_64 => 64,
        }
    }
}

/// 7-Zip 解压时逐个文件的输出没有价值，过滤掉
pub fn filter_extract_output(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter(|line| !line.starts_with("Extracting "))
        .collect()
}

/// MinGW-w64 工具链，解压到系统盘根目录下的 mingw32 / mingw64
pub struct MingwStep {
    arch: MingwArch,
}

impl MingwStep {
    pub fn new(arch: MingwArch) -> Self {
        Self { arch }
    }

    pub fn url(&self, ctx: &ProvisionContext) -> AppResult<String> {
        render_url(
            &ctx.config.mingw.url,
            &json!({
                "version": ctx.config.mingw.version,
                "arch": self.arch.name(),
                "bits": self.arch.bits(),
            }),
        )
    }
}

#[async_trait]
impl Step for MingwStep {
    fn id(&self) -> String {
        format!("mingw{}", self.arch.bits())
    }

    fn description(&self) -> String {
        format!("MinGW{} ({})", self.arch.bits(), self.arch.name())
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        Some(
            ctx.config
                .paths
                .system_drive
                .join(format!("mingw{}", self.arch.bits())),
        )
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let archive = ctx.fetch(&self.url(ctx)?).await?;
        let started = Instant::now();
        let output = ctx.sevenzip_extract(archive.path(), &ctx.config.paths.system_drive, &[])?;
        for line in filter_extract_output(&output) {
            println!("{}", line);
        }
        println!("⏱️  解压用时 {:.1} 秒", started.elapsed().as_secs_f64());
        Ok(())
    }
}
