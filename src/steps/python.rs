use crate::core::constants::step_ids;
use crate::core::{PathPosition, ProvisionContext, Step};
use crate::error::AppResult;
use crate::infrastructure::env_path::add_to_path;
use async_trait::async_trait;
use std::path::PathBuf;

/// 把预装的 Python 加入 PATH
pub struct PythonPathStep;

#[async_trait]
impl Step for PythonPathStep {
    fn id(&self) -> String {
        step_ids::PYTHON_PATH.to_string()
    }

    fn description(&self) -> String {
        "将 Python 加入 PATH".to_string()
    }

    /// PATH 中找到的 python，没有 Python 目录时为空
    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        if !ctx.config.paths.python_dir.exists() {
            return None;
        }
        ctx.which("python")
    }

    fn is_installed(&self, ctx: &ProvisionContext) -> AppResult<bool> {
        let python_dir = &ctx.config.paths.python_dir;
        // 镜像里没有 Python 时无事可做
        if !python_dir.exists() {
            log::info!("未找到 Python 目录 {}", python_dir.display());
            return Ok(true);
        }
        Ok(ctx.which("python").is_some())
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        let python_dir = &ctx.config.paths.python_dir;
        add_to_path(ctx, python_dir, PathPosition::Prepend)?;
        add_to_path(ctx, &python_dir.join("Scripts"), PathPosition::Append)?;
        Ok(())
    }
}
