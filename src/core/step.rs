use crate::core::context::ProvisionContext;
use crate::error::AppResult;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

/// 一个安装步骤
///
/// 步骤是否需要执行只取决于主机当前状态（通常是某个标记路径是否存在），
/// 因此整个准备过程可以反复运行。
#[async_trait]
pub trait Step: Send + Sync {
    /// 唯一标识，用于 `--only` / `--skip`
    fn id(&self) -> String;

    fn description(&self) -> String;

    /// 安装完成的标记路径
    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf>;

    /// 是否已经安装
    fn is_installed(&self, ctx: &ProvisionContext) -> AppResult<bool> {
        Ok(self.marker(ctx).map(|m| m.exists()).unwrap_or(false))
    }

    /// 执行安装
    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()>;
}

/// 步骤的当前状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub id: String,
    pub description: String,
    pub installed: bool,
    pub marker: Option<String>,
}

/// 单个步骤的执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// 已安装，跳过
    Skipped,
    /// 本次执行了安装
    Applied,
    /// 预演模式下需要安装
    Planned,
}
