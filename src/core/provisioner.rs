use crate::core::context::ProvisionContext;
use crate::core::step::{Step, StepOutcome, StepStatus};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

/// 步骤选择条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepFilter {
    pub only: Vec<String>,
    pub skip: Vec<String>,
}

impl StepFilter {
    pub fn includes(&self, id: &str) -> bool {
        (self.only.is_empty() || self.only.iter().any(|s| s == id))
            && !self.skip.iter().any(|s| s == id)
    }

    /// 检查引用的步骤是否都存在
    pub fn validate(&self, known: &[String]) -> AppResult<()> {
        let unknown: Vec<&str> = self
            .only
            .iter()
            .chain(self.skip.iter())
            .filter(|id| !known.contains(id))
            .map(String::as_str)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(AppError::config(format!(
                "未知的步骤: {}。可用步骤: {}",
                unknown.join(", "),
                known.join(", ")
            )))
        }
    }
}

/// 单个步骤的报告
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub id: String,
    pub outcome: StepOutcome,
    pub duration_ms: u128,
}

/// 一次运行的报告
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub steps: Vec<StepReport>,
}

impl ProvisionReport {
    pub fn count(&self, outcome: StepOutcome) -> usize {
        self.steps.iter().filter(|s| s.outcome == outcome).count()
    }

    pub fn outcome_of(&self, id: &str) -> Option<StepOutcome> {
        self.steps.iter().find(|s| s.id == id).map(|s| s.outcome)
    }
}

/// 按固定顺序执行安装步骤
pub struct Provisioner {
    steps: Vec<Box<dyn Step>>,
}

impl Provisioner {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// 构建节点的标准步骤序列
    pub fn standard() -> Self {
        Self::new(crate::steps::standard_steps())
    }

    pub fn step_ids(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    pub fn steps(&self) -> &[Box<dyn Step>] {
        &self.steps
    }

    /// 只检查状态，不做任何修改
    pub fn status(&self, ctx: &ProvisionContext) -> AppResult<Vec<StepStatus>> {
        self.steps
            .iter()
            .map(|step| {
                Ok(StepStatus {
                    id: step.id(),
                    description: step.description(),
                    installed: step
                        .is_installed(ctx)
                        .map_err(|e| e.in_step(&step.id()))?,
                    marker: step.marker(ctx).map(|m| m.display().to_string()),
                })
            })
            .collect()
    }

    /// 依次执行步骤，任何一步失败都会中止整个过程
    pub async fn run(&self, ctx: &ProvisionContext, filter: &StepFilter) -> AppResult<ProvisionReport> {
        filter.validate(&self.step_ids())?;

        let started_at = Utc::now();
        let mut reports = Vec::new();

        for step in self.steps.iter().filter(|s| filter.includes(&s.id())) {
            let id = step.id();
            let timer = Instant::now();

            let installed = step.is_installed(ctx).map_err(|e| e.in_step(&id))?;
            let outcome = if installed {
                log::info!("{} 已安装，跳过", id);
                println!("⏭️  {} 已安装", step.description());
                StepOutcome::Skipped
            } else if ctx.dry_run {
                println!("📝 将安装: {}", step.description());
                StepOutcome::Planned
            } else {
                println!("🚀 正在安装: {}", step.description());
                step.install(ctx).await.map_err(|e| e.in_step(&id))?;
                println!(
                    "✅ {} 完成 ({:.1}s)",
                    step.description(),
                    timer.elapsed().as_secs_f64()
                );
                StepOutcome::Applied
            };

            reports.push(StepReport {
                id,
                outcome,
                duration_ms: timer.elapsed().as_millis(),
            });
        }

        Ok(ProvisionReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: ctx.dry_run,
            steps: reports,
        })
    }
}
