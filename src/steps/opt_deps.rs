use crate::core::constants::step_ids;
use crate::core::{ProvisionContext, Step};
use crate::error::AppResult;
use crate::utils::FileSystemUtils;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

/// 可选的厂商依赖
///
/// `<opt>\<entry>\<sub>` 被复制到 `<系统盘>\<entry>\<sub>`，已经存在的目标不动。
pub struct OptDepsStep;

impl OptDepsStep {
    /// 尚未复制的 (源, 目标) 对
    pub fn pending(ctx: &ProvisionContext) -> AppResult<Vec<(PathBuf, PathBuf)>> {
        let opt_dir = &ctx.config.paths.opt_dir;
        if !opt_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut pending = Vec::new();
        for entry in sorted_entries(opt_dir)? {
            if !entry.is_dir() {
                continue;
            }
            let Some(entry_name) = entry.file_name() else {
                continue;
            };
            for source in sorted_entries(&entry)? {
                let Some(sub_name) = source.file_name() else {
                    continue;
                };
                let dest = ctx.config.paths.system_drive.join(entry_name).join(sub_name);
                if !dest.exists() {
                    pending.push((source.clone(), dest));
                }
            }
        }
        Ok(pending)
    }
}

fn sorted_entries(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

#[async_trait]
impl Step for OptDepsStep {
    fn id(&self) -> String {
        step_ids::OPT_DEPS.to_string()
    }

    fn description(&self) -> String {
        "可选依赖".to_string()
    }

    fn marker(&self, ctx: &ProvisionContext) -> Option<PathBuf> {
        Some(ctx.config.paths.opt_dir.clone())
    }

    fn is_installed(&self, ctx: &ProvisionContext) -> AppResult<bool> {
        Ok(Self::pending(ctx)?.is_empty())
    }

    async fn install(&self, ctx: &ProvisionContext) -> AppResult<()> {
        for (source, dest) in Self::pending(ctx)? {
            println!("📁 复制 {} 到 {}", source.display(), dest.display());
            if source.is_dir() {
                FileSystemUtils::copy_dir(&source, &dest)?;
            } else {
                if let Some(parent) = dest.parent() {
                    FileSystemUtils::create_dir_all(parent)?;
                }
                fs::copy(&source, &dest)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHost;

    #[test]
    fn test_no_opt_dir_means_nothing_to_do() {
        let host = TestHost::new();
        let ctx = host.context();
        assert!(OptDepsStep.is_installed(&ctx).unwrap());
    }

    #[tokio::test]
    async fn test_copies_only_missing_entries() {
        let host = TestHost::new();
        let opt = &host.config.paths.opt_dir;
        fs::create_dir_all(opt.join("Gurobi").join("gurobi563").join("bin")).unwrap();
        fs::write(opt.join("Gurobi").join("gurobi563").join("bin").join("gurobi.dll"), b"dll").unwrap();
        fs::create_dir_all(opt.join("CPLEX").join("12.6")).unwrap();
        fs::write(opt.join("CPLEX").join("12.6").join("cplex.h"), b"new").unwrap();

        // 已存在的目标保持原样
        let existing = host.root().join("CPLEX").join("12.6");
        fs::create_dir_all(&existing).unwrap();
        fs::write(existing.join("cplex.h"), b"old").unwrap();

        let ctx = host.context();
        assert_eq!(OptDepsStep::pending(&ctx).unwrap().len(), 1);
        assert!(!OptDepsStep.is_installed(&ctx).unwrap());

        OptDepsStep.install(&ctx).await.unwrap();

        assert!(host
            .root()
            .join("Gurobi")
            .join("gurobi563")
            .join("bin")
            .join("gurobi.dll")
            .is_file());
        assert_eq!(fs::read_to_string(existing.join("cplex.h")).unwrap(), "old");
        assert!(OptDepsStep.is_installed(&ctx).unwrap());
    }
}
