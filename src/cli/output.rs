use crate::core::{ProvisionReport, StepOutcome, StepStatus};
use crate::error::{safe_to_json_pretty, AppResult};
use std::fmt::Write;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// 输出格式化器
pub struct OutputFormatter;

impl OutputFormatter {
    /// 格式化步骤状态
    pub fn format_status(&self, statuses: &[StepStatus], format: OutputFormat) -> AppResult<String> {
        match format {
            OutputFormat::Text => {
                let width = statuses.iter().map(|s| s.id.len()).max().unwrap_or(0);
                let mut output = String::new();
                for status in statuses {
                    let mark = if status.installed { "✅" } else { "⬜" };
                    let _ = write!(output, "{} {:<width$}  {}", mark, status.id, status.description);
                    if let Some(marker) = &status.marker {
                        let _ = write!(output, "  ({})", marker);
                    }
                    output.push('\n');
                }
                let installed = statuses.iter().filter(|s| s.installed).count();
                let _ = writeln!(output, "\n已完成 {}/{}", installed, statuses.len());
                Ok(output)
            }
            OutputFormat::Json => Ok(format!("{}\n", safe_to_json_pretty(&statuses)?)),
        }
    }

    /// 格式化运行报告
    pub fn format_report(&self, report: &ProvisionReport, format: OutputFormat) -> AppResult<String> {
        match format {
            OutputFormat::Text => {
                let applied = if report.dry_run {
                    format!("待安装 {}", report.count(StepOutcome::Planned))
                } else {
                    format!("已安装 {}", report.count(StepOutcome::Applied))
                };
                let elapsed = report.finished_at - report.started_at;
                Ok(format!(
                    "\n🎉 完成: {}，跳过 {}，用时 {:.1} 秒\n",
                    applied,
                    report.count(StepOutcome::Skipped),
                    elapsed.num_milliseconds() as f64 / 1000.0
                ))
            }
            OutputFormat::Json => Ok(format!("{}\n", safe_to_json_pretty(report)?)),
        }
    }

    /// 格式化步骤列表
    pub fn format_steps(&self, steps: &[(String, String)]) -> String {
        let width = steps.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
        steps
            .iter()
            .enumerate()
            .map(|(i, (id, description))| {
                format!("{:>2}. {:<width$}  {}\n", i + 1, id, description)
            })
            .collect()
    }
}

/// 默认输出格式化器实例
pub static FORMATTER: OutputFormatter = OutputFormatter;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepReport;
    use chrono::Utc;

    fn statuses() -> Vec<StepStatus> {
        vec![
            StepStatus {
                id: "7zip".to_string(),
                description: "7-Zip".to_string(),
                installed: true,
                marker: Some(r"C:\Program Files (x86)\7-Zip\7z.exe".to_string()),
            },
            StepStatus {
                id: "buildbot".to_string(),
                description: "BuildBot 从机服务".to_string(),
                installed: false,
                marker: None,
            },
        ]
    }

    #[test]
    fn test_status_text() {
        let output = FORMATTER.format_status(&statuses(), OutputFormat::Text).unwrap();
        assert!(output.contains("✅ 7zip"));
        assert!(output.contains("⬜ buildbot"));
        assert!(output.contains("已完成 1/2"));
    }

    #[test]
    fn test_status_json() {
        let output = FORMATTER.format_status(&statuses(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["id"], "7zip");
        assert_eq!(value[1]["installed"], false);
    }

    #[test]
    fn test_report_json_uses_snake_case_outcomes() {
        let now = Utc::now();
        let report = ProvisionReport {
            started_at: now,
            finished_at: now,
            dry_run: true,
            steps: vec![StepReport {
                id: "jdk64".to_string(),
                outcome: StepOutcome::Planned,
                duration_ms: 3,
            }],
        };

        let output = FORMATTER.format_report(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["steps"][0]["outcome"], "planned");
        assert_eq!(value["dry_run"], true);

        let text = FORMATTER.format_report(&report, OutputFormat::Text).unwrap();
        assert!(text.contains("待安装 1"));
    }

    #[test]
    fn test_steps_are_numbered() {
        let steps = vec![
            ("python-path".to_string(), "将 Python 加入 PATH".to_string()),
            ("cmake".to_string(), "CMake".to_string()),
        ];
        let output = FORMATTER.format_steps(&steps);
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with(" 1. python-path"));
        assert!(lines[1].starts_with(" 2. cmake"));
    }
}
