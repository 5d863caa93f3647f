// 核心模块
pub mod cli;
pub mod core;
pub mod error;
pub mod infrastructure;
pub mod steps;
pub mod utils;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use crate::core::constants as app_constants;
pub use crate::core::{ProvisionContext, ProvisionReport, Provisioner, Step, StepFilter, StepOutcome};
pub use error::{AppError, AppResult};
pub use infrastructure::config::Config;
