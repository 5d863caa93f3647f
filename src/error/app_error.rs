use std::io;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),

    #[error("配置错误: {message}")]
    Config { message: String },

    #[error("网络错误: {message}")]
    Network { message: String },

    #[error("下载失败: {url} - {reason}")]
    Download { url: String, reason: String },

    #[error("命令执行失败: {command} (退出码: {code:?}){stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("注册表错误: {key} - {reason}")]
    Registry { key: String, reason: String },

    #[error("服务错误: {name} - {reason}")]
    Service { name: String, reason: String },

    #[error("安装错误: {message}")]
    Installation { message: String },

    #[error("路径错误: {path} - {reason}")]
    Path { path: String, reason: String },

    #[error("模板渲染失败: {0}")]
    Template(String),

    #[error("当前平台不支持: {operation}")]
    Unsupported { operation: String },

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("步骤 '{step}' 失败: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<AppError>,
    },
}

/// 用于提供错误上下文和用户友好建议
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub operation: String,
    pub suggestions: Vec<String>,
}

impl AppError {
    /// 为错误添加上下文信息
    pub fn with_context(self, operation: &str) -> ContextualError {
        let suggestions = self.default_suggestions();
        ContextualError {
            error: self,
            context: ErrorContext {
                operation: operation.to_string(),
                suggestions,
            },
        }
    }

    /// 根据错误类型给出的默认建议
    fn default_suggestions(&self) -> Vec<String> {
        match self {
            AppError::StepFailed { step, source } => {
                let mut suggestions = source.default_suggestions();
                suggestions.push(format!("修复后可使用 `winprep run --only {step}` 单独重试"));
                suggestions
            }
            AppError::Download { .. } | AppError::Network { .. } => vec![
                "检查网络连接或代理设置".to_string(),
                "确认配置文件中的下载地址仍然有效".to_string(),
            ],
            AppError::Registry { .. } | AppError::Service { .. } => {
                vec!["请以管理员身份运行".to_string()]
            }
            AppError::Config { .. } => {
                vec!["使用 `winprep config show` 检查当前配置".to_string()]
            }
            _ => Vec::new(),
        }
    }

    /// 包装为步骤失败
    pub fn in_step(self, step: &str) -> Self {
        AppError::StepFailed {
            step: step.to_string(),
            source: Box::new(self),
        }
    }
}

/// 带有上下文的错误
#[derive(Error, Debug)]
pub struct ContextualError {
    #[source]
    pub error: AppError,
    pub context: ErrorContext,
}

impl std::fmt::Display for ContextualError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "操作失败: {}\n错误: {}", self.context.operation, self.error)
    }
}

impl ContextualError {
    /// 获取用户友好的错误消息
    pub fn user_message(&self) -> String {
        let mut msg = format!("❌ {}\n", self.context.operation);
        msg.push_str(&format!("原因: {}\n", self.error));

        if !self.context.suggestions.is_empty() {
            msg.push_str("💡 建议:\n");
            for suggestion in &self.context.suggestions {
                msg.push_str(&format!("  • {}\n", suggestion));
            }
        }

        msg
    }
}

/// 应用程序 Result 类型
pub type AppResult<T> = Result<T, AppError>;

/// 便捷的错误创建函数
impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn installation(message: impl Into<String>) -> Self {
        Self::Installation {
            message: message.into(),
        }
    }

    pub fn path_conversion_failed(path: &str) -> Self {
        Self::Path {
            path: path.to_string(),
            reason: "路径包含无效字符".to_string(),
        }
    }

    pub fn unsupported(operation: &str) -> Self {
        Self::Unsupported {
            operation: operation.to_string(),
        }
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(error: handlebars::RenderError) -> Self {
        Self::Template(error.to_string())
    }
}

impl From<handlebars::TemplateError> for AppError {
    fn from(error: handlebars::TemplateError) -> Self {
        Self::Template(error.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(format!("解析配置文件失败: {}", error))
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(error: toml::ser::Error) -> Self {
        Self::config(format!("序列化配置失败: {}", error))
    }
}
