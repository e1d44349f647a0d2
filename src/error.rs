//! 错误类型
//!
//! 三类会话错误 + 配置错误：
//! - `ValidationError` 本地校验失败，不会到达网关，会话阶段不变
//! - `GatewayError` 上传/分析失败，由编排层转换为 `Failed` 阶段
//! - `ActionRejected` 当前阶段不允许该操作（守卫拒绝，不排队）

use std::fmt;

use thiserror::Error;

use crate::workflow::{Action, Phase};

/// 本地文件校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 未选择文件
    #[error("未选择文件")]
    NoFileSelected,
    /// 一次选择了多个文件
    #[error("一次只能上传一个文件 (收到 {count} 个)")]
    TooManyFiles { count: usize },
    /// 文件格式不是 PDF
    #[error("不支持的文件格式: {file_name} ({content_type})，仅支持 PDF")]
    UnsupportedFormat {
        file_name: String,
        content_type: String,
    },
    /// 文件内容为空
    #[error("文件为空: {file_name}")]
    EmptyDocument { file_name: String },
}

/// 网关失败的具体原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// 调用前的输入检查未通过
    InvalidInput,
    /// 网络/传输层错误（连接失败、超时等）
    Transport,
    /// 服务返回非 2xx 状态码
    Status(u16),
    /// 响应体结构不合法
    MalformedPayload,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::InvalidInput => write!(f, "输入无效"),
            FailureCause::Transport => write!(f, "网络错误"),
            FailureCause::Status(code) => write!(f, "HTTP {}", code),
            FailureCause::MalformedPayload => write!(f, "响应格式错误"),
        }
    }
}

/// 网关错误
///
/// 上传和分析两个操作的所有失败都归一化为这两种结果之一
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// 上传失败
    #[error("上传失败 ({cause}): {message}")]
    SubmissionFailed { cause: FailureCause, message: String },
    /// 分析失败
    #[error("分析失败 ({cause}): {message}")]
    AnalysisFailed { cause: FailureCause, message: String },
}

impl GatewayError {
    /// 创建上传失败错误
    pub fn submission(cause: FailureCause, message: impl Into<String>) -> Self {
        GatewayError::SubmissionFailed {
            cause,
            message: message.into(),
        }
    }

    /// 创建分析失败错误
    pub fn analysis(cause: FailureCause, message: impl Into<String>) -> Self {
        GatewayError::AnalysisFailed {
            cause,
            message: message.into(),
        }
    }

    pub fn cause(&self) -> FailureCause {
        match self {
            GatewayError::SubmissionFailed { cause, .. }
            | GatewayError::AnalysisFailed { cause, .. } => *cause,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GatewayError::SubmissionFailed { message, .. }
            | GatewayError::AnalysisFailed { message, .. } => message,
        }
    }

    pub fn is_submission(&self) -> bool {
        matches!(self, GatewayError::SubmissionFailed { .. })
    }

    pub fn is_analysis(&self) -> bool {
        matches!(self, GatewayError::AnalysisFailed { .. })
    }
}

/// 当前阶段不允许执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("当前阶段 {phase} 不允许执行 {action}")]
pub struct ActionRejected {
    pub action: Action,
    pub phase: Phase,
}

/// 选择/替换文件时可能出现的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Rejected(#[from] ActionRejected),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 服务地址无效
    #[error("无效的服务地址 '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    /// 超时时间为 0
    #[error("超时时间必须大于 0: {field}")]
    ZeroTimeout { field: &'static str },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端初始化失败: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("操作被拒绝: {0}")]
    Rejected(#[from] ActionRejected),
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Rejected(e) => AppError::Rejected(e),
            ActionError::Validation(e) => AppError::Validation(e),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
