//! # Statement Analyzer
//!
//! 上传银行账单 PDF 到远端分析服务，并获取信用评估结果
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - 上传文档、远端标识、分析结果结构
//! - `loaders` - 从磁盘读取文档
//!
//! ### ② 网关层（Clients）
//! - `clients/` - `AnalysisGateway` 抽象 + `AnalysisClient` HTTP 实现
//! - 上传 / 分析两个单次调用，失败归一化为 `GatewayError`
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 把分析响应宽松映射为 `AnalysisResult`
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 会话状态机，唯一的数据源
//! - 尝试令牌保证迟到的响应不会修改会话
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/session_controller` - 操作 → 状态转换 + 网络调用
//! - `orchestrator/app` - 命令行应用
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{AnalysisClient, AnalysisGateway};
pub use config::Config;
pub use error::{
    ActionError, ActionRejected, AppError, AppResult, FailureCause, GatewayError, ValidationError,
};
pub use models::{AnalysisResult, Document, RemoteDocumentId};
pub use orchestrator::{drive_session, App, SessionActions, SessionController};
pub use workflow::{Phase, Session, SessionState, SessionView};
