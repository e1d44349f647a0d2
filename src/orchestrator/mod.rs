//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session_controller` - 会话控制器
//! - 持有 `Session` 与网关
//! - 把用户操作翻译为状态转换 + 单次网络调用
//! - 接住网关失败，转换为 `Failed` 阶段
//!
//! ### `app` - 命令行应用
//! - 初始化日志文件、构建 HTTP 网关
//! - 读取文件并驱动一次完整会话
//!
//! ## 层次关系
//!
//! ```text
//! app (命令行入口)
//!     ↓
//! session_controller (SessionActions)
//!     ↓
//! workflow::Session (状态机)     clients::AnalysisGateway (网络)
//!                                    ↓
//!                                services::result_mapper (响应映射)
//! ```

pub mod app;
pub mod session_controller;

pub use app::{drive_session, App};
pub use session_controller::{SessionActions, SessionController};
