pub mod analysis_client;

pub use analysis_client::AnalysisClient;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::models::{AnalysisResult, Document, RemoteDocumentId};

/// 远端操作网关
///
/// 两个操作都是单次调用：每次调用都是一次新的尝试，内部不重试、不排队。
/// 失败统一返回 `GatewayError`，由编排层转换为会话的 `Failed` 阶段。
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// 上传文档，返回远端分配的标识
    async fn submit(&self, document: &Document) -> Result<RemoteDocumentId, GatewayError>;

    /// 请求分析，标识必须来自之前成功的 `submit`
    async fn analyze(&self, document_id: &RemoteDocumentId) -> Result<AnalysisResult, GatewayError>;
}
