//! 会话控制器 - 编排层
//!
//! 持有会话和网关，把用户操作翻译成状态转换 + 网络调用。
//! 网关的失败在这里被接住并转换为 `Failed` 阶段，不会继续向上抛出。

use async_trait::async_trait;
use tracing::{info, warn};

use crate::clients::AnalysisGateway;
use crate::error::{ActionError, ActionRejected};
use crate::models::Document;
use crate::workflow::{Completion, Phase, Session, SessionView};

/// 展示层可以调用的会话操作
///
/// 展示层只依赖这个接口和只读快照，不直接修改会话
#[async_trait]
pub trait SessionActions: Send {
    fn view(&self) -> SessionView<'_>;

    fn select_file(&mut self, document: Document) -> Result<Phase, ActionError>;

    async fn submit(&mut self) -> Result<Phase, ActionRejected>;

    async fn analyze(&mut self) -> Result<Phase, ActionRejected>;

    fn dismiss(&mut self) -> Result<Phase, ActionRejected>;
}

/// 会话控制器
pub struct SessionController<G: AnalysisGateway> {
    session: Session,
    gateway: G,
}

impl<G: AnalysisGateway> SessionController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            session: Session::new(),
            gateway,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn view(&self) -> SessionView<'_> {
        self.session.view()
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// 选择文档（在已选择或已上传时等同于更换）
    pub fn select_file(&mut self, document: Document) -> Result<Phase, ActionError> {
        self.session.select_file(document).map_err(|e| {
            warn!("⚠️ 无法选择文件: {}", e);
            e
        })
    }

    /// 清空当前文件，回到 `Idle`，流程保持打开
    pub fn clear_file(&mut self) -> Result<Phase, ActionError> {
        self.session.replace_file(None)
    }

    /// 上传当前文件
    ///
    /// 返回 `Ok` 表示操作已执行（结果可能是 `Submitted` 或 `Failed`）；
    /// 返回 `Err` 表示当前阶段不允许上传，没有发出任何请求
    pub async fn submit(&mut self) -> Result<Phase, ActionRejected> {
        let ticket = self.session.begin_submit()?;
        let outcome = self.gateway.submit(&ticket.document).await;
        let completion = self.session.complete_submit(ticket.attempt, outcome);
        Ok(self.apply(completion))
    }

    /// 分析已上传的文件
    pub async fn analyze(&mut self) -> Result<Phase, ActionRejected> {
        let ticket = self.session.begin_analyze()?;
        let outcome = self.gateway.analyze(&ticket.document_id).await;
        let completion = self.session.complete_analyze(ticket.attempt, outcome);
        Ok(self.apply(completion))
    }

    /// 从 `Failed` 重试失败的那一步
    ///
    /// 上传失败则重新上传，分析失败则直接重新分析
    pub async fn retry(&mut self) -> Result<Phase, ActionRejected> {
        if self.session.can_analyze() {
            info!("🔁 重试分析");
            self.analyze().await
        } else {
            info!("🔁 重试上传");
            self.submit().await
        }
    }

    /// 关闭会话；请求进行中时不做任何事
    pub fn dismiss(&mut self) -> Result<Phase, ActionRejected> {
        self.session.dismiss()
    }

    fn apply(&self, completion: Completion) -> Phase {
        match completion {
            Completion::Applied(phase) => phase,
            Completion::Stale => self.session.phase(),
        }
    }
}

#[async_trait]
impl<G: AnalysisGateway> SessionActions for SessionController<G> {
    fn view(&self) -> SessionView<'_> {
        SessionController::view(self)
    }

    fn select_file(&mut self, document: Document) -> Result<Phase, ActionError> {
        SessionController::select_file(self, document)
    }

    async fn submit(&mut self) -> Result<Phase, ActionRejected> {
        SessionController::submit(self).await
    }

    async fn analyze(&mut self) -> Result<Phase, ActionRejected> {
        SessionController::analyze(self).await
    }

    fn dismiss(&mut self) -> Result<Phase, ActionRejected> {
        SessionController::dismiss(self)
    }
}
