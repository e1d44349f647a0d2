//! 会话状态机 - 流程层
//!
//! 一次"上传 → 分析"尝试的唯一数据源。
//!
//! 所有数据都挂在 `SessionState` 的变体上，不可能出现
//! "正在分析但还没上传"之类的非法组合：
//!
//! ```text
//! Idle ──select──▶ FileSelected ──begin_submit──▶ Submitting
//!                                                   │
//!                       ┌────── complete_submit ────┤
//!                       ▼                           ▼
//!                   Submitted ──begin_analyze──▶ Analyzing ──complete_analyze──▶ ResultsReady
//!                                                   │
//!                                                   ▼
//!                                                 Failed
//! ```
//!
//! 网络请求由编排层执行：`begin_*` 返回请求凭据（含尝试令牌），
//! `complete_*` 只在令牌仍然匹配时才应用结果。

use tracing::{debug, info, warn};

use crate::error::{ActionError, ActionRejected, GatewayError};
use crate::models::{AnalysisResult, Document, RemoteDocumentId};
use crate::workflow::phase::{Action, Phase};

/// 尝试令牌
///
/// 每次发起网络请求都会分配新令牌，迟到的响应凭旧令牌无法修改会话
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptToken(u64);

impl AttemptToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// 会话状态（带数据的标签联合）
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    FileSelected {
        document: Document,
    },
    Submitting {
        document: Document,
        attempt: AttemptToken,
    },
    Submitted {
        document: Document,
        document_id: RemoteDocumentId,
    },
    Analyzing {
        document: Document,
        document_id: RemoteDocumentId,
        attempt: AttemptToken,
    },
    ResultsReady {
        document: Document,
        document_id: RemoteDocumentId,
        analysis: AnalysisResult,
    },
    /// 上传失败时 `document_id` 为 None，分析失败时保留
    Failed {
        document: Document,
        document_id: Option<RemoteDocumentId>,
        error: GatewayError,
    },
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::FileSelected { .. } => Phase::FileSelected,
            SessionState::Submitting { .. } => Phase::Submitting,
            SessionState::Submitted { .. } => Phase::Submitted,
            SessionState::Analyzing { .. } => Phase::Analyzing,
            SessionState::ResultsReady { .. } => Phase::ResultsReady,
            SessionState::Failed { .. } => Phase::Failed,
        }
    }
}

/// 上传请求凭据
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub attempt: AttemptToken,
    pub document: Document,
}

/// 分析请求凭据
#[derive(Debug, Clone)]
pub struct AnalyzeTicket {
    pub attempt: AttemptToken,
    pub document_id: RemoteDocumentId,
}

/// 网关结果的应用情况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 已应用，会话进入该阶段
    Applied(Phase),
    /// 令牌不匹配，结果被丢弃
    Stale,
}

/// 单次分析会话
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    next_attempt: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn selected_file(&self) -> Option<&Document> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::FileSelected { document }
            | SessionState::Submitting { document, .. }
            | SessionState::Submitted { document, .. }
            | SessionState::Analyzing { document, .. }
            | SessionState::ResultsReady { document, .. }
            | SessionState::Failed { document, .. } => Some(document),
        }
    }

    pub fn remote_document_id(&self) -> Option<&RemoteDocumentId> {
        match &self.state {
            SessionState::Submitted { document_id, .. }
            | SessionState::Analyzing { document_id, .. }
            | SessionState::ResultsReady { document_id, .. } => Some(document_id),
            SessionState::Failed { document_id, .. } => document_id.as_ref(),
            _ => None,
        }
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match &self.state {
            SessionState::ResultsReady { analysis, .. } => Some(analysis),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&GatewayError> {
        match &self.state {
            SessionState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// 正在进行的请求的令牌
    pub fn pending_attempt(&self) -> Option<AttemptToken> {
        match &self.state {
            SessionState::Submitting { attempt, .. } | SessionState::Analyzing { attempt, .. } => {
                Some(*attempt)
            }
            _ => None,
        }
    }

    // ========== 守卫 ==========

    pub fn can_select_file(&self) -> bool {
        matches!(
            self.state,
            SessionState::Idle | SessionState::FileSelected { .. } | SessionState::Submitted { .. }
        )
    }

    pub fn can_replace_file(&self) -> bool {
        matches!(
            self.state,
            SessionState::FileSelected { .. } | SessionState::Submitted { .. }
        )
    }

    pub fn can_submit(&self) -> bool {
        matches!(
            self.state,
            SessionState::FileSelected { .. }
                | SessionState::Failed {
                    document_id: None,
                    ..
                }
        )
    }

    pub fn can_analyze(&self) -> bool {
        matches!(
            self.state,
            SessionState::Submitted { .. }
                | SessionState::Failed {
                    document_id: Some(_),
                    ..
                }
        )
    }

    pub fn can_dismiss(&self) -> bool {
        !self.phase().is_in_flight()
    }

    // ========== 状态转换 ==========

    /// 选择文档
    ///
    /// 在 `FileSelected` / `Submitted` 中选择等同于更换文件。
    /// 校验失败时会话保持不变。
    pub fn select_file(&mut self, document: Document) -> Result<Phase, ActionError> {
        if !self.can_select_file() {
            return Err(self.reject(Action::SelectFile).into());
        }
        document.validate()?;

        if self.phase() != Phase::Idle {
            debug!("更换文件: {}", document.file_name());
        }
        info!("📄 已选择文件: {} ({} 字节)", document.file_name(), document.len());
        self.state = SessionState::FileSelected { document };
        Ok(self.phase())
    }

    /// 更换文件
    ///
    /// `Some` 换成新文档，`None` 清空选择回到 `Idle`。
    /// 之前的远端标识和分析结果一并丢弃。
    pub fn replace_file(&mut self, document: Option<Document>) -> Result<Phase, ActionError> {
        if !self.can_replace_file() {
            return Err(self.reject(Action::ReplaceFile).into());
        }
        match document {
            Some(document) => {
                document.validate()?;
                info!("📄 已更换文件: {}", document.file_name());
                self.state = SessionState::FileSelected { document };
            }
            None => {
                info!("已清空文件选择");
                self.state = SessionState::Idle;
            }
        }
        Ok(self.phase())
    }

    /// 开始上传
    ///
    /// 允许从 `FileSelected`，或上传失败后的 `Failed` 重试
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, ActionRejected> {
        if !self.can_submit() {
            return Err(self.reject(Action::Submit));
        }
        let attempt = self.allocate_attempt();
        let document = match std::mem::take(&mut self.state) {
            SessionState::FileSelected { document } | SessionState::Failed { document, .. } => {
                document
            }
            other => {
                self.state = other;
                return Err(self.reject(Action::Submit));
            }
        };

        info!("📤 开始上传 {} (尝试 #{})", document.file_name(), attempt.value());
        self.state = SessionState::Submitting {
            document: document.clone(),
            attempt,
        };
        Ok(SubmitTicket { attempt, document })
    }

    /// 应用上传结果
    pub fn complete_submit(
        &mut self,
        attempt: AttemptToken,
        outcome: Result<RemoteDocumentId, GatewayError>,
    ) -> Completion {
        let document = match std::mem::take(&mut self.state) {
            SessionState::Submitting {
                document,
                attempt: current,
            } if current == attempt => document,
            other => {
                self.state = other;
                warn!("⚠️ 丢弃过期的上传响应 (尝试 #{})", attempt.value());
                return Completion::Stale;
            }
        };

        self.state = match outcome {
            Ok(document_id) => {
                info!("✓ 上传成功，远端标识: {}", document_id);
                SessionState::Submitted {
                    document,
                    document_id,
                }
            }
            Err(error) => {
                warn!("❌ {}", error);
                SessionState::Failed {
                    document,
                    document_id: None,
                    error,
                }
            }
        };
        Completion::Applied(self.phase())
    }

    /// 开始分析
    ///
    /// 允许从 `Submitted`，或分析失败后的 `Failed` 重试（无需重新上传）
    pub fn begin_analyze(&mut self) -> Result<AnalyzeTicket, ActionRejected> {
        if !self.can_analyze() {
            return Err(self.reject(Action::Analyze));
        }
        let attempt = self.allocate_attempt();
        let (document, document_id) = match std::mem::take(&mut self.state) {
            SessionState::Submitted {
                document,
                document_id,
            }
            | SessionState::Failed {
                document,
                document_id: Some(document_id),
                ..
            } => (document, document_id),
            other => {
                self.state = other;
                return Err(self.reject(Action::Analyze));
            }
        };

        info!("🔍 开始分析 {} (尝试 #{})", document_id, attempt.value());
        self.state = SessionState::Analyzing {
            document,
            document_id: document_id.clone(),
            attempt,
        };
        Ok(AnalyzeTicket {
            attempt,
            document_id,
        })
    }

    /// 应用分析结果
    pub fn complete_analyze(
        &mut self,
        attempt: AttemptToken,
        outcome: Result<AnalysisResult, GatewayError>,
    ) -> Completion {
        let (document, document_id) = match std::mem::take(&mut self.state) {
            SessionState::Analyzing {
                document,
                document_id,
                attempt: current,
            } if current == attempt => (document, document_id),
            other => {
                self.state = other;
                warn!("⚠️ 丢弃过期的分析响应 (尝试 #{})", attempt.value());
                return Completion::Stale;
            }
        };

        self.state = match outcome {
            Ok(analysis) => {
                info!(
                    "✓ 分析完成: 评分 {} ({})",
                    analysis.summary.overall_score, analysis.summary.health_status
                );
                SessionState::ResultsReady {
                    document,
                    document_id,
                    analysis,
                }
            }
            Err(error) => {
                warn!("❌ {}", error);
                SessionState::Failed {
                    document,
                    document_id: Some(document_id),
                    error,
                }
            }
        };
        Completion::Applied(self.phase())
    }

    /// 关闭会话，丢弃所有数据
    ///
    /// 已经是 `Idle` 时不做任何事；请求进行中时拒绝
    pub fn dismiss(&mut self) -> Result<Phase, ActionRejected> {
        if !self.can_dismiss() {
            return Err(self.reject(Action::Dismiss));
        }
        if self.phase() != Phase::Idle {
            info!("会话已关闭 (原阶段: {})", self.phase());
            self.state = SessionState::Idle;
        }
        Ok(Phase::Idle)
    }

    /// 只读快照
    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            phase: self.phase(),
            file_name: self.selected_file().map(Document::file_name),
            document_id: self.remote_document_id(),
            analysis: self.analysis(),
            error: self.last_error(),
            can_submit: self.can_submit(),
            can_analyze: self.can_analyze(),
            can_dismiss: self.can_dismiss(),
            can_replace_file: self.can_replace_file(),
        }
    }

    fn allocate_attempt(&mut self) -> AttemptToken {
        self.next_attempt += 1;
        AttemptToken(self.next_attempt)
    }

    fn reject(&self, action: Action) -> ActionRejected {
        let rejected = ActionRejected {
            action,
            phase: self.phase(),
        };
        warn!("⚠️ {}", rejected);
        rejected
    }
}

/// 会话的只读快照，供展示层使用
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    pub phase: Phase,
    pub file_name: Option<&'a str>,
    pub document_id: Option<&'a RemoteDocumentId>,
    pub analysis: Option<&'a AnalysisResult>,
    pub error: Option<&'a GatewayError>,
    pub can_submit: bool,
    pub can_analyze: bool,
    pub can_dismiss: bool,
    pub can_replace_file: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureCause, ValidationError};
    use crate::models::analysis::{DetailedAnalysis, Metrics, Recommendations, Summary};

    fn pdf() -> Document {
        Document::pdf("statement.pdf", b"%PDF-1.7 body".to_vec())
    }

    fn doc_id(raw: &str) -> RemoteDocumentId {
        RemoteDocumentId::parse(raw).unwrap()
    }

    fn analysis(score: f64) -> AnalysisResult {
        AnalysisResult {
            summary: Summary {
                overall_score: score,
                health_status: "Good".to_string(),
                key_findings: String::new(),
            },
            detailed_analysis: DetailedAnalysis::default(),
            recommendations: Recommendations::default(),
            metrics: Metrics::default(),
        }
    }

    fn submitted_session() -> Session {
        let mut session = Session::new();
        session.select_file(pdf()).unwrap();
        let ticket = session.begin_submit().unwrap();
        session.complete_submit(ticket.attempt, Ok(doc_id("statement.pdf")));
        session
    }

    #[test]
    fn test_happy_path_reaches_results() {
        let mut session = Session::new();
        assert_eq!(session.phase(), Phase::Idle);

        assert_eq!(session.select_file(pdf()), Ok(Phase::FileSelected));

        let ticket = session.begin_submit().unwrap();
        assert_eq!(session.phase(), Phase::Submitting);
        assert_eq!(ticket.document.file_name(), "statement.pdf");

        let done = session.complete_submit(ticket.attempt, Ok(doc_id("statement.pdf")));
        assert_eq!(done, Completion::Applied(Phase::Submitted));
        assert_eq!(
            session.remote_document_id().map(RemoteDocumentId::as_str),
            Some("statement.pdf")
        );

        let ticket = session.begin_analyze().unwrap();
        assert_eq!(session.phase(), Phase::Analyzing);
        assert_eq!(ticket.document_id.as_str(), "statement.pdf");

        let done = session.complete_analyze(ticket.attempt, Ok(analysis(82.0)));
        assert_eq!(done, Completion::Applied(Phase::ResultsReady));
        assert_eq!(session.analysis().map(|a| a.summary.overall_score), Some(82.0));
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_invalid_file_leaves_session_unchanged() {
        let mut session = Session::new();
        let png = Document::new("scan.png", "image/png", vec![1, 2, 3]);

        let err = session.select_file(png.clone()).unwrap_err();
        assert!(matches!(
            err,
            ActionError::Validation(ValidationError::UnsupportedFormat { .. })
        ));
        assert_eq!(session.phase(), Phase::Idle);

        session.select_file(pdf()).unwrap();
        assert!(session.select_file(png).is_err());
        assert_eq!(session.phase(), Phase::FileSelected);
        assert_eq!(session.selected_file(), Some(&pdf()));
    }

    #[test]
    fn test_cannot_analyze_before_submitted() {
        let mut session = Session::new();
        assert!(session.begin_analyze().is_err());

        session.select_file(pdf()).unwrap();
        let rejected = session.begin_analyze().unwrap_err();
        assert_eq!(rejected.action, Action::Analyze);
        assert_eq!(rejected.phase, Phase::FileSelected);

        session.begin_submit().unwrap();
        assert!(session.begin_analyze().is_err());
        assert_eq!(session.phase(), Phase::Submitting);
    }

    #[test]
    fn test_second_submit_while_submitting_is_rejected() {
        let mut session = Session::new();
        session.select_file(pdf()).unwrap();
        let first = session.begin_submit().unwrap();

        let rejected = session.begin_submit().unwrap_err();
        assert_eq!(rejected.phase, Phase::Submitting);
        assert_eq!(session.pending_attempt(), Some(first.attempt));
    }

    #[test]
    fn test_dismiss_is_noop_while_in_flight() {
        let mut session = Session::new();
        session.select_file(pdf()).unwrap();
        let ticket = session.begin_submit().unwrap();

        assert!(session.dismiss().is_err());
        assert_eq!(session.phase(), Phase::Submitting);
        assert_eq!(session.selected_file(), Some(&pdf()));
        assert_eq!(session.pending_attempt(), Some(ticket.attempt));

        session.complete_submit(ticket.attempt, Ok(doc_id("statement.pdf")));
        let ticket = session.begin_analyze().unwrap();
        assert!(session.dismiss().is_err());
        assert_eq!(session.phase(), Phase::Analyzing);
        assert_eq!(session.pending_attempt(), Some(ticket.attempt));
        assert!(session.remote_document_id().is_some());
    }

    #[test]
    fn test_dismiss_idle_is_idempotent() {
        let mut session = Session::new();
        assert_eq!(session.dismiss(), Ok(Phase::Idle));
        assert_eq!(session.dismiss(), Ok(Phase::Idle));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_dismiss_discards_everything() {
        let mut session = submitted_session();
        let ticket = session.begin_analyze().unwrap();
        session.complete_analyze(ticket.attempt, Ok(analysis(60.0)));

        assert_eq!(session.dismiss(), Ok(Phase::Idle));
        assert!(session.selected_file().is_none());
        assert!(session.remote_document_id().is_none());
        assert!(session.analysis().is_none());
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_submit_failure_keeps_file_and_allows_retry() {
        let mut session = Session::new();
        session.select_file(pdf()).unwrap();
        let ticket = session.begin_submit().unwrap();

        let error = GatewayError::submission(FailureCause::Status(500), "Internal Server Error");
        session.complete_submit(ticket.attempt, Err(error.clone()));

        assert_eq!(session.phase(), Phase::Failed);
        assert_eq!(session.last_error(), Some(&error));
        assert_eq!(session.selected_file(), Some(&pdf()));
        assert!(session.remote_document_id().is_none());
        assert!(session.can_submit());
        assert!(!session.can_analyze());

        let retry = session.begin_submit().unwrap();
        assert_ne!(retry.attempt, ticket.attempt);
        session.complete_submit(retry.attempt, Ok(doc_id("statement.pdf")));
        assert_eq!(session.phase(), Phase::Submitted);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_analysis_failure_keeps_document_id() {
        let mut session = submitted_session();
        let ticket = session.begin_analyze().unwrap();
        let error = GatewayError::analysis(FailureCause::MalformedPayload, "缺少必需字段");
        session.complete_analyze(ticket.attempt, Err(error));

        assert_eq!(session.phase(), Phase::Failed);
        assert!(session.last_error().map(GatewayError::is_analysis).unwrap_or(false));
        assert_eq!(
            session.remote_document_id().map(RemoteDocumentId::as_str),
            Some("statement.pdf")
        );
        assert!(!session.can_submit());
        assert!(session.can_analyze());

        let retry = session.begin_analyze().unwrap();
        session.complete_analyze(retry.attempt, Ok(analysis(75.0)));
        assert_eq!(session.phase(), Phase::ResultsReady);
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let mut session = Session::new();
        session.select_file(pdf()).unwrap();
        let first = session.begin_submit().unwrap();
        session.complete_submit(
            first.attempt,
            Err(GatewayError::submission(FailureCause::Transport, "timeout")),
        );
        let second = session.begin_submit().unwrap();
        assert!(second.attempt.value() > first.attempt.value());

        let late = session.complete_submit(first.attempt, Ok(doc_id("late.pdf")));
        assert_eq!(late, Completion::Stale);
        assert_eq!(session.phase(), Phase::Submitting);
        assert_eq!(session.pending_attempt(), Some(second.attempt));

        session.complete_submit(second.attempt, Ok(doc_id("statement.pdf")));
        let late_again = session.complete_submit(second.attempt, Ok(doc_id("dup.pdf")));
        assert_eq!(late_again, Completion::Stale);
        assert_eq!(
            session.remote_document_id().map(RemoteDocumentId::as_str),
            Some("statement.pdf")
        );
    }

    #[test]
    fn test_response_after_dismiss_is_stale() {
        let mut session = submitted_session();
        let ticket = session.begin_analyze().unwrap();
        session.complete_analyze(
            ticket.attempt,
            Err(GatewayError::analysis(FailureCause::Transport, "reset")),
        );
        session.dismiss().unwrap();

        let late = session.complete_analyze(ticket.attempt, Ok(analysis(90.0)));
        assert_eq!(late, Completion::Stale);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.analysis().is_none());
    }

    #[test]
    fn test_replace_file_discards_document_id() {
        let mut session = submitted_session();
        let other = Document::pdf("april.pdf", b"%PDF-1.7 april".to_vec());

        assert_eq!(session.replace_file(Some(other.clone())), Ok(Phase::FileSelected));
        assert!(session.remote_document_id().is_none());
        assert_eq!(session.selected_file(), Some(&other));

        assert_eq!(session.replace_file(None), Ok(Phase::Idle));
        assert!(session.selected_file().is_none());
    }

    #[test]
    fn test_replace_file_rejected_outside_allowed_phases() {
        let mut session = Session::new();
        assert!(matches!(
            session.replace_file(Some(pdf())),
            Err(ActionError::Rejected(ActionRejected {
                action: Action::ReplaceFile,
                phase: Phase::Idle
            }))
        ));

        session.select_file(pdf()).unwrap();
        session.begin_submit().unwrap();
        assert!(session.replace_file(None).is_err());
        assert!(session.select_file(pdf()).is_err());
        assert_eq!(session.phase(), Phase::Submitting);
    }

    #[test]
    fn test_view_flags_follow_phase() {
        let mut session = Session::new();
        let view = session.view();
        assert_eq!(view.phase, Phase::Idle);
        assert!(!view.can_submit && !view.can_analyze && view.can_dismiss);

        session.select_file(pdf()).unwrap();
        session.begin_submit().unwrap();
        let view = session.view();
        assert_eq!(view.file_name, Some("statement.pdf"));
        assert!(!view.can_submit && !view.can_analyze && !view.can_dismiss);
        assert!(!view.can_replace_file);
    }
}
