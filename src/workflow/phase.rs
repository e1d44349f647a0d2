//! 会话阶段与用户操作

use std::fmt;

/// 会话所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    FileSelected,
    Submitting,
    Submitted,
    Analyzing,
    ResultsReady,
    Failed,
}

impl Phase {
    /// 是否有网络请求正在进行
    pub fn is_in_flight(self) -> bool {
        matches!(self, Phase::Submitting | Phase::Analyzing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::FileSelected => "FileSelected",
            Phase::Submitting => "Submitting",
            Phase::Submitted => "Submitted",
            Phase::Analyzing => "Analyzing",
            Phase::ResultsReady => "ResultsReady",
            Phase::Failed => "Failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 用户可以触发的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SelectFile,
    ReplaceFile,
    Submit,
    Analyze,
    Dismiss,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::SelectFile => "选择文件",
            Action::ReplaceFile => "更换文件",
            Action::Submit => "上传",
            Action::Analyze => "分析",
            Action::Dismiss => "关闭",
        };
        f.write_str(name)
    }
}
