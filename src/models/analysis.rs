//! 分析结果数据结构
//!
//! 字段布局与远端服务的 `final_output` 保持一致。
//! 由 `services::result_mapper` 从 JSON 宽松映射而来，这里不直接 `Deserialize`。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// 完整的信用评估结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub summary: Summary,
    pub detailed_analysis: DetailedAnalysis,
    pub recommendations: Recommendations,
    pub metrics: Metrics,
}

impl AnalysisResult {
    pub fn score_band(&self) -> ScoreBand {
        self.summary.band()
    }

    /// 按严重程度过滤警告
    pub fn flags_at_least(&self, severity: Severity) -> impl Iterator<Item = &Flag> {
        self.recommendations
            .flags
            .iter()
            .filter(move |flag| flag.severity >= severity)
    }
}

/// 总体评分与结论
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub overall_score: f64,
    pub health_status: String,
    pub key_findings: String,
}

fn decision_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Decision:\s*([A-Z_]+)").expect("valid decision regex"))
}

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Score:\s*(\d+)").expect("valid score regex"))
}

impl Summary {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.overall_score)
    }

    /// 从 `key_findings` 中提取 `Decision: XXX`
    pub fn decision(&self) -> Option<&str> {
        decision_pattern()
            .captures(&self.key_findings)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// 从 `key_findings` 中提取 `Score: N`
    pub fn stated_score(&self) -> Option<u32> {
        score_pattern()
            .captures(&self.key_findings)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// 分数区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBand {
    /// >= 70
    Strong,
    /// >= 50
    Moderate,
    Weak,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            ScoreBand::Strong
        } else if score >= 50.0 {
            ScoreBand::Moderate
        } else {
            ScoreBand::Weak
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScoreBand::Strong => "良好",
            ScoreBand::Moderate => "一般",
            ScoreBand::Weak => "较差",
        };
        f.write_str(label)
    }
}

/// 分项分析
///
/// 分项名称由远端服务决定，只能遍历，不能写死
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailedAnalysis {
    pub components: BTreeMap<String, ComponentAnalysis>,
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentAnalysis {
    pub score: f64,
    pub status: String,
    pub summary: String,
    /// 不透明的细节数据，原样保留
    pub details: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub immediate_actions: Vec<String>,
    pub flags: Vec<Flag>,
}

/// 带严重程度的警告项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flag {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// 大小写不敏感
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        };
        f.write_str(label)
    }
}

/// 财务指标
///
/// `income_sources` 和 `debt_and_savings` 只在较新的响应格式中出现
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub cash_flow: NumericFields,
    pub expense_breakdown: NumericFields,
    pub income_sources: Option<IncomeSources>,
    pub debt_and_savings: Option<DebtAndSavings>,
}

/// 一组数值字段，字段名由服务决定
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NumericFields(pub BTreeMap<String, f64>);

impl NumericFields {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IncomeSources {
    pub regular: f64,
    pub irregular: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DebtAndSavings {
    pub credit_utilization: Option<String>,
    pub outstanding_debt: Option<OutstandingDebt>,
    pub financial_indicators: Vec<FinancialIndicator>,
}

/// 未偿债务：早期格式是一个总数，后来改为逐项列出
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutstandingDebt {
    Total(f64),
    Itemized(Vec<DebtItem>),
}

impl OutstandingDebt {
    pub fn total(&self) -> f64 {
        match self {
            OutstandingDebt::Total(amount) => *amount,
            OutstandingDebt::Itemized(items) => items.iter().map(|item| item.amount).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebtItem {
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialIndicator {
    pub category: String,
    pub observation: String,
    pub impact: String,
}
