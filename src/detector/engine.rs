//! 匹配引擎：对单份证据遍历全部签名，按固定通道顺序累积匹配与版本
//!
//! 通道顺序：HTML → Header → URL → Script → Meta → JS → Cookie。
//! 同一签名的版本以最后一个给出非空版本的通道为准。
//! 引擎无内部状态，签名库加载完成后可被任意多个线程并发调用。

use tracing::debug;

use crate::compiler::{Signature, SignatureDatabase};
use crate::extractor::Evidence;
use crate::utils::{DetectionUpdater, Finding};
use super::analyzer::{
    Analyzer, CookieAnalyzer, HeaderAnalyzer, HtmlAnalyzer, JsAnalyzer, MatchContext, MetaAnalyzer,
    ScriptAnalyzer, UrlAnalyzer,
};
use super::category::CategoryResolver;
use super::result::Match;

pub struct MatchEngine;

impl MatchEngine {
    /// 匹配单份证据，返回所有至少有一个通道命中的签名
    pub fn match_evidence(evidence: &Evidence, db: &SignatureDatabase) -> Vec<Match> {
        let ctx = MatchContext::new(evidence);
        let matches: Vec<Match> = db
            .iter()
            .filter_map(|signature| {
                Self::match_signature(signature, &ctx).map(|finding| {
                    Match::detected(&signature.name, CategoryResolver::resolve(signature, db), finding)
                })
            })
            .collect();

        debug!("证据匹配完成：URL={}，命中技术{}个", evidence.url, matches.len());
        matches
    }

    /// 匹配单个签名，无任何通道命中时返回 None
    pub fn match_signature(signature: &Signature, ctx: &MatchContext<'_>) -> Option<Finding> {
        if signature.pattern_count() == 0 {
            return None;
        }

        let mut finding = Finding::default();
        Self::apply::<HtmlAnalyzer>(signature, ctx, &mut finding);
        Self::apply::<HeaderAnalyzer>(signature, ctx, &mut finding);
        Self::apply::<UrlAnalyzer>(signature, ctx, &mut finding);
        Self::apply::<ScriptAnalyzer>(signature, ctx, &mut finding);
        Self::apply::<MetaAnalyzer>(signature, ctx, &mut finding);
        Self::apply::<JsAnalyzer>(signature, ctx, &mut finding);
        Self::apply::<CookieAnalyzer>(signature, ctx, &mut finding);

        (!finding.matches.is_empty()).then_some(finding)
    }

    fn apply<A: Analyzer>(signature: &Signature, ctx: &MatchContext<'_>, finding: &mut Finding) {
        let hit = A::analyze(signature, ctx);
        if hit.is_empty() {
            return;
        }
        debug!(
            "[{}]匹配成功 | 技术: {} | 匹配项: {} | 版本: {:?}",
            A::TYPE_NAME,
            signature.name,
            hit.matches.len(),
            hit.version
        );
        DetectionUpdater::update(finding, hit);
    }
}
