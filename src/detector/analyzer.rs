//! 检测分析器：每个通道一个分析器，负责单个签名在单份证据上的匹配
//! 分析器不产生错误，证据缺失的通道直接返回空结果

use std::borrow::Cow;

use crate::compiler::{CompiledPattern, NamedPattern, Signature};
use crate::extractor::Evidence;
use crate::utils::{ChannelHit, HeaderConverter, VersionExtractor};

/// 单份证据的匹配上下文，meta 只提取一次供所有签名复用
pub struct MatchContext<'a> {
    pub evidence: &'a Evidence,
    pub meta_tags: Cow<'a, [(String, String)]>,
}

impl<'a> MatchContext<'a> {
    pub fn new(evidence: &'a Evidence) -> Self {
        Self {
            evidence,
            meta_tags: evidence.meta_tags(),
        }
    }
}

/// 通道分析器的通用抽象
pub trait Analyzer {
    /// 分析器类型名称，用于日志标准化输出
    const TYPE_NAME: &'static str;

    /// 核心匹配逻辑
    fn analyze(signature: &Signature, ctx: &MatchContext<'_>) -> ChannelHit;
}

/// 对一段文本执行单个模式，命中时记录全部匹配项与版本
fn match_pattern(hit: &mut ChannelHit, pattern: &CompiledPattern, content: &str) {
    let found = pattern.find_all(content);
    if found.is_empty() {
        return;
    }
    let version = pattern
        .version_template
        .as_deref()
        .and_then(|template| VersionExtractor::extract(template, &found));
    hit.record(found, version);
}

/// 键值型模式：正则为空时记录 `presence_value`，否则对 content 执行正则
fn match_named(hit: &mut ChannelHit, named: &NamedPattern, content: &str, presence_value: &str) {
    match &named.pattern {
        Some(pattern) => match_pattern(hit, pattern, content),
        None => hit.record(vec![vec![presence_value.to_string()]], None),
    }
}

/// HTML分析器
pub struct HtmlAnalyzer;

impl Analyzer for HtmlAnalyzer {
    const TYPE_NAME: &'static str = "HTML";

    fn analyze(signature: &Signature, ctx: &MatchContext<'_>) -> ChannelHit {
        let mut hit = ChannelHit::default();
        let Some(html) = ctx.evidence.html.as_deref() else {
            return hit;
        };
        for pattern in &signature.html_patterns {
            match_pattern(&mut hit, pattern, html);
        }
        hit
    }
}

/// Header分析器
pub struct HeaderAnalyzer;

impl Analyzer for HeaderAnalyzer {
    const TYPE_NAME: &'static str = "Header";

    fn analyze(signature: &Signature, ctx: &MatchContext<'_>) -> ChannelHit {
        let mut hit = ChannelHit::default();
        for named in &signature.header_patterns {
            for value in Self::values(ctx.evidence, &named.name) {
                match_named(&mut hit, named, value, value);
            }
        }
        hit
    }
}

impl HeaderAnalyzer {
    /// 按名称取Header的非空值，证据中的键名可能未规范化，比较时忽略大小写
    fn values<'e>(evidence: &'e Evidence, name: &str) -> impl Iterator<Item = &'e String> {
        let key = HeaderConverter::canonical_key(name);
        evidence
            .headers
            .iter()
            .filter(move |(k, _)| k.trim().eq_ignore_ascii_case(&key))
            .flat_map(|(_, values)| values.iter())
            .filter(|v| !v.is_empty())
    }
}

/// URL分析器
pub struct UrlAnalyzer;

impl Analyzer for UrlAnalyzer {
    const TYPE_NAME: &'static str = "URL";

    fn analyze(signature: &Signature, ctx: &MatchContext<'_>) -> ChannelHit {
        let mut hit = ChannelHit::default();
        for pattern in &signature.url_patterns {
            match_pattern(&mut hit, pattern, &ctx.evidence.url);
        }
        hit
    }
}

/// Script分析器：每个 script src 独立匹配
pub struct ScriptAnalyzer;

impl Analyzer for ScriptAnalyzer {
    const TYPE_NAME: &'static str = "Script";

    fn analyze(signature: &Signature, ctx: &MatchContext<'_>) -> ChannelHit {
        let mut hit = ChannelHit::default();
        if signature.script_patterns.is_empty() {
            return hit;
        }
        for src in &ctx.evidence.script_srcs {
            for pattern in &signature.script_patterns {
                match_pattern(&mut hit, pattern, src);
            }
        }
        hit
    }
}

/// Meta分析器：name 或 property 与规则键相同（忽略大小写）的标签参与匹配
pub struct MetaAnalyzer;

impl Analyzer for MetaAnalyzer {
    const TYPE_NAME: &'static str = "Meta";

    fn analyze(signature: &Signature, ctx: &MatchContext<'_>) -> ChannelHit {
        let mut hit = ChannelHit::default();
        for named in &signature.meta_patterns {
            let key = named.name.trim();
            for (_, content) in ctx.meta_tags.iter().filter(|(name, _)| name.trim().eq_ignore_ascii_case(key)) {
                match_named(&mut hit, named, content, content);
            }
        }
        hit
    }
}

/// JS全局变量分析器：仅对 `.js` 资源做子串包含判断，不走正则
pub struct JsAnalyzer;

impl Analyzer for JsAnalyzer {
    const TYPE_NAME: &'static str = "JS";

    fn analyze(signature: &Signature, ctx: &MatchContext<'_>) -> ChannelHit {
        let mut hit = ChannelHit::default();
        let Some(source) = ctx.evidence.javascript.as_deref() else {
            return hit;
        };
        for global in signature.js_globals.iter().filter(|g| !g.is_empty()) {
            if source.contains(global.as_str()) {
                hit.record(vec![vec![global.clone()]], None);
            }
        }
        hit
    }
}

/// Cookie分析器：规则值为空时 Cookie 存在即命中
pub struct CookieAnalyzer;

impl Analyzer for CookieAnalyzer {
    const TYPE_NAME: &'static str = "Cookie";

    fn analyze(signature: &Signature, ctx: &MatchContext<'_>) -> ChannelHit {
        let mut hit = ChannelHit::default();
        for named in &signature.cookie_patterns {
            if let Some(value) = ctx.evidence.cookies.get(&named.name) {
                match_named(&mut hit, named, value, &named.name);
            }
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::compiler::RuleCompiler;

    fn compiled(raw: &str) -> CompiledPattern {
        RuleCompiler::compile_single_pattern(raw).unwrap()
    }

    fn named(name: &str, raw: Option<&str>) -> NamedPattern {
        NamedPattern { name: name.to_string(), pattern: raw.map(compiled) }
    }

    #[test]
    fn test_header_absent_or_empty_skipped() {
        let signature = Signature {
            header_patterns: vec![named("X-Powered-By", Some(r"PHP/([\d.]+)\;version:\1"))],
            ..Default::default()
        };

        let evidence = Evidence::new("https://example.com/");
        assert!(HeaderAnalyzer::analyze(&signature, &MatchContext::new(&evidence)).is_empty());

        let evidence = Evidence::new("https://example.com/")
            .with_header("x-powered-by", "")
            .with_header("X-Powered-By", "PHP/8.2.1");
        let hit = HeaderAnalyzer::analyze(&signature, &MatchContext::new(&evidence));
        assert_eq!(hit.matches.len(), 1);
        assert_eq!(hit.version.as_deref(), Some("8.2.1"));
    }

    #[test]
    fn test_header_keys_not_normalized() {
        let signature = Signature {
            header_patterns: vec![named("server", Some("nginx"))],
            ..Default::default()
        };
        let mut headers = HashMap::new();
        headers.insert("Server".to_string(), vec!["nginx/1.25".to_string()]);
        let evidence = Evidence {
            url: "https://example.com/".to_string(),
            headers,
            ..Default::default()
        };

        let hit = HeaderAnalyzer::analyze(&signature, &MatchContext::new(&evidence));
        assert_eq!(hit.matches, vec![vec!["nginx".to_string()]]);
    }

    #[test]
    fn test_meta_keys_not_normalized() {
        let signature = Signature {
            meta_patterns: vec![named("generator", Some(r"Hugo ([\d.]+)\;version:\1"))],
            ..Default::default()
        };
        let evidence = Evidence {
            url: "https://example.com/".to_string(),
            meta: Some(vec![("Generator".to_string(), "Hugo 0.120.4".to_string())]),
            ..Default::default()
        };

        let hit = MetaAnalyzer::analyze(&signature, &MatchContext::new(&evidence));
        assert_eq!(hit.version.as_deref(), Some("0.120.4"));
    }

    #[test]
    fn test_script_each_src_independent() {
        let signature = Signature {
            script_patterns: vec![compiled(r"jquery[.-]([\d.]*\d)[^/]*\.js\;version:\1")],
            ..Default::default()
        };
        let evidence = Evidence::new("https://example.com/")
            .with_script_srcs(["/js/app.js", "/js/jquery-3.6.0.min.js", "/js/jquery-1.12.4.js"]);

        let hit = ScriptAnalyzer::analyze(&signature, &MatchContext::new(&evidence));
        assert_eq!(hit.matches.len(), 2);
        // 通道内第一个非空版本优先
        assert_eq!(hit.version.as_deref(), Some("3.6.0"));
    }

    #[test]
    fn test_meta_matches_name_or_property() {
        let signature = Signature {
            meta_patterns: vec![named("og:site_name", Some("Shop"))],
            ..Default::default()
        };
        let evidence = Evidence::new("https://example.com/")
            .with_html(r#"<meta property="og:site_name" content="Demo Shop">"#);

        let hit = MetaAnalyzer::analyze(&signature, &MatchContext::new(&evidence));
        assert_eq!(hit.matches, vec![vec!["Shop".to_string()]]);
    }

    #[test]
    fn test_js_requires_javascript_flag() {
        let signature = Signature {
            js_globals: vec!["React".to_string()],
            ..Default::default()
        };

        let js = Evidence::new("https://example.com/app.js").with_javascript("React.createElement(App)");
        let hit = JsAnalyzer::analyze(&signature, &MatchContext::new(&js));
        assert_eq!(hit.matches, vec![vec!["React".to_string()]]);

        let html = Evidence::new("https://example.com/").with_raw_html("React.createElement(App)");
        assert!(JsAnalyzer::analyze(&signature, &MatchContext::new(&html)).is_empty());
    }

    #[test]
    fn test_cookie_presence_and_regex() {
        let signature = Signature {
            cookie_patterns: vec![
                named("session", None),
                named("ver", Some(r"^v(\d+)$\;version:\1")),
            ],
            ..Default::default()
        };
        let evidence = Evidence::new("https://example.com/")
            .with_cookie("session", "anything")
            .with_cookie("ver", "v7");

        let hit = CookieAnalyzer::analyze(&signature, &MatchContext::new(&evidence));
        assert_eq!(
            hit.matches,
            vec![vec!["session".to_string()], vec!["v7".to_string(), "7".to_string()]]
        );
        assert_eq!(hit.version.as_deref(), Some("7"));
    }

    #[test]
    fn test_url_channel() {
        let signature = Signature {
            url_patterns: vec![compiled(r"^https?://[^/]+\.myshopify\.com")],
            ..Default::default()
        };
        let evidence = Evidence::new("https://demo.myshopify.com/products");
        assert!(!UrlAnalyzer::analyze(&signature, &MatchContext::new(&evidence)).is_empty());
    }
}
