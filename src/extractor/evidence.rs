//! 单个抓取资源的检测证据
//! 由外部爬虫在每次抓取后构建，匹配完成即丢弃

use std::borrow::Cow;
use std::collections::HashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;

use super::html_extractor::HtmlExtractor;
use crate::utils::HeaderConverter;

/// 常见HTML起始标记（忽略大小写），用于无 Content-Type 时的内容嗅探
static HTML_SIGNATURE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*<(?:!doctype html|html|head|body|script|iframe|h1|div|font|table|a|style|title|b|br|p|!--)[\s>]")
        .expect("HTML嗅探正则必须合法")
});

/// 检测证据
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    /// 响应URL
    pub url: String,
    /// 原始HTML文本（HTML响应时存在）
    pub html: Option<String>,
    /// 页面中发现的 script src
    pub script_srcs: Vec<String>,
    /// 响应Header，键为小写规范化名称
    pub headers: HashMap<String, Vec<String>>,
    pub cookies: HashMap<String, String>,
    /// `.js` 资源的原始脚本内容；为 Some 即表示该资源是 JS 文件
    pub javascript: Option<String>,
    /// meta 标签 (name或property, content)；为 None 时由匹配引擎从HTML中提取
    pub meta: Option<Vec<(String, String)>>,
}

impl Evidence {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// 设置HTML文本，同时提取 script src 与 meta 标签
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        let html = html.into();
        let extracted = HtmlExtractor::extract(&html);
        self.script_srcs.extend(extracted.script_srcs);
        self.meta = Some(extracted.meta_tags);
        self.html = Some(html);
        self
    }

    /// 只设置HTML文本，不做标签提取
    pub fn with_raw_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_script_srcs<I, S>(mut self, srcs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script_srcs.extend(srcs.into_iter().map(Into::into));
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(HeaderConverter::canonical_key(name))
            .or_default()
            .push(value.into());
        self
    }

    /// 合并多值Header，键名自动规范化
    pub fn with_headers(mut self, headers: &HashMap<String, Vec<String>>) -> Self {
        for (key, values) in HeaderConverter::normalize(headers) {
            self.headers.entry(key).or_default().extend(values);
        }
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// 标记为 `.js` 资源并设置脚本内容
    pub fn with_javascript(mut self, source: impl Into<String>) -> Self {
        self.javascript = Some(source.into());
        self
    }

    pub fn with_meta(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.meta
            .get_or_insert_with(Vec::new)
            .push((name.into().to_ascii_lowercase(), content.into()));
        self
    }

    /// 是否为 `.js` 资源
    pub fn is_javascript(&self) -> bool {
        self.javascript.is_some()
    }

    /// meta 名值对：优先使用已提供的，否则从HTML中提取
    pub fn meta_tags(&self) -> Cow<'_, [(String, String)]> {
        match (&self.meta, &self.html) {
            (Some(meta), _) => Cow::Borrowed(meta.as_slice()),
            (None, Some(html)) => Cow::Owned(HtmlExtractor::meta_tags(html)),
            (None, None) => Cow::Owned(Vec::new()),
        }
    }

    /// 从原始响应构建证据
    ///
    /// HTML响应提取 script src 与 meta；非HTML且URL路径以 `.js` 结尾的视为脚本资源；
    /// 任何非空响应体都作为 HTML 文本参与匹配；Cookie 从全部 Set-Cookie 中解析
    pub fn from_response(url: &str, headers: &HashMap<String, Vec<String>>, body: &[u8]) -> Self {
        let headers = HeaderConverter::normalize(headers);
        let cookies = HeaderConverter::parse_set_cookies(&headers);
        let text = String::from_utf8_lossy(body).into_owned();
        let is_html = Self::sniff_html(&headers, &text);
        let is_javascript = !is_html && Self::has_js_extension(url);

        let mut evidence = Self {
            url: url.to_string(),
            headers,
            cookies,
            ..Default::default()
        };

        if is_html {
            return evidence.with_html(text);
        }
        if text.is_empty() {
            return evidence;
        }

        // 非HTML响应体同样参与 HTML 模式匹配，但不提取标签
        evidence.meta = Some(Vec::new());
        if is_javascript {
            evidence.javascript = Some(text.clone());
        }
        evidence.html = Some(text);
        evidence
    }

    /// 从 HeaderMap 形式的原始响应构建证据
    pub fn from_header_map(url: &str, headers: &HeaderMap, body: &[u8]) -> Self {
        Self::from_response(url, &HeaderConverter::to_hashmap(headers), body)
    }

    fn sniff_html(headers: &HashMap<String, Vec<String>>, text: &str) -> bool {
        let declared_html = headers
            .get("content-type")
            .is_some_and(|values| values.iter().any(|v| v.to_ascii_lowercase().contains("html")));
        declared_html || HTML_SIGNATURE_REGEX.is_match(text.trim_start_matches('\u{feff}'))
    }

    fn has_js_extension(url: &str) -> bool {
        match url::Url::parse(url) {
            Ok(parsed) => parsed.path().ends_with(".js"),
            // 相对路径或非法URL：去掉查询串与片段后判断
            Err(_) => url
                .split(['?', '#'])
                .next()
                .is_some_and(|path| path.ends_with(".js")),
        }
    }
}
