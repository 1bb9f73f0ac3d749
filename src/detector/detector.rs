//! 检测器核心：整合匹配引擎、关联推导与分类解析，输出检测结果
use std::collections::HashMap;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::debug;

use super::category::CategoryResolver;
use super::engine::MatchEngine;
use super::implies::ImplicationResolver;
use super::result::Match;
use crate::compiler::SignatureDatabase;
use crate::config::GlobalConfig;
use crate::error::TechResult;
use crate::extractor::Evidence;
use crate::rule::RuleLoader;

/// 技术检测器
/// 克隆后共享同一份签名库，可在多线程间并发调用
#[derive(Debug, Clone)]
pub struct TechDetector {
    db: Arc<SignatureDatabase>,
    config: GlobalConfig,
}

impl TechDetector {
    /// 创建检测器：按配置加载并编译签名库
    pub async fn new(config: GlobalConfig) -> TechResult<Self> {
        let db = RuleLoader::load(&config).await?;
        Ok(Self {
            db: Arc::new(db),
            config,
        })
    }

    /// 使用已构建的签名库创建检测器
    pub fn with_database(db: SignatureDatabase) -> Self {
        Self {
            db: Arc::new(db),
            config: GlobalConfig::default(),
        }
    }

    pub fn database(&self) -> &SignatureDatabase {
        &self.db
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// 核心检测接口：匹配 → 关联推导 → 分类名称
    pub fn detect(&self, evidence: &Evidence) -> Vec<Match> {
        let matches = MatchEngine::match_evidence(evidence, &self.db);
        let mut expanded = ImplicationResolver::expand(matches, &self.db);
        CategoryResolver::attach(&mut expanded, &self.db);

        if self.config.verbose {
            debug!(
                "检测完成：URL={}，结果：{}",
                evidence.url,
                expanded.iter().map(Match::label).collect::<Vec<_>>().join(",")
            );
        }
        expanded
    }

    /// 检测接口（HeaderMap + URL + Body）
    pub fn detect_response(&self, url: &str, headers: &HeaderMap, body: &[u8]) -> Vec<Match> {
        self.detect(&Evidence::from_header_map(url, headers, body))
    }

    /// 检测接口（HashMap<String, Vec<String>> 头）
    pub fn detect_with_hashmap(
        &self,
        url: &str,
        headers: &HashMap<String, Vec<String>>,
        body: &[u8],
    ) -> Vec<Match> {
        self.detect(&Evidence::from_response(url, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::SignatureStore;
    use reqwest::header::{HeaderValue, SET_COOKIE};

    fn detector() -> TechDetector {
        let db = SignatureStore::load_from_str(r#"{
            "technologies": {
                "WordPress": {
                    "cats": [1, 11],
                    "meta": {"generator": "WordPress ?([\\d.]+)?\\;version:\\1"},
                    "implies": ["PHP", "MySQL"]
                },
                "PHP": {"cats": [27], "headers": {"X-Powered-By": "^PHP/?([\\d.]+)?\\;version:\\1"}},
                "MySQL": {"cats": [34], "implies": "Linux"},
                "Linux": {},
                "Laravel": {"cookies": {"laravel_session": ""}, "implies": "PHP\\;confidence:50"}
            },
            "categories": {
                "1": {"name": "CMS"},
                "11": {"name": "Blogs"},
                "27": {"name": "Programming languages"},
                "34": {"name": "Databases"}
            }
        }"#)
        .unwrap();
        TechDetector::with_database(db)
    }

    #[test]
    fn test_detect_expands_and_categorizes() {
        let evidence = Evidence::new("https://blog.example.com/")
            .with_html(r#"<meta name="generator" content="WordPress 5.4">"#);
        let matches = detector().detect(&evidence);

        let names: Vec<&str> = matches.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["WordPress", "PHP", "MySQL"]);
        assert_eq!(matches[0].version.as_deref(), Some("5.4"));
        assert_eq!(matches[0].categories, vec!["Blogs".to_string(), "CMS".to_string()]);
        assert!(matches[1].synthetic && matches[2].synthetic);
        assert_eq!(matches[2].categories, vec!["Databases".to_string()]);
    }

    #[test]
    fn test_detect_with_hashmap_parses_headers_and_cookies() {
        let mut headers = HashMap::new();
        headers.insert("X-Powered-By".to_string(), vec!["PHP/8.1.2".to_string()]);
        headers.insert(
            "Set-Cookie".to_string(),
            vec!["laravel_session=abc; path=/; httponly".to_string()],
        );

        let matches = detector().detect_with_hashmap("https://app.example.com/", &headers, b"");
        let labels: Vec<String> = matches.iter().map(Match::label).collect();
        assert_eq!(labels, vec!["Laravel", "PHP", "PHP/8.1.2"]);
    }

    #[test]
    fn test_detect_response_from_header_map() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("laravel_session=1"));

        let matches = detector().detect_response("https://app.example.com/", &headers, b"");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name, "Laravel");
        assert!(matches[1].synthetic);
    }

    #[test]
    fn test_no_evidence_yields_empty() {
        let matches = detector().detect(&Evidence::new("https://empty.example.com/"));
        assert!(matches.is_empty());
    }
}
