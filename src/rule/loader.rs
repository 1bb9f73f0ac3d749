//! 规则加载管理器
//! `SignatureStore` 负责从任意数据源同步解析并编译签名库，
//! `RuleLoader` 负责按配置从本地文件、本地缓存或远程拉取定义文件

use std::io::Read;
use std::path::Path;
use std::time::Duration;
use reqwest::Client;
use url::Url;
use tracing::{debug, warn};

use super::cache::RuleCacheManager;
use super::model::DefinitionsDocument;
use crate::compiler::{RuleCompiler, SignatureDatabase};
use crate::config::GlobalConfig;
use crate::error::{LoadError, TechResult, TechprintError};

/// 签名库构建入口
pub struct SignatureStore;

impl SignatureStore {
    /// 从任意读取源加载定义并编译为签名库
    pub fn load_definitions<R: Read>(mut source: R) -> Result<SignatureDatabase, LoadError> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        Self::load_from_slice(&bytes)
    }

    pub fn load_from_slice(bytes: &[u8]) -> Result<SignatureDatabase, LoadError> {
        let document = Self::parse_document(bytes)?;
        Ok(Self::from_document(&document))
    }

    pub fn load_from_str(content: &str) -> Result<SignatureDatabase, LoadError> {
        Self::load_from_slice(content.as_bytes())
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<SignatureDatabase, LoadError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::load_definitions(std::io::BufReader::new(file))
    }

    /// 从已解析的文档编译签名库
    pub fn from_document(document: &DefinitionsDocument) -> SignatureDatabase {
        RuleCompiler::compile(document)
    }

    /// 解析顶层文档，结构不符合 `{"technologies": {...}, "categories": {...}}` 时报错
    pub fn parse_document(bytes: &[u8]) -> Result<DefinitionsDocument, LoadError> {
        serde_json::from_slice(bytes).map_err(|e| {
            TechprintError::RuleLoadError(format!("技术定义文件结构不符合预期：{}", e))
        })
    }
}

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 加载签名库：本地定义文件 > 本地缓存 > 远程拉取
    pub async fn load(config: &GlobalConfig) -> TechResult<SignatureDatabase> {
        let document = Self::load_document(config).await?;
        let db = SignatureStore::from_document(&document);
        debug!("签名库加载完成，技术{}条，分类{}条", db.len(), db.categories.len());
        Ok(db)
    }

    /// 加载原始定义文档
    pub async fn load_document(config: &GlobalConfig) -> TechResult<DefinitionsDocument> {
        // 1. 显式指定的定义文件，读取失败直接报错
        if let Some(tech_file) = &config.tech_file {
            debug!("从本地定义文件加载：{}", tech_file.display());
            let bytes = tokio::fs::read(tech_file).await?;
            return SignatureStore::parse_document(&bytes);
        }

        // 2. 本地缓存
        match RuleCacheManager::load_from_cache(config).await {
            Ok(document) => {
                debug!("从本地缓存加载规则库成功");
                return Ok(document);
            }
            Err(e) => warn!("本地缓存不存在或损坏（{}），将拉取远程定义文件", e),
        }

        // 3. 远程拉取并写入缓存
        let bytes = Self::fetch_remote(config).await?;
        let document = SignatureStore::parse_document(&bytes)?;
        if let Err(e) = RuleCacheManager::save_to_cache(config, &document).await {
            warn!("规则库缓存到本地失败：{}", e);
        } else {
            debug!("远程规则库已缓存到本地");
        }
        Ok(document)
    }

    /// 下载远程定义文件到本地路径
    pub async fn download(config: &GlobalConfig, to: impl AsRef<Path>) -> TechResult<()> {
        let bytes = Self::fetch_remote(config).await?;
        // 先校验结构再落盘，避免写入错误页面
        SignatureStore::parse_document(&bytes)?;
        tokio::fs::write(to.as_ref(), &bytes).await?;
        debug!("定义文件已下载到：{}", to.as_ref().display());
        Ok(())
    }

    /// 拉取远程定义文件原始字节
    async fn fetch_remote(config: &GlobalConfig) -> TechResult<Vec<u8>> {
        let url = Url::parse(&config.remote_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TechprintError::InvalidInput(format!("不支持的远程地址协议：{}", url.scheme())));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .build()?;

        debug!("开始拉取远程定义文件：{}", config.remote_url);
        let response = client
            .get(url)
            .header("User-Agent", concat!("techprint/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TechprintError::RuleLoadError(format!(
                "URL {} 返回状态码 {}",
                config.remote_url,
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        debug!("远程定义文件拉取成功，大小：{} 字节", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use std::path::PathBuf;

    const DEFINITIONS: &str = r#"{
        "technologies": {
            "Nginx": {
                "cats": ["22"],
                "headers": {"Server": "nginx(?:/([\\d.]+))?\\;version:\\1"},
                "website": "http://nginx.org/en"
            }
        },
        "categories": {"22": {"name": "Web Servers"}}
    }"#;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("techprint-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_load_definitions_from_reader() {
        let db = SignatureStore::load_definitions(DEFINITIONS.as_bytes()).unwrap();
        assert_eq!(db.len(), 1);
        assert_eq!(db.category_by_id("22"), "Web Servers");
        assert_eq!(db.get("Nginx").unwrap().website.as_deref(), Some("http://nginx.org/en"));
    }

    #[test]
    fn test_schema_mismatch_is_load_error() {
        let err = SignatureStore::load_from_str(r#"{"technologies": ["not", "a", "map"]}"#).unwrap_err();
        assert!(matches!(err, TechprintError::RuleLoadError(_)));

        let err = SignatureStore::load_from_str("not json at all").unwrap_err();
        assert!(matches!(err, TechprintError::RuleLoadError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SignatureStore::load_from_path("/nonexistent/technologies.json").unwrap_err();
        assert!(matches!(err, TechprintError::IoError(_)));
    }

    #[tokio::test]
    async fn test_rule_loader_prefers_tech_file() {
        let path = temp_path("loader-tech.json");
        tokio::fs::write(&path, DEFINITIONS).await.unwrap();

        let config = ConfigManager::custom()
            .tech_file(path.clone())
            .rule_cache_path(temp_path("loader-unused.mp"))
            .build();
        let db = RuleLoader::load(&config).await.unwrap();
        assert!(db.contains("Nginx"));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_rule_loader_falls_back_to_cache() {
        let cache_path = temp_path("loader-cache.mp");
        let config = ConfigManager::custom()
            .rule_cache_path(cache_path.clone())
            // 缓存命中时不会访问远程地址
            .remote_url("http://127.0.0.1:9/unreachable.json".to_string())
            .build();

        let document = SignatureStore::parse_document(DEFINITIONS.as_bytes()).unwrap();
        RuleCacheManager::save_to_cache(&config, &document).await.unwrap();

        let db = RuleLoader::load(&config).await.unwrap();
        assert!(db.contains("Nginx"));

        RuleCacheManager::clear_cache(&config).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_remote_url_rejected() {
        let config = ConfigManager::custom()
            .rule_cache_path(temp_path("loader-missing.mp"))
            .remote_url("not a url".to_string())
            .build();
        let err = RuleLoader::load(&config).await.unwrap_err();
        assert!(matches!(err, TechprintError::UrlError(_)));

        let config = ConfigManager::custom()
            .rule_cache_path(temp_path("loader-missing.mp"))
            .remote_url("ftp://example.com/technologies.json".to_string())
            .build();
        let err = RuleLoader::download(&config, temp_path("loader-download.json")).await.unwrap_err();
        assert!(matches!(err, TechprintError::InvalidInput(_)));
    }
}
