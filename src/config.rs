//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;

/// 上游 Wappalyzer 技术定义文件地址
pub const WAPPALYZER_URL: &str =
    "https://raw.githubusercontent.com/AliasIO/wappalyzer/master/src/technologies.json";

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // 本地技术定义文件（设置后优先使用，读取失败即报错）
    pub tech_file: Option<PathBuf>,
    // 规则缓存路径
    pub rule_cache_path: PathBuf,
    // 远程技术定义文件URL
    pub remote_url: String,
    // 超时配置（单位：秒）
    pub http_timeout: u64,
    // 是否启用详细日志
    pub verbose: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            tech_file: None,
            rule_cache_path: PathBuf::from("technologies.mp"),
            remote_url: WAPPALYZER_URL.to_string(),
            http_timeout: 30,
            verbose: false,
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tech_file(mut self, path: PathBuf) -> Self {
        self.config.tech_file = Some(path);
        self
    }

    pub fn rule_cache_path(mut self, path: PathBuf) -> Self {
        self.config.rule_cache_path = path;
        self
    }

    pub fn remote_url(mut self, url: String) -> Self {
        self.config.remote_url = url;
        self
    }

    pub fn http_timeout(mut self, timeout: u64) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}
