//! techprint - Wappalyzer风格的网站技术指纹识别引擎

// 导出全局错误类型
pub use self::error::{LoadError, TechResult, TechprintError};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, GlobalConfig};

// 导出规则模块核心接口
pub use self::rule::{DefinitionsDocument, RuleCacheManager, RuleLoader, SignatureStore};

// 导出编译模块核心接口
pub use self::compiler::{Category, CompiledPattern, RuleCompiler, Signature, SignatureDatabase};

// 导出提取模块核心接口
pub use self::extractor::{Evidence, HtmlExtractor};

// 导出工具模块核心接口
pub use self::utils::{DetectionUpdater, HeaderConverter, VersionExtractor};

// 导出检测模块核心接口
pub use self::detector::{CategoryResolver, ImplicationResolver, Match, MatchEngine, TechDetector};

// 导出聚合模块核心接口
pub use self::aggregator::{HostResult, ResultAggregator, SiteMap};

// 声明所有子模块
pub mod aggregator;
pub mod compiler;
pub mod config;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod rule;
pub mod utils;
