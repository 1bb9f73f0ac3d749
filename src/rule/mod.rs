//! 规则模块：负责定义文件的数据模型、加载与缓存
pub mod model;
pub mod cache;
pub mod loader;

// 导出核心接口
pub use self::model::{CategoryDefinition, DefinitionsDocument, PatternMap, StringList, TechDefinition};
pub use self::loader::{RuleLoader, SignatureStore};
pub use self::cache::RuleCacheManager;
