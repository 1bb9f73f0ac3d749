//! 检测模块：技术检测核心逻辑
pub mod analyzer;
pub mod category;
pub mod detector;
pub mod engine;
pub mod implies;
pub mod result;

// 导出核心接口
pub use self::analyzer::{Analyzer, MatchContext};
pub use self::category::CategoryResolver;
pub use self::detector::TechDetector;
pub use self::engine::MatchEngine;
pub use self::implies::ImplicationResolver;
pub use self::result::Match;
