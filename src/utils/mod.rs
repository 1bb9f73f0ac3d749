//! 工具模块：版本提取、Header转换、检测结果累积
pub mod version_extractor;
pub mod header_converter;
pub mod detection_updater;

pub use self::version_extractor::VersionExtractor;
pub use self::header_converter::HeaderConverter;
pub use self::detection_updater::{ChannelHit, DetectionUpdater, Finding};
