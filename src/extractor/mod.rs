//! 提取模块：HTML标签提取与检测证据构建
pub mod html_extractor;
pub mod evidence;

pub use self::html_extractor::{ExtractResult, HtmlExtractor};
pub use self::evidence::Evidence;
