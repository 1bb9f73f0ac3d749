//! 聚合模块：按主机归并检测结果并输出
pub mod aggregator;
pub mod host_result;
pub mod site_map;

pub use self::aggregator::ResultAggregator;
pub use self::host_result::HostResult;
pub use self::site_map::SiteMap;
