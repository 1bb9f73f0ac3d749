//! 结果聚合：同一主机（主页面及其引用的脚本资源）的检测结果归并到一个主机键下
//! 多个生产者并发提交，全部状态由同一把互斥锁保护

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};
use url::Url;

use super::host_result::HostResult;
use super::site_map::SiteMap;
use crate::detector::Match;
use crate::extractor::Evidence;

#[derive(Debug, Default)]
struct AggregatorState {
    site_map: SiteMap,
    hosts: HashMap<String, Vec<Match>>,
}

/// 检测结果聚合器
#[derive(Debug, Default)]
pub struct ResultAggregator {
    state: Mutex<AggregatorState>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        // 持锁方 panic 不影响已写入的结果
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 证据所属的主机键：已登记的脚本资源归入引用页面，其余使用自身URL
    pub fn host_key(&self, evidence: &Evidence) -> String {
        Self::resolve_host(&self.lock().site_map, evidence)
    }

    fn resolve_host(site_map: &SiteMap, evidence: &Evidence) -> String {
        if evidence.is_javascript() {
            let normalized = Url::parse(&evidence.url)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| evidence.url.clone());
            if let Some(page) = site_map.owner(&normalized) {
                return page.to_string();
            }
        }
        evidence.url.clone()
    }

    /// 提交一份证据的检测结果，同时登记其引用的脚本
    /// 脚本结果先于页面到达时，页面登记后将其并入页面
    pub fn submit(&self, evidence: &Evidence, matches: Vec<Match>) {
        let mut state = self.lock();
        if !evidence.script_srcs.is_empty() {
            Self::register_locked(&mut state, &evidence.url, &evidence.script_srcs);
        }

        let host = Self::resolve_host(&state.site_map, evidence);
        debug!("提交检测结果：{} → {}，{}项", evidence.url, host, matches.len());
        state.hosts.entry(host).or_default().extend(matches);
    }

    /// 预先登记页面引用的脚本，供爬虫在检测前固定主机键
    pub fn register_page<S: AsRef<str>>(&self, page_url: &str, script_srcs: &[S]) {
        Self::register_locked(&mut self.lock(), page_url, script_srcs);
    }

    /// 直接提交到指定主机键
    pub fn submit_to(&self, host: &str, matches: Vec<Match>) {
        debug!("提交检测结果：→ {}，{}项", host, matches.len());
        self.lock().hosts.entry(host.to_string()).or_default().extend(matches);
    }

    fn register_locked<S: AsRef<str>>(state: &mut AggregatorState, page_url: &str, script_srcs: &[S]) {
        for script_url in state.site_map.register(page_url, script_srcs) {
            // 以脚本自身URL暂存的结果迁移到页面下
            if let Some(early) = state.hosts.remove(&script_url) {
                debug!("脚本结果并入页面：{} → {}，{}项", script_url, page_url, early.len());
                state.hosts.entry(page_url.to_string()).or_default().extend(early);
            }
        }
    }

    /// 取出单个主机的最终结果，未提交过的主机返回空结果
    pub fn finalize(&self, host: &str) -> HostResult {
        let matches = self.lock().hosts.remove(host).unwrap_or_default();
        let result = HostResult::new(host, matches);
        if result.is_empty() {
            warn!("未识别到任何技术：{}", host);
        }
        result
    }

    /// 取出全部主机的最终结果，按主机键排序
    pub fn finalize_all(&self) -> Vec<HostResult> {
        let drained: BTreeMap<String, Vec<Match>> = self.lock().hosts.drain().collect();
        drained
            .into_iter()
            .map(|(host, matches)| HostResult::new(host, matches))
            .collect()
    }

    /// 当前待输出的主机数量
    pub fn pending_hosts(&self) -> usize {
        self.lock().hosts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::utils::Finding;

    fn direct(name: &str, version: Option<&str>) -> Match {
        Match::detected(
            name,
            Vec::new(),
            Finding {
                matches: vec![vec![name.to_string()]],
                version: version.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_script_results_fold_into_page() {
        let aggregator = ResultAggregator::new();
        let page = Evidence::new("https://example.com/").with_script_srcs(["/assets/app.js"]);
        aggregator.submit(&page, vec![direct("Nginx", Some("1.25.3"))]);

        let script = Evidence::new("https://example.com/assets/app.js").with_javascript("React.render()");
        assert_eq!(aggregator.host_key(&script), "https://example.com/");
        aggregator.submit(&script, vec![direct("React", None)]);

        let result = aggregator.finalize("https://example.com/");
        assert_eq!(result.summary(), "Nginx/1.25.3,React");
        assert_eq!(aggregator.pending_hosts(), 0);
    }

    #[test]
    fn test_script_submitted_before_page() {
        let aggregator = ResultAggregator::new();
        let script = Evidence::new("https://example.com/app.js").with_javascript("React.render()");
        aggregator.submit(&script, vec![direct("React", None)]);

        let page = Evidence::new("https://example.com/").with_script_srcs(["/app.js"]);
        aggregator.submit(&page, vec![direct("Nginx", None)]);

        let results = aggregator.finalize_all();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].host, "https://example.com/");
        assert_eq!(results[0].summary(), "React,Nginx");
    }

    #[test]
    fn test_register_page_and_submit_to() {
        let aggregator = ResultAggregator::new();
        aggregator.register_page("https://example.com/", &["/vendor.js"]);

        let script = Evidence::new("https://example.com/vendor.js").with_javascript("");
        assert_eq!(aggregator.host_key(&script), "https://example.com/");
        aggregator.submit(&script, vec![direct("jQuery", Some("3.7.1"))]);
        aggregator.submit_to("https://example.com/", vec![direct("Nginx", None)]);

        let result = aggregator.finalize("https://example.com/");
        assert_eq!(result.summary(), "jQuery/3.7.1,Nginx");
    }

    #[test]
    fn test_unregistered_script_keeps_own_url() {
        let aggregator = ResultAggregator::new();
        let script = Evidence::new("https://cdn.example.net/lib.js").with_javascript("x");
        assert_eq!(aggregator.host_key(&script), "https://cdn.example.net/lib.js");
    }

    #[test]
    fn test_finalize_unknown_host_is_empty() {
        let aggregator = ResultAggregator::new();
        let result = aggregator.finalize("https://nothing.example.com/");
        assert!(result.is_empty());
        assert_eq!(result.summary(), "");
    }

    #[test]
    fn test_finalize_all_sorted_by_host() {
        let aggregator = ResultAggregator::new();
        aggregator.submit(&Evidence::new("https://b.example.com/"), vec![direct("Caddy", None)]);
        aggregator.submit(&Evidence::new("https://a.example.com/"), vec![direct("Nginx", None)]);

        let results = aggregator.finalize_all();
        let hosts: Vec<&str> = results.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(hosts, vec!["https://a.example.com/", "https://b.example.com/"]);
        assert_eq!(aggregator.pending_hosts(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submit() {
        let aggregator = Arc::new(ResultAggregator::new());
        let page = Evidence::new("https://example.com/")
            .with_script_srcs((0..16).map(|i| format!("/js/{i}.js")));
        aggregator.submit(&page, vec![direct("Nginx", None)]);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let aggregator = Arc::clone(&aggregator);
                tokio::spawn(async move {
                    let script = Evidence::new(format!("https://example.com/js/{i}.js")).with_javascript("");
                    aggregator.submit(&script, vec![direct(&format!("Lib{i}"), None)]);
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let result = aggregator.finalize("https://example.com/");
        assert_eq!(result.matches.len(), 17);
        assert_eq!(aggregator.pending_hosts(), 0);
    }
}
