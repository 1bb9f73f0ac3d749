//! 页面与脚本资源的归属映射
//! 脚本资源的检测结果归入引用它的页面

use std::collections::HashMap;
use tracing::trace;
use url::Url;

/// 解析后的脚本URL → 引用页面URL
#[derive(Debug, Clone, Default)]
pub struct SiteMap {
    owners: HashMap<String, String>,
}

impl SiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记页面引用的脚本，src 以页面URL为基准解析；同一脚本以首次登记的页面为准
    /// 返回本次新登记的脚本URL
    pub fn register<S: AsRef<str>>(&mut self, page_url: &str, script_srcs: &[S]) -> Vec<String> {
        let Ok(base) = Url::parse(page_url) else {
            trace!("页面URL无法解析，跳过脚本登记：{}", page_url);
            return Vec::new();
        };

        let mut added = Vec::new();
        for src in script_srcs {
            let Ok(resolved) = base.join(src.as_ref().trim()) else {
                continue;
            };
            let resolved = resolved.to_string();
            if resolved == page_url || self.owners.contains_key(&resolved) {
                continue;
            }
            self.owners.insert(resolved.clone(), page_url.to_string());
            added.push(resolved);
        }
        added
    }

    /// 查询脚本所属页面
    pub fn owner(&self, resource_url: &str) -> Option<&str> {
        self.owners.get(resource_url).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
