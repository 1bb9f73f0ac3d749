//! 单个主机的最终检测结果

use serde::Serialize;

use crate::detector::Match;
use crate::error::TechResult;

/// 单个主机的全部检测结果，保留提交顺序，允许重复
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostResult {
    pub host: String,
    pub matches: Vec<Match>,
}

impl HostResult {
    pub fn new(host: impl Into<String>, matches: Vec<Match>) -> Self {
        Self {
            host: host.into(),
            matches,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// 紧凑文本：按技术名称合并后输出 `name` 或 `name/version`，逗号分隔
    pub fn summary(&self) -> String {
        self.distinct()
            .iter()
            .map(Match::label)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// 按技术名称合并
    ///
    /// 直接命中优先于推导结果；版本取第一个非空值；匹配项拼接；分类取并集后排序
    pub fn distinct(&self) -> Vec<Match> {
        let mut merged: Vec<Match> = Vec::new();
        for m in &self.matches {
            let Some(existing) = merged.iter_mut().find(|e| e.name == m.name) else {
                merged.push(m.clone());
                continue;
            };

            existing.synthetic &= m.synthetic;
            if existing.version.is_none() {
                existing.version = m.version.clone();
            }
            existing.matches.extend(m.matches.iter().cloned());
            for category in &m.categories {
                if !existing.categories.contains(category) {
                    existing.categories.push(category.clone());
                }
            }
            existing.categories.sort();
        }
        merged
    }

    /// 序列化为JSON
    pub fn to_json(&self) -> TechResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
