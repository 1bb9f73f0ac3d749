//! 技术检测结果结构

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::utils::Finding;

/// 单个技术的检测结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub name: String,
    // 分类名称，按字典序排列
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    // 各通道命中的原始匹配项
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<Vec<String>>,
    // 由关联推导产生，无直接证据
    #[serde(default)]
    pub synthetic: bool,
}

impl Match {
    /// 由直接证据产生的结果
    pub fn detected(name: impl Into<String>, categories: Vec<String>, finding: Finding) -> Self {
        Self {
            name: name.into(),
            categories,
            version: finding.version,
            matches: finding.matches,
            synthetic: false,
        }
    }

    /// 关联推导产生的结果
    pub fn implied(name: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            name: name.into(),
            categories,
            version: None,
            matches: Vec::new(),
            synthetic: true,
        }
    }

    /// 紧凑格式：`name` 或 `name/version`
    pub fn label(&self) -> String {
        match &self.version {
            Some(v) if !v.is_empty() => format!("{}/{}", self.name, v),
            _ => self.name.clone(),
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_with_and_without_version() {
        let finding = Finding {
            matches: vec![vec!["nginx/1.25.3".to_string(), "1.25.3".to_string()]],
            version: Some("1.25.3".to_string()),
        };
        let detected = Match::detected("Nginx", vec!["Web servers".to_string()], finding);
        assert_eq!(detected.label(), "Nginx/1.25.3");
        assert!(!detected.synthetic);

        let implied = Match::implied("PHP", Vec::new());
        assert_eq!(implied.to_string(), "PHP");
        assert!(implied.synthetic);
        assert!(implied.matches.is_empty());
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let implied = Match::implied("PHP", vec!["Programming languages".to_string()]);
        let json = serde_json::to_value(&implied).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "PHP",
                "categories": ["Programming languages"],
                "synthetic": true
            })
        );
    }
}
