//! 规则数据模型定义
//! 仅存储技术定义文件的原始数据，无任何业务逻辑，支持序列化/反序列化
//!
//! 定义文件中 `html`/`script`/`url`/`implies`/`cats` 字段存在三种形态：
//! 单个字符串、字符串数组、（旧版）整数数组。统一在 [`StringList`] 中归一化，
//! 其余模块只接触规范化后的有序字符串序列。

use std::collections::BTreeMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 规范化后的有序字符串序列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    /// 从任意 JSON 值归一化：字符串 → [s]，数组 → 逐项转换，数字转十进制字符串，其余形态视为空
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self(vec![s.clone()]),
            Value::Number(n) => Self(vec![n.to_string()]),
            Value::Array(items) => Self(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Self::default(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for StringList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// 键值型规则（headers/meta/cookies/js）：键 → 模式列表
/// 值为空或 null 时保留一个空模式，表示仅检测键是否存在
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PatternMap(pub BTreeMap<String, StringList>);

impl PatternMap {
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(entries) = value else {
            return Self::default();
        };

        let map = entries
            .iter()
            .map(|(key, val)| {
                let mut patterns = StringList::from_value(val);
                if patterns.is_empty() {
                    patterns.0.push(String::new());
                }
                (key.clone(), patterns)
            })
            .collect();
        Self(map)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StringList)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for PatternMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// 技术定义（从 Wappalyzer JSON 解析），所有字段均可缺省
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TechDefinition {
    pub cats: StringList,
    pub cookies: PatternMap,
    pub headers: PatternMap,
    pub meta: PatternMap,
    pub js: PatternMap,
    pub html: StringList,
    pub script: StringList,
    // 兼容：新版定义文件的 scriptSrc 字段，编译时与 script 合并
    #[serde(rename = "scriptSrc")]
    pub script_src: StringList,
    pub url: StringList,
    pub website: Option<String>,
    pub implies: StringList,
}

/// 分类定义
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CategoryDefinition {
    #[serde(default)]
    pub name: String,
}

/// 完整技术定义文档：`{"technologies": {...}, "categories": {...}}`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DefinitionsDocument {
    #[serde(alias = "apps")]
    pub technologies: BTreeMap<String, TechDefinition>,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryDefinition>,
}
