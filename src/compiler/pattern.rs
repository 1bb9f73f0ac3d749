//! 编译后模式模型
//! 正则编译后的结构，加载完成后只读

use std::collections::BTreeMap;
use regex::Regex;

/// 编译后的正则模式
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    // 版本模板，可引用 \1 \2 \3 捕获组
    pub version_template: Option<String>,
}

impl CompiledPattern {
    /// 返回全部非重叠匹配，每个匹配为 [整体匹配, 分组1, 分组2, ...]，未参与匹配的分组为空串
    pub fn find_all(&self, content: &str) -> Vec<Vec<String>> {
        self.regex
            .captures_iter(content)
            .map(|caps| {
                caps.iter()
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

/// 键值型模式（header/meta/cookie）
/// pattern 为 None 表示规则值为空：只要键存在即命中
#[derive(Debug, Clone)]
pub struct NamedPattern {
    pub name: String,
    pub pattern: Option<CompiledPattern>,
}

/// 技术签名
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub name: String,
    pub category_ids: Vec<String>,
    pub html_patterns: Vec<CompiledPattern>,
    pub script_patterns: Vec<CompiledPattern>,
    pub url_patterns: Vec<CompiledPattern>,
    pub header_patterns: Vec<NamedPattern>,
    pub meta_patterns: Vec<NamedPattern>,
    pub cookie_patterns: Vec<NamedPattern>,
    // JS 全局变量名，仅做子串包含判断
    pub js_globals: Vec<String>,
    pub website: Option<String>,
    pub implies: Vec<String>,
}

impl Signature {
    /// 可用于匹配的模式总数，为 0 时该签名永远不会直接命中
    pub fn pattern_count(&self) -> usize {
        self.html_patterns.len()
            + self.script_patterns.len()
            + self.url_patterns.len()
            + self.header_patterns.len()
            + self.meta_patterns.len()
            + self.cookie_patterns.len()
            + self.js_globals.len()
    }
}

/// 分类
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// 编译后的签名库
/// 构建一次后只读，可在多线程间共享
#[derive(Debug, Clone, Default)]
pub struct SignatureDatabase {
    pub signatures: BTreeMap<String, Signature>,
    pub categories: BTreeMap<String, Category>, // 分类ID -> 分类
}

impl SignatureDatabase {
    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.signatures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.signatures.contains_key(name)
    }

    /// 分类ID转名称，未知ID返回空串
    pub fn category_by_id(&self, id: &str) -> &str {
        self.categories
            .get(id)
            .map(|category| category.name.as_str())
            .unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.values()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
