//! 规则编译器核心
//! 仅负责将原始规则编译为可执行的正则模式
//!
//! 模式语法：`<regex>` 后可跟若干以字面量 `\;` 分隔的属性，目前只识别
//! `version:<模板>`。单条模式编译失败不影响同一技术的其他模式。

use std::collections::BTreeMap;
use std::time::Instant;
use regex::Regex;
use tracing::debug;

use super::pattern::{Category, CompiledPattern, NamedPattern, Signature, SignatureDatabase};
use crate::rule::model::{DefinitionsDocument, PatternMap, StringList, TechDefinition};

/// 模式属性分隔符（定义文件中的字面量 `\;`）
const ATTRIBUTE_SEPARATOR: &str = "\\;";
const VERSION_PREFIX: &str = "version:";

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译整个定义文档，编译失败的模式被静默丢弃
    pub fn compile(document: &DefinitionsDocument) -> SignatureDatabase {
        let start = Instant::now();
        let mut stats = CompileStats::default();

        // 1. 构建分类映射（ID -> 名称）
        let categories: BTreeMap<String, Category> = document
            .categories
            .iter()
            .map(|(id, def)| {
                (id.clone(), Category { id: id.clone(), name: def.name.clone() })
            })
            .collect();

        // 2. 编译每个技术规则
        let signatures: BTreeMap<String, Signature> = document
            .technologies
            .iter()
            .map(|(name, def)| (name.clone(), Self::compile_tech_rule(name, def, &mut stats)))
            .collect();

        // 3. 输出编译统计
        debug!("✅ 规则编译完成，总耗时{:?}", start.elapsed());
        debug!(
            "📊 编译统计：技术{}条、分类{}条、HTML模式{}条、Header模式{}条、URL模式{}条、Script模式{}条、Meta模式{}条、JS变量{}条、Cookie模式{}条、丢弃{}条",
            signatures.len(),
            categories.len(),
            stats.html_count,
            stats.header_count,
            stats.url_count,
            stats.script_count,
            stats.meta_count,
            stats.js_count,
            stats.cookie_count,
            stats.dropped_count
        );

        SignatureDatabase { signatures, categories }
    }

    /// 编译单个技术规则
    fn compile_tech_rule(name: &str, def: &TechDefinition, stats: &mut CompileStats) -> Signature {
        let html_patterns = Self::compile_pattern_list(name, &def.html, stats);
        stats.html_count += html_patterns.len();

        // script 与 scriptSrc 合并为同一通道
        let mut script_patterns = Self::compile_pattern_list(name, &def.script, stats);
        script_patterns.extend(Self::compile_pattern_list(name, &def.script_src, stats));
        stats.script_count += script_patterns.len();

        let url_patterns = Self::compile_pattern_list(name, &def.url, stats);
        stats.url_count += url_patterns.len();

        let header_patterns = Self::compile_keyed_patterns(name, &def.headers, stats);
        stats.header_count += header_patterns.len();

        let meta_patterns = Self::compile_keyed_patterns(name, &def.meta, stats);
        stats.meta_count += meta_patterns.len();

        let cookie_patterns = Self::compile_keyed_patterns(name, &def.cookies, stats);
        stats.cookie_count += cookie_patterns.len();

        // js 只关心键名，值内容忽略
        let js_globals: Vec<String> = def.js.iter().map(|(key, _)| key.clone()).collect();
        stats.js_count += js_globals.len();

        Signature {
            name: name.to_string(),
            category_ids: def
                .cats
                .iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            html_patterns,
            script_patterns,
            url_patterns,
            header_patterns,
            meta_patterns,
            cookie_patterns,
            js_globals,
            website: def.website.clone(),
            implies: Self::parse_implies(&def.implies),
        }
    }

    /// 编译列表型模式（html/script/url）
    fn compile_pattern_list(
        tech_name: &str,
        raw_patterns: &StringList,
        stats: &mut CompileStats,
    ) -> Vec<CompiledPattern> {
        raw_patterns
            .iter()
            .filter_map(|raw| match Self::compile_single_pattern(raw) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    debug!("丢弃无法编译的模式：技术={}，模式={}，错误={}", tech_name, raw, e);
                    stats.dropped_count += 1;
                    None
                }
            })
            .collect()
    }

    /// 编译键值型模式（header/meta/cookie），正则部分为空时只检测键存在
    fn compile_keyed_patterns(
        tech_name: &str,
        raw_map: &PatternMap,
        stats: &mut CompileStats,
    ) -> Vec<NamedPattern> {
        let mut compiled = Vec::new();
        for (key, raw_patterns) in raw_map.iter() {
            for raw in raw_patterns.iter() {
                let (regex_part, _) = Self::split_pattern(raw);
                if regex_part.is_empty() {
                    compiled.push(NamedPattern { name: key.clone(), pattern: None });
                    continue;
                }

                match Self::compile_single_pattern(raw) {
                    Ok(pattern) => compiled.push(NamedPattern {
                        name: key.clone(),
                        pattern: Some(pattern),
                    }),
                    Err(e) => {
                        debug!(
                            "丢弃无法编译的模式：技术={}，键={}，模式={}，错误={}",
                            tech_name, key, raw, e
                        );
                        stats.dropped_count += 1;
                    }
                }
            }
        }
        compiled
    }

    /// 编译单个模式字符串：`<regex>[\;version:<模板>]`
    pub fn compile_single_pattern(raw_pattern: &str) -> Result<CompiledPattern, regex::Error> {
        let (regex_part, version_template) = Self::split_pattern(raw_pattern);
        let regex = Regex::new(regex_part)?;
        Ok(CompiledPattern { regex, version_template })
    }

    /// 拆分正则与属性，返回 (正则, 版本模板)
    fn split_pattern(raw_pattern: &str) -> (&str, Option<String>) {
        let mut parts = raw_pattern.split(ATTRIBUTE_SEPARATOR);
        let regex_part = parts.next().unwrap_or_default();
        let version_template = parts
            .find_map(|attr| attr.strip_prefix(VERSION_PREFIX))
            .filter(|template| !template.is_empty())
            .map(str::to_string);
        (regex_part, version_template)
    }

    /// 解析implies规则，去掉 `\;confidence:50` 一类的属性后缀
    fn parse_implies(implies: &StringList) -> Vec<String> {
        implies
            .iter()
            .filter_map(|raw| {
                let name = raw.split(ATTRIBUTE_SEPARATOR).next().unwrap_or_default().trim();
                (!name.is_empty()).then(|| name.to_string())
            })
            .collect()
    }
}

/// 编译统计信息
#[derive(Debug, Clone, Default)]
struct CompileStats {
    html_count: usize,
    header_count: usize,
    url_count: usize,
    script_count: usize,
    meta_count: usize,
    js_count: usize,
    cookie_count: usize,
    dropped_count: usize,
}
