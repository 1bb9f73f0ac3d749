//! Header格式转换工具
//! 不同Header格式之间的转换，以及从 Set-Cookie 中解析 Cookie

use std::collections::HashMap;
use reqwest::header::HeaderMap;
use tracing::warn;

/// 单个响应允许处理的最大Header条数
const MAX_HEADER_ENTRIES: usize = 1000;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// Header名规范化：统一小写
    pub fn canonical_key(name: &str) -> String {
        name.trim().to_ascii_lowercase()
    }

    /// 将HeaderMap转换为HashMap<String, Vec<String>>，键为规范化Header名
    pub fn to_hashmap(header_map: &HeaderMap) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();

        for (iter_count, (key, value)) in header_map.iter().enumerate() {
            if iter_count >= MAX_HEADER_ENTRIES {
                warn!("Header迭代超过{}次，强制终止", MAX_HEADER_ENTRIES);
                break;
            }

            // 非可见ASCII的值按有损UTF-8处理，而不是丢弃
            let value_str = match value.to_str() {
                Ok(v) => v.to_string(),
                Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            };

            map.entry(key.as_str().to_ascii_lowercase())
                .or_default()
                .push(value_str);
        }

        map
    }

    /// 规范化任意大小写的多值Header映射，同名Header的值按出现顺序合并
    pub fn normalize(headers: &HashMap<String, Vec<String>>) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::with_capacity(headers.len());
        // 按原始键排序，保证合并后的值顺序稳定
        let mut keys: Vec<&String> = headers.keys().collect();
        keys.sort();
        for key in keys {
            map.entry(Self::canonical_key(key))
                .or_default()
                .extend(headers[key].iter().cloned());
        }
        map
    }

    /// 从规范化Header中的 Set-Cookie 解析 Cookie 名值对
    /// 只取每条 Set-Cookie 第一个 `;` 之前的 `name=value`，同名Cookie后者覆盖前者
    pub fn parse_set_cookies(headers: &HashMap<String, Vec<String>>) -> HashMap<String, String> {
        let mut cookies = HashMap::new();
        let Some(raw_cookies) = headers.get("set-cookie") else {
            return cookies;
        };

        for raw in raw_cookies {
            let core_kv = raw.split(';').next().unwrap_or_default().trim();
            let Some((name, value)) = core_kv.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies.insert(name.to_string(), value.trim().to_string());
        }

        cookies
    }
}
