//! 版本提取工具模块
//! 负责根据版本模板，从正则匹配结果中提取技术版本号
//! 模板只支持 \1 \2 \3 三个分组引用

/// 支持的最大分组引用编号
const MAX_BACKREFERENCE: usize = 3;

/// 版本提取工具类
pub struct VersionExtractor;

impl VersionExtractor {
    /// 从匹配结果中提取版本号
    ///
    /// # 参数
    /// - `version_template`: 版本模板，如 `\1` 或 `\1.\2`
    /// - `matches`: 匹配结果，每项为 [整体匹配, 分组1, 分组2, ...]
    ///
    /// # 返回值
    /// 按顺序取第一个分组数量足够、且替换结果非空的匹配项；
    /// 模板不含分组引用、或所有匹配项都无法得到非空版本时返回 `None`
    pub fn extract(version_template: &str, matches: &[Vec<String>]) -> Option<String> {
        let referenced = Self::highest_reference(version_template)?;

        matches
            .iter()
            .filter(|tuple| tuple.len() > referenced)
            .find_map(|tuple| {
                let mut version = version_template.to_string();
                for group_index in 1..=MAX_BACKREFERENCE {
                    let placeholder = format!("\\{}", group_index);
                    if version.contains(&placeholder) {
                        let group = tuple.get(group_index).map(|g| g.trim()).unwrap_or("");
                        version = version.replace(&placeholder, group);
                    }
                }

                let version = version.trim();
                // 残留反斜杠说明存在不支持的引用（如 \4）
                (!version.is_empty() && !version.contains('\\')).then(|| version.to_string())
            })
    }

    /// 模板中引用的最大分组编号，无引用时返回 None
    fn highest_reference(version_template: &str) -> Option<usize> {
        (1..=MAX_BACKREFERENCE)
            .rev()
            .find(|i| version_template.contains(&format!("\\{}", i)))
    }
}
