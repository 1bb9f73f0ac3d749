//! 分类解析：分类ID转名称并排序，保证多次运行输出顺序一致

use crate::compiler::{Signature, SignatureDatabase};
use super::result::Match;

pub struct CategoryResolver;

impl CategoryResolver {
    /// 解析签名的分类名称，未知ID与空名称忽略，结果按字典序排列
    pub fn resolve(signature: &Signature, db: &SignatureDatabase) -> Vec<String> {
        let mut names: Vec<String> = signature
            .category_ids
            .iter()
            .map(|id| db.category_by_id(id))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// 按签名名称解析，签名不存在时返回空列表
    pub fn resolve_by_name(name: &str, db: &SignatureDatabase) -> Vec<String> {
        db.get(name)
            .map(|signature| Self::resolve(signature, db))
            .unwrap_or_default()
    }

    /// 为一组结果重新填充分类名称
    pub fn attach(matches: &mut [Match], db: &SignatureDatabase) {
        for m in matches.iter_mut() {
            m.categories = Self::resolve_by_name(&m.name, db);
        }
    }
}
