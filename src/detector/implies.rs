//! 关联推导：按签名的 implies 关系追加推导结果
//! 只展开一层，被推导技术自身的 implies 不再继续展开；重复项保留，由聚合层决定是否去重

use tracing::trace;

use crate::compiler::SignatureDatabase;
use super::category::CategoryResolver;
use super::result::Match;

pub struct ImplicationResolver;

impl ImplicationResolver {
    /// 在每个直接命中的结果之后追加其推导结果，数据库中不存在的技术名忽略
    pub fn expand(matches: Vec<Match>, db: &SignatureDatabase) -> Vec<Match> {
        let mut expanded = Vec::with_capacity(matches.len());

        for m in matches {
            let implied: Vec<Match> = if m.synthetic {
                Vec::new()
            } else {
                db.get(&m.name)
                    .map(|signature| {
                        signature
                            .implies
                            .iter()
                            .filter(|name| db.contains(name))
                            .map(|name| {
                                trace!("关联推导：{} → {}", m.name, name);
                                Match::implied(name.clone(), CategoryResolver::resolve_by_name(name, db))
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            };

            expanded.push(m);
            expanded.extend(implied);
        }

        expanded
    }
}
