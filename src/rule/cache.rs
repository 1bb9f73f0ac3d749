//! 规则缓存管理
//! 仅处理定义文档的本地序列化（MessagePack）和反序列化

use tracing::debug;

use super::model::DefinitionsDocument;
use crate::error::{TechResult, TechprintError};
use crate::config::GlobalConfig;

/// 规则缓存管理器
pub struct RuleCacheManager;

impl RuleCacheManager {
    /// 从本地缓存加载定义文档
    pub async fn load_from_cache(config: &GlobalConfig) -> TechResult<DefinitionsDocument> {
        let cache_data = tokio::fs::read(&config.rule_cache_path).await?;

        // MessagePack反序列化
        let document: DefinitionsDocument = rmp_serde::from_slice(&cache_data)
            .map_err(|e| TechprintError::MsgPackError(format!("反序列化失败：{}", e)))?;

        debug!(
            "缓存文件反序列化成功，技术定义数：{}，分类数：{}",
            document.technologies.len(),
            document.categories.len()
        );

        Ok(document)
    }

    /// 将定义文档缓存到本地
    pub async fn save_to_cache(config: &GlobalConfig, document: &DefinitionsDocument) -> TechResult<()> {
        // 按字段名编码，缺省字段可安全回读
        let cache_data = rmp_serde::to_vec_named(document)
            .map_err(|e| TechprintError::MsgPackError(format!("序列化失败：{}", e)))?;

        debug!("定义文档序列化成功，序列化后数据大小：{} 字节", cache_data.len());

        tokio::fs::write(&config.rule_cache_path, cache_data)
            .await
            .map_err(|e| TechprintError::RuleCacheError(format!("写入缓存文件失败：{}", e)))?;
        Ok(())
    }

    /// 清除本地缓存
    pub async fn clear_cache(config: &GlobalConfig) -> TechResult<()> {
        let cache_path = &config.rule_cache_path;
        if cache_path.exists() {
            tokio::fs::remove_file(cache_path).await?;
        }
        Ok(())
    }
}
