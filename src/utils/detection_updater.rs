//! 检测结果更新工具
//! 负责累积单个技术在各通道上的匹配证据与版本

/// 单个通道的匹配结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelHit {
    pub matches: Vec<Vec<String>>,
    pub version: Option<String>,
}

impl ChannelHit {
    /// 记录一次模式命中；通道内先得到的非空版本优先
    pub fn record(&mut self, matches: Vec<Vec<String>>, version: Option<String>) {
        self.matches.extend(matches);
        if self.version.is_none() {
            self.version = version.filter(|v| !v.is_empty());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// 单个技术跨通道累积的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finding {
    pub matches: Vec<Vec<String>>,
    pub version: Option<String>,
}

/// 检测结果更新工具
pub struct DetectionUpdater;

impl DetectionUpdater {
    /// 合并一个通道的结果
    /// 通道按固定顺序执行，后执行通道的非空版本覆盖之前的版本
    pub fn update(finding: &mut Finding, hit: ChannelHit) {
        if hit.is_empty() {
            return;
        }
        finding.matches.extend(hit.matches);
        if let Some(version) = hit.version {
            finding.version = Some(version);
        }
    }
}
