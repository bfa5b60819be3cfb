//! 时间档位选择 - 业务能力层
//!
//! 所有组卷模式共用同一套档位离散化逻辑

use crate::error::ConfigError;

/// 有序的时间档位集合（分钟）
///
/// 构造时保证非空、严格递增且全部大于 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSet {
    tiers: Vec<u32>,
}

impl TierSet {
    pub fn new(name: &str, tiers: Vec<u32>) -> Result<Self, ConfigError> {
        if tiers.is_empty() {
            return Err(ConfigError::EmptyTiers {
                name: name.to_string(),
            });
        }
        let ascending = tiers.windows(2).all(|w| w[0] < w[1]);
        if !ascending || tiers[0] == 0 {
            return Err(ConfigError::InvalidTiers {
                name: name.to_string(),
                tiers,
            });
        }
        Ok(Self { tiers })
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.tiers
    }

    pub fn min(&self) -> u32 {
        self.tiers[0]
    }

    pub fn max(&self) -> u32 {
        self.tiers[self.tiers.len() - 1]
    }

    /// 不小于 `minutes` 的最小档位；超过所有档位时返回最大档位
    pub fn nearest(&self, minutes: u32) -> u32 {
        nearest_tier(minutes, &self.tiers)
    }

    /// 窗口 `[tier - tolerance, tier + overage]` 包含 `total` 的档位中离 `total` 最近的一个
    ///
    /// 距离相同时取较小的档位
    pub fn hit(&self, total: u32, tolerance: u32, overage: u32) -> Option<u32> {
        self.tiers
            .iter()
            .copied()
            .filter(|&tier| {
                total >= tier.saturating_sub(tolerance) && total <= tier.saturating_add(overage)
            })
            .min_by_key(|&tier| tier.abs_diff(total))
    }
}

/// 不小于 `minutes` 的最小档位；超过所有档位时返回最大档位
///
/// `tiers` 必须升序且非空
pub fn nearest_tier(minutes: u32, tiers: &[u32]) -> u32 {
    let idx = tiers.partition_point(|&t| t < minutes);
    match tiers.get(idx) {
        Some(&tier) => tier,
        None => tiers[tiers.len() - 1],
    }
}
