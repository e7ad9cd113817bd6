//! 位置与检查点
//!
//! 每个命名位置（`Location`）对应轨道上一个固定检查点，检查点由
//! 沿运动线的比例（0.0 ~ 1.0）描述。映射必须是全射且单射的：
//! 每个位置都有检查点，且任意两个位置不共用检查点。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 命名位置（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Location {
    #[default]
    Desk,
    Bed,
    Closet,
}

impl Location {
    /// 所有位置（按声明顺序）
    pub const ALL: [Location; 3] = [Location::Desk, Location::Bed, Location::Closet];

    /// 协议字符串（与规划器输出一致）
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Desk => "DESK",
            Location::Bed => "BED",
            Location::Closet => "CLOSET",
        }
    }

    /// 在 `ALL` 中的下标
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = ProtocolError;

    /// 大小写不敏感解析（`desk`、`DESK`、`Desk` 均可）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Location::ALL
            .into_iter()
            .find(|loc| loc.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ProtocolError::UnknownLocation(trimmed.to_string()))
    }
}

/// 检查点下标
///
/// 下标 0 约定为 home（比例 0.0 一端）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Checkpoint(pub usize);

impl Checkpoint {
    /// home 检查点
    pub const HOME: Checkpoint = Checkpoint(0);
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 检查点比例表 + 位置映射
///
/// 构造时完成全部校验，之后的查询不会失败。
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointMap {
    fractions: Vec<f64>,
    /// 以 `Location::index()` 为下标
    location_checkpoints: [Checkpoint; 3],
}

impl CheckpointMap {
    /// 创建映射
    ///
    /// # 错误
    ///
    /// - 比例表为空：`NoCheckpoints`
    /// - 比例不在 [0.0, 1.0] 或非有限：`FractionOutOfRange`
    /// - 位置指向不存在的检查点：`CheckpointOutOfRange`
    /// - 两个位置共用检查点：`DuplicateCheckpoint`
    /// - 两个位置的检查点比例相同：`DuplicateFraction`
    pub fn new(
        fractions: Vec<f64>,
        location_checkpoints: [Checkpoint; 3],
    ) -> Result<Self, ProtocolError> {
        if fractions.is_empty() {
            return Err(ProtocolError::NoCheckpoints);
        }
        if let Some(&value) = fractions
            .iter()
            .find(|f| !f.is_finite() || !(0.0..=1.0).contains(*f))
        {
            return Err(ProtocolError::FractionOutOfRange { value });
        }

        for (i, checkpoint) in location_checkpoints.iter().enumerate() {
            if checkpoint.0 >= fractions.len() {
                return Err(ProtocolError::CheckpointOutOfRange {
                    index: checkpoint.0,
                    count: fractions.len(),
                });
            }
            for (j, other) in location_checkpoints.iter().enumerate().skip(i + 1) {
                if checkpoint == other {
                    return Err(ProtocolError::DuplicateCheckpoint {
                        first: Location::ALL[i],
                        second: Location::ALL[j],
                        index: checkpoint.0,
                    });
                }
            }
        }

        for (i, checkpoint) in location_checkpoints.iter().enumerate() {
            let value = fractions[checkpoint.0];
            for (j, other) in location_checkpoints.iter().enumerate().skip(i + 1) {
                if fractions[other.0] == value {
                    return Err(ProtocolError::DuplicateFraction {
                        first: Location::ALL[i],
                        second: Location::ALL[j],
                        value,
                    });
                }
            }
        }

        Ok(Self {
            fractions,
            location_checkpoints,
        })
    }

    /// 位置对应的检查点
    pub fn checkpoint_of(&self, location: Location) -> Checkpoint {
        self.location_checkpoints[location.index()]
    }

    /// 检查点对应的比例
    ///
    /// 越界下标返回 `None`。
    pub fn fraction(&self, checkpoint: Checkpoint) -> Option<f64> {
        self.fractions.get(checkpoint.0).copied()
    }

    /// 位置对应的比例
    pub fn fraction_of(&self, location: Location) -> f64 {
        // 构造时已校验下标有效
        self.fractions[self.checkpoint_of(location).0]
    }

    /// 检查点数量
    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    /// 所有检查点（下标升序）
    pub fn checkpoints(&self) -> impl Iterator<Item = (Checkpoint, f64)> + '_ {
        self.fractions
            .iter()
            .enumerate()
            .map(|(i, f)| (Checkpoint(i), *f))
    }

    /// 检查点上的位置（若有）
    pub fn location_at(&self, checkpoint: Checkpoint) -> Option<Location> {
        Location::ALL
            .into_iter()
            .find(|loc| self.checkpoint_of(*loc) == checkpoint)
    }
}

impl Default for CheckpointMap {
    /// 两端 + 中点：DESK=0.0, BED=0.5, CLOSET=1.0
    fn default() -> Self {
        Self {
            fractions: vec![0.0, 0.5, 1.0],
            location_checkpoints: [Checkpoint(0), Checkpoint(1), Checkpoint(2)],
        }
    }
}
