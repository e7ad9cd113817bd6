//! 吊篮状态与机器人状态快照

use crate::Location;
use std::fmt;
use std::str::FromStr;

/// 吊篮升降状态
///
/// 只有 `Raised` 时才允许沿轨道平移。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum BasketPosition {
    #[default]
    Lowered,
    Raised,
}

impl BasketPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            BasketPosition::Lowered => "LOWERED",
            BasketPosition::Raised => "RAISED",
        }
    }

    pub fn is_raised(self) -> bool {
        self == BasketPosition::Raised
    }
}

impl fmt::Display for BasketPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 机器人状态快照
///
/// `location` 与 `basket_position` 是唯一的持久状态，只在一次操作
/// 成功结束时更新；`items_in_basket` 仅供参考，由外部（人工录入或感知）提供。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RobotState {
    pub location: Location,
    pub basket_position: BasketPosition,
    pub items_in_basket: Option<Vec<String>>,
}

impl RobotState {
    pub fn new(location: Location, basket_position: BasketPosition) -> Self {
        Self {
            location,
            basket_position,
            items_in_basket: None,
        }
    }
}

/// 面向规划器的文本形式
///
/// 字段顺序和措辞只影响规划器的理解，不属于控制契约。
impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The current location of the basket is: {}", self.location)?;
        writeln!(f, "The basket is currently {}", self.basket_position)?;
        write!(f, "The items currently in the basket are: ")?;
        match &self.items_in_basket {
            None => write!(f, "None"),
            Some(items) => {
                for item in items {
                    write!(f, "\n - {}", item)?;
                }
                Ok(())
            },
        }
    }
}

/// 人工录入的物品清单更新
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemListUpdate {
    /// 空输入：保持不变
    Unchanged,
    /// `none`：清空为“未知”
    Clear,
    /// 逗号分隔的物品名
    Replace(Vec<String>),
}

impl ItemListUpdate {
    /// 应用到状态
    pub fn apply(self, state: &mut RobotState) {
        match self {
            ItemListUpdate::Unchanged => {},
            ItemListUpdate::Clear => state.items_in_basket = None,
            ItemListUpdate::Replace(items) => state.items_in_basket = Some(items),
        }
    }
}

impl FromStr for ItemListUpdate {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(ItemListUpdate::Unchanged);
        }
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(ItemListUpdate::Clear);
        }
        Ok(ItemListUpdate::Replace(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect(),
        ))
    }
}
