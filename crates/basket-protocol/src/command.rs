//! 规划器命令
//!
//! 外部规划器产出的是“请求形式”（`CommandRequest`：动作 + 可选位置），
//! 经校验后转换为封闭的强类型 `Command`，之后的控制路径只处理 `Command`，
//! 不存在无法识别的动作。

use crate::{Location, ProtocolError};
use std::fmt;
use std::str::FromStr;

/// 规划器动作（与规划器输出的字符串一一对应）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum BasketAction {
    /// 把吊篮移动到指定位置
    MoveBasketToLocation,
    /// 升起吊篮（离开用户可及范围，之后才能移动）
    RaiseBasket,
    /// 放下吊篮（用户可以取放物品）
    LowerBasket,
}

impl BasketAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BasketAction::MoveBasketToLocation => "MOVE_BASKET_TO_LOCATION",
            BasketAction::RaiseBasket => "RAISE_BASKET",
            BasketAction::LowerBasket => "LOWER_BASKET",
        }
    }
}

impl fmt::Display for BasketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BasketAction {
    type Err = ProtocolError;

    /// 接受规划器的完整名称，以及 `move` / `raise` / `lower` 简写（大小写不敏感）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        match upper.as_str() {
            "MOVE_BASKET_TO_LOCATION" | "MOVE" | "MOVE_TO" => Ok(BasketAction::MoveBasketToLocation),
            "RAISE_BASKET" | "RAISE" => Ok(BasketAction::RaiseBasket),
            "LOWER_BASKET" | "LOWER" => Ok(BasketAction::LowerBasket),
            _ => Err(ProtocolError::UnknownAction(trimmed.to_string())),
        }
    }
}

/// 规划器请求（未校验）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandRequest {
    pub action: BasketAction,
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: Option<Location>,
}

impl CommandRequest {
    pub fn new(action: BasketAction, location: Option<Location>) -> Self {
        Self { action, location }
    }
}

impl FromStr for CommandRequest {
    type Err = ProtocolError;

    /// 文本形式：`<action> [location]`，如 `move closet`、`RAISE_BASKET`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let action = parts
            .next()
            .ok_or_else(|| ProtocolError::UnknownAction(String::new()))?
            .parse::<BasketAction>()?;
        let location = parts.next().map(str::parse::<Location>).transpose()?;
        if let Some(extra) = parts.next() {
            return Err(ProtocolError::UnknownLocation(extra.to_string()));
        }
        Ok(Self { action, location })
    }
}

/// 强类型命令（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Raise,
    Lower,
    MoveTo(Location),
}

impl Command {
    /// 对应的规划器动作
    pub fn action(self) -> BasketAction {
        match self {
            Command::Raise => BasketAction::RaiseBasket,
            Command::Lower => BasketAction::LowerBasket,
            Command::MoveTo(_) => BasketAction::MoveBasketToLocation,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Raise => f.write_str("RAISE"),
            Command::Lower => f.write_str("LOWER"),
            Command::MoveTo(location) => write!(f, "MOVE_TO({})", location),
        }
    }
}

impl TryFrom<CommandRequest> for Command {
    type Error = ProtocolError;

    /// 移动请求必须携带位置；升降请求忽略位置字段
    fn try_from(request: CommandRequest) -> Result<Self, Self::Error> {
        match request.action {
            BasketAction::RaiseBasket => Ok(Command::Raise),
            BasketAction::LowerBasket => Ok(Command::Lower),
            BasketAction::MoveBasketToLocation => request
                .location
                .map(Command::MoveTo)
                .ok_or(ProtocolError::MissingLocation(request.action)),
        }
    }
}

impl From<Command> for CommandRequest {
    fn from(command: Command) -> Self {
        let location = match command {
            Command::MoveTo(location) => Some(location),
            Command::Raise | Command::Lower => None,
        };
        CommandRequest::new(command.action(), location)
    }
}
