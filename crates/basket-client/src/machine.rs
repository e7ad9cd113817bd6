//! 吊篮状态机
//!
//! 状态 = {LOWERED, RAISED} × Location。命令先展开为操作计划，
//! 每个操作成功完成后再由 `apply` 提交终态：
//!
//! | 命令 | 当前状态 | 计划 |
//! |------|----------|------|
//! | LOWER | 任意 | `[Lower]` |
//! | RAISE | 任意 | `[Raise]` |
//! | MOVE_TO(loc) | RAISED | `[MoveTo(loc)]` |
//! | MOVE_TO(loc) | LOWERED | `[Raise, MoveTo(loc)]` |
//!
//! `location` 只由完成的 MoveTo 改变，`basket_position` 只由完成的
//! Raise/Lower 改变；在 LOWERED 状态提交 MoveTo 会被拒绝。

use crate::error::BasketError;
use basket_protocol::{BasketPosition, Command, ItemListUpdate, Location, RobotState};
use std::fmt;
use tracing::info;

/// 控制器可以直接执行的原子操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Raise,
    Lower,
    MoveTo(Location),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Raise => write!(f, "Raise"),
            Operation::Lower => write!(f, "Lower"),
            Operation::MoveTo(location) => write!(f, "MoveTo({})", location),
        }
    }
}

/// 吊篮状态机（唯一持有 `RobotState`）
#[derive(Debug, Clone, Default)]
pub struct BasketStateMachine {
    state: RobotState,
}

impl BasketStateMachine {
    /// 初始状态：DESK、LOWERED、物品未知
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: RobotState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &RobotState {
        &self.state
    }

    /// 状态快照
    pub fn snapshot(&self) -> RobotState {
        self.state.clone()
    }

    /// 把命令展开为操作计划
    pub fn plan(&self, command: Command) -> Vec<Operation> {
        match command {
            Command::Lower => vec![Operation::Lower],
            Command::Raise => vec![Operation::Raise],
            Command::MoveTo(target) => match self.state.basket_position {
                BasketPosition::Raised => vec![Operation::MoveTo(target)],
                BasketPosition::Lowered => vec![Operation::Raise, Operation::MoveTo(target)],
            },
        }
    }

    /// 提交一个已完成操作的终态
    pub fn apply(&mut self, operation: Operation) -> Result<(), BasketError> {
        match operation {
            Operation::Raise => self.state.basket_position = BasketPosition::Raised,
            Operation::Lower => self.state.basket_position = BasketPosition::Lowered,
            Operation::MoveTo(target) => {
                if !self.state.basket_position.is_raised() {
                    return Err(BasketError::PreconditionViolated(format!(
                        "cannot move to {} while the basket is {}",
                        target, self.state.basket_position
                    )));
                }
                self.state.location = target;
            },
        }
        info!(
            "State: location={} basket={}",
            self.state.location, self.state.basket_position
        );
        Ok(())
    }

    /// 替换物品清单（`None` 表示未知）
    pub fn update_items(&mut self, items: Option<Vec<String>>) {
        self.state.items_in_basket = items;
    }

    /// 应用人工录入的物品清单更新
    pub fn apply_item_update(&mut self, update: ItemListUpdate) {
        update.apply(&mut self.state);
    }
}
