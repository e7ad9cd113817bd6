//! 命令分发
//!
//! 规划器请求 → 校验 → 操作计划 → 逐个执行并提交。
//! 计划中途失败时，状态只反映已经完成的操作。

use crate::cancel::CancelToken;
use crate::controller::{MotionController, OperationReport};
use crate::error::BasketError;
use crate::machine::BasketStateMachine;
use crate::timing::Sleeper;
use basket_driver::DigitalOutput;
use basket_protocol::{Command, CommandRequest, ItemListUpdate, RobotState};
use tracing::info;

/// 解析一条规划器请求
///
/// 以 `{` 开头按 JSON 解析（`{"action": "MOVE_BASKET_TO_LOCATION", "location": "CLOSET"}`），
/// 否则按文本解析（`move closet`、`RAISE_BASKET`）。
pub fn parse_request(line: &str) -> Result<CommandRequest, BasketError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(BasketError::invalid("empty request"));
    }
    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).map_err(BasketError::invalid)
    } else {
        trimmed.parse().map_err(BasketError::invalid)
    }
}

/// 命令分发器：持有控制器与状态机
pub struct CommandDispatcher<O, S> {
    controller: MotionController<O, S>,
    machine: BasketStateMachine,
    cancel: CancelToken,
    history: Vec<OperationReport>,
}

impl<O: DigitalOutput, S: Sleeper> CommandDispatcher<O, S> {
    pub fn new(controller: MotionController<O, S>, machine: BasketStateMachine) -> Self {
        Self::with_cancel_token(controller, machine, CancelToken::new())
    }

    /// 使用外部创建的取消令牌（信号处理需要在分发器之前注册时）
    pub fn with_cancel_token(
        controller: MotionController<O, S>,
        machine: BasketStateMachine,
        cancel: CancelToken,
    ) -> Self {
        Self {
            controller,
            machine,
            cancel,
            history: Vec::new(),
        }
    }

    /// 取消令牌（Clone 给信号处理线程）
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &RobotState {
        self.machine.state()
    }

    pub fn controller(&self) -> &MotionController<O, S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut MotionController<O, S> {
        &mut self.controller
    }

    /// 已完成操作的报告（按时间顺序）
    pub fn history(&self) -> &[OperationReport] {
        &self.history
    }

    pub fn update_items(&mut self, items: Option<Vec<String>>) {
        self.machine.update_items(items);
    }

    pub fn apply_item_update(&mut self, update: ItemListUpdate) {
        self.machine.apply_item_update(update);
    }

    /// 分发规划器请求
    ///
    /// 移动请求缺少位置时返回 `InvalidCommand`，不执行任何动作。
    pub fn dispatch(&mut self, request: CommandRequest) -> Result<RobotState, BasketError> {
        let command = Command::try_from(request).map_err(BasketError::invalid)?;
        self.dispatch_command(command)
    }

    /// 分发强类型命令
    pub fn dispatch_command(&mut self, command: Command) -> Result<RobotState, BasketError> {
        self.cancel.reset();
        let plan = self.machine.plan(command);
        info!("Dispatching {} as {} operation(s)", command, plan.len());

        for operation in plan {
            let current = self.machine.state().location;
            let report = self.controller.execute(operation, current, &self.cancel)?;
            self.machine.apply(operation)?;
            self.history.push(report);
        }
        Ok(self.machine.snapshot())
    }
}
