//! 端到端场景：分发器 + 控制器 + 仿真装置

mod common;

use basket_client::sim::SimSettings;
use basket_client::{BasketError, ControlSettings, Operation, parse_request};
use basket_protocol::{BasketAction, BasketPosition, Command, CommandRequest, Location, MotorDirection, RobotState};
use common::*;
use proptest::prelude::*;

/// RAISE：DESK / LOWERED → DESK / RAISED
#[test]
fn raise_from_desk() {
    let mut h = at(Location::Desk, BasketPosition::Lowered);
    let state = h.dispatcher.dispatch_command(Command::Raise).unwrap();

    assert_eq!(state, RobotState::new(Location::Desk, BasketPosition::Raised));
    assert!(h.rig.droop() < 75.0);

    let raise_pins = h.rig.settings().raise_lower_pins;
    let changes = h.rig.axis_timeline(raise_pins);
    assert_eq!(changes.first().map(|c| c.1), Some(MotorDirection::Forward));
    assert_eq!(changes.last().map(|c| c.1), Some(MotorDirection::Still));

    // 120 px → 60 px，每周期 20 px
    let report = &h.dispatcher.history()[0];
    assert_eq!(report.operation, Operation::Raise);
    assert_eq!(report.ticks, 4);
    assert_eq!(report.elapsed, PERIOD * 3);
}

/// MOVE_TO(CLOSET)：DESK / RAISED → CLOSET / RAISED，到达比例 1.0 附近
#[test]
fn move_to_closet_when_raised() {
    let mut h = at(Location::Desk, BasketPosition::Raised);
    let request = CommandRequest::new(BasketAction::MoveBasketToLocation, Some(Location::Closet));
    let state = h.dispatcher.dispatch(request).unwrap();

    assert_eq!(state.location, Location::Closet);
    assert_eq!(state.basket_position, BasketPosition::Raised);
    assert!(h.rig.fraction() >= 0.95);
    // 标定正确时组合移动不改变下垂
    assert!((h.rig.droop() - RAISED_DROOP).abs() < 1e-6);

    assert_eq!(h.dispatcher.history().len(), 1);
    let translation = h.rig.axis_timeline(h.rig.settings().translation_pins);
    assert_eq!(translation.first().map(|c| c.1), Some(MotorDirection::Forward));
    assert_eq!(translation.last().map(|c| c.1), Some(MotorDirection::Still));
}

/// MOVE_TO(BED)：LOWERED 时先升起再移动
#[test]
fn move_to_bed_when_lowered_raises_first() {
    let mut h = at(Location::Desk, BasketPosition::Lowered);
    let state = h.dispatcher.dispatch(parse_request("move bed").unwrap()).unwrap();

    assert_eq!(state, RobotState::new(Location::Bed, BasketPosition::Raised));
    assert!((h.rig.fraction() - 0.5).abs() <= 0.05);

    let ops: Vec<_> = h.dispatcher.history().iter().map(|r| r.operation).collect();
    assert_eq!(ops, vec![Operation::Raise, Operation::MoveTo(Location::Bed)]);

    // 平移在升起完成之后才开始
    let raise_elapsed = h.dispatcher.history()[0].elapsed;
    let translation = h.rig.axis_timeline(h.rig.settings().translation_pins);
    let first_move = translation
        .iter()
        .find(|c| c.1 != MotorDirection::Still)
        .map(|c| c.0)
        .unwrap();
    assert!(first_move >= raise_elapsed);
}

/// MOVE_TO 缺少位置：InvalidCommand，状态不变，没有任何引脚写入
#[test]
fn move_without_location_is_rejected() {
    let mut h = at(Location::Desk, BasketPosition::Lowered);
    let request = CommandRequest::new(BasketAction::MoveBasketToLocation, None);

    let err = h.dispatcher.dispatch(request).unwrap_err();
    assert!(matches!(err, BasketError::InvalidCommand { .. }));
    assert_eq!(
        h.dispatcher.state(),
        &RobotState::new(Location::Desk, BasketPosition::Lowered)
    );
    assert!(h.rig.timeline().is_empty());
    assert!(h.dispatcher.history().is_empty());
}

/// 位置只在 RAISED 时改变
#[test]
fn location_changes_only_when_raised() {
    let mut h = at(Location::Desk, BasketPosition::Lowered);
    let commands = [
        Command::MoveTo(Location::Closet),
        Command::Lower,
        Command::MoveTo(Location::Bed),
        Command::Raise,
        Command::MoveTo(Location::Desk),
        Command::Lower,
    ];

    let mut previous = h.dispatcher.state().clone();
    for command in commands {
        let state = h.dispatcher.dispatch_command(command).unwrap();
        if state.location != previous.location {
            assert_eq!(state.basket_position, BasketPosition::Raised, "{}", command);
        }
        previous = state;
    }
    assert_eq!(previous, RobotState::new(Location::Desk, BasketPosition::Lowered));
}

/// 已经 RAISED 时 RAISE 在第一个周期完成，不驱动升降轴
#[test]
fn raise_when_raised_is_immediate() {
    let mut h = at(Location::Bed, BasketPosition::Raised);
    h.dispatcher.dispatch_command(Command::Raise).unwrap();

    let report = &h.dispatcher.history()[0];
    assert_eq!(report.ticks, 1);
    assert_eq!(h.rig.now(), std::time::Duration::ZERO);

    let changes = h.rig.axis_timeline(h.rig.settings().raise_lower_pins);
    assert!(!changes.iter().any(|c| c.1 == MotorDirection::Forward));
}

/// LOWER 即使已经放下也重新执行一次
#[test]
fn lower_when_lowered_still_runs() {
    let mut h = at(Location::Closet, BasketPosition::Lowered);
    let state = h.dispatcher.dispatch_command(Command::Lower).unwrap();
    assert_eq!(state.basket_position, BasketPosition::Lowered);
    assert_eq!(h.dispatcher.history()[0].operation, Operation::Lower);
}

/// LOWER 相对 home 检查点轮询，在任意位置都只看下垂
#[test]
fn lower_at_closet() {
    let mut h = at(Location::Closet, BasketPosition::Raised);
    let state = h.dispatcher.dispatch_command(Command::Lower).unwrap();
    assert_eq!(state, RobotState::new(Location::Closet, BasketPosition::Lowered));
    assert!(h.rig.droop() >= 75.0);

    let changes = h.rig.axis_timeline(h.rig.settings().raise_lower_pins);
    assert_eq!(changes.first().map(|c| c.1), Some(MotorDirection::Reverse));
}

/// 向左移动（RIGHT-OF）两轴 REVERSE
#[test]
fn move_back_to_desk() {
    let mut h = at(Location::Closet, BasketPosition::Raised);
    let state = h.dispatcher.dispatch_command(Command::MoveTo(Location::Desk)).unwrap();
    assert_eq!(state.location, Location::Desk);
    assert!(h.rig.fraction() <= 0.05);

    let translation = h.rig.axis_timeline(h.rig.settings().translation_pins);
    let raise = h.rig.axis_timeline(h.rig.settings().raise_lower_pins);
    assert_eq!(translation.first().map(|c| c.1), Some(MotorDirection::Reverse));
    assert_eq!(raise.first().map(|c| c.1), Some(MotorDirection::Reverse));
}

/// 跟踪抖动在容差内时仍然能停在检查点
#[test]
fn move_with_tracker_jitter() {
    let sim = SimSettings {
        start_droop: RAISED_DROOP,
        jitter_px: 3.0,
        ..Default::default()
    };
    let mut h = harness(
        sim,
        ControlSettings::default(),
        RobotState::new(Location::Desk, BasketPosition::Raised),
    );
    let state = h.dispatcher.dispatch_command(Command::MoveTo(Location::Bed)).unwrap();
    assert_eq!(state.location, Location::Bed);
    assert!((h.rig.fraction() - 0.5).abs() <= 0.06);
}

/// 物品清单只是附加信息，不影响运动
#[test]
fn items_are_reported() {
    let mut h = at(Location::Desk, BasketPosition::Lowered);
    h.dispatcher.update_items(Some(vec!["book".to_string(), "mug".to_string()]));
    let state = h.dispatcher.dispatch_command(Command::MoveTo(Location::Bed)).unwrap();

    let text = state.to_string();
    assert!(text.contains("The current location of the basket is: BED"));
    assert!(text.contains("The basket is currently RAISED"));
    assert!(text.ends_with(" - book\n - mug"));
}

fn any_location() -> impl Strategy<Value = Location> {
    prop::sample::select(Location::ALL.to_vec())
}

fn any_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Raise),
        Just(Command::Lower),
        any_location().prop_map(Command::MoveTo),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// 任意命令序列：位置只在升起时改变，每次平移都发生在升起之后，
    /// 报告的状态与仿真装置的物理状态一致
    #[test]
    fn prop_location_changes_only_when_raised(
        start in any_location(),
        lowered in any::<bool>(),
        commands in prop::collection::vec(any_command(), 1..8),
    ) {
        let position = if lowered { BasketPosition::Lowered } else { BasketPosition::Raised };
        let mut h = at(start, position);
        let mut previous = h.dispatcher.state().clone();

        for command in commands {
            let done = h.dispatcher.history().len();
            let state = h.dispatcher.dispatch_command(command).unwrap();

            let mut tracked = previous.basket_position;
            for report in &h.dispatcher.history()[done..] {
                match report.operation {
                    Operation::Raise => tracked = BasketPosition::Raised,
                    Operation::Lower => tracked = BasketPosition::Lowered,
                    Operation::MoveTo(_) => {
                        prop_assert_eq!(tracked, BasketPosition::Raised);
                    },
                }
            }
            prop_assert_eq!(tracked, state.basket_position);

            if state.location != previous.location {
                prop_assert_eq!(state.basket_position, BasketPosition::Raised);
            }
            let target = basket_protocol::CheckpointMap::default().fraction_of(state.location);
            prop_assert!((h.rig.fraction() - target).abs() <= 0.05 + 1e-9);
            prop_assert_eq!(h.rig.droop() >= 75.0, state.basket_position == BasketPosition::Lowered);

            previous = state;
        }
    }
}
