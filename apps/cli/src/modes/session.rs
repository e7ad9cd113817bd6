//! 命令会话
//!
//! 专用输入线程读取 stdin，经 crossbeam 通道交给主线程；主线程独占分发器，
//! 一次执行一条命令。既可以交互输入，也可以通过管道接入规划器：
//!
//! ```text
//! basket> move closet
//! basket> {"action": "LOWER_BASKET", "location": null}
//! basket> items keys, wallet
//! basket> state
//! basket> quit
//! ```

use crate::backend::BoxedDispatcher;
use anyhow::Result;
use basket_client::{BasketError, parse_request};
use basket_protocol::ItemListUpdate;
use crossbeam_channel::{Receiver, bounded};
use std::io::{BufRead, Write};
use std::thread;
use tracing::{debug, warn};

/// 会话内的一行输入
#[derive(Debug, Clone, PartialEq)]
pub enum SessionLine {
    Quit,
    Help,
    State,
    Stop,
    Items(ItemListUpdate),
    /// 规划器请求（文本或 JSON）
    Request(String),
}

impl SessionLine {
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest),
            None => (trimmed, ""),
        };
        let line = match head.to_ascii_lowercase().as_str() {
            "quit" | "exit" => SessionLine::Quit,
            "help" | "?" => SessionLine::Help,
            "state" | "status" => SessionLine::State,
            "stop" => SessionLine::Stop,
            "items" => match rest.parse::<ItemListUpdate>() {
                Ok(update) => SessionLine::Items(update),
                Err(never) => match never {},
            },
            _ => SessionLine::Request(trimmed.to_string()),
        };
        Some(line)
    }
}

/// stdin 输入线程
pub struct SessionInput {
    line_rx: Receiver<String>,
    _input_thread: thread::JoinHandle<()>,
}

impl SessionInput {
    pub fn spawn(prompt: bool) -> Result<Self> {
        let (line_tx, line_rx) = bounded::<String>(10);
        let input_thread = thread::Builder::new()
            .name("basket-input".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                let mut lines = stdin.lock().lines();
                loop {
                    if prompt {
                        print!("basket> ");
                        let _ = std::io::stdout().flush();
                    }
                    match lines.next() {
                        Some(Ok(line)) => {
                            if line_tx.send(line).is_err() {
                                break; // 主线程已退出
                            }
                        },
                        Some(Err(e)) => {
                            eprintln!("Error reading stdin: {}", e);
                            break;
                        },
                        None => break, // EOF
                    }
                }
            })?;

        Ok(Self {
            line_rx,
            _input_thread: input_thread,
        })
    }

    /// 阻塞等待下一行；输入结束返回 `None`
    pub fn recv(&self) -> Option<String> {
        self.line_rx.recv().ok()
    }
}

fn print_help() {
    println!("命令:");
    println!("  raise | lower | move <desk|bed|closet>");
    println!("  RAISE_BASKET | LOWER_BASKET | MOVE_BASKET_TO_LOCATION <location>");
    println!("  {{\"action\": \"MOVE_BASKET_TO_LOCATION\", \"location\": \"CLOSET\"}}");
    println!("  items <a, b, ...> | items none");
    println!("  state | stop | help | quit");
    println!("运动中按 Ctrl+C 取消当前操作");
}

/// 运行会话直到 quit 或输入结束
pub fn run_session(dispatcher: &mut BoxedDispatcher, input: &SessionInput) -> Result<()> {
    println!("{}", dispatcher.state());

    while let Some(raw) = input.recv() {
        let Some(line) = SessionLine::parse(&raw) else {
            continue;
        };
        debug!("session: {:?}", line);

        match line {
            SessionLine::Quit => break,
            SessionLine::Help => print_help(),
            SessionLine::State => println!("{}", dispatcher.state()),
            SessionLine::Stop => {
                dispatcher.controller_mut().stop()?;
                println!("🛑 已停止");
            },
            SessionLine::Items(update) => {
                dispatcher.apply_item_update(update);
                println!("{}", dispatcher.state());
            },
            SessionLine::Request(text) => {
                let result = parse_request(&text).and_then(|request| dispatcher.dispatch(request));
                match result {
                    Ok(state) => println!("{}", state),
                    Err(e @ BasketError::InvalidCommand { .. }) => println!("⚠️  {}", e),
                    Err(e) if e.is_abort() => {
                        warn!("{}", e);
                        println!("🛑 {}", e);
                        println!("{}", dispatcher.state());
                    },
                    Err(e) => return Err(e.into()),
                }
            },
        }
    }

    // 退出前停下两个轴
    dispatcher.controller_mut().stop()?;
    Ok(())
}
