//! 边界框来源
//!
//! 跟踪器本身（特征匹配、相关滤波等）是外部黑盒，这里只定义它向本系统
//! 交付边界框的方式：
//! - `BoundingBoxFeed` trait：逐帧拉取
//! - `LineFeed`：外部跟踪进程的文本帧协议（每行一帧）
//!
//! # 文本帧协议
//!
//! ```text
//! 487 52 50 50      # x y w h（空白或逗号分隔，整数或小数）
//! 480,53,50,50
//! lost              # 跟踪丢失（也接受 none 或空行）
//! # 只有注释的行会被跳过
//! ```
//!
//! EOF 表示跟踪器退出。

use crate::VisionError;
use crate::geometry::BoundingBox;
use std::io::BufRead;

/// 单帧结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// 跟踪成功
    Tracked(BoundingBox),
    /// 本帧跟踪丢失
    Lost,
    /// 跟踪器已退出
    End,
}

/// 逐帧边界框来源（在后台跟踪线程中调用，可以阻塞）
pub trait BoundingBoxFeed: Send {
    fn next_frame(&mut self) -> Result<Frame, VisionError>;
}

impl<F> BoundingBoxFeed for F
where
    F: FnMut() -> Result<Frame, VisionError> + Send,
{
    fn next_frame(&mut self) -> Result<Frame, VisionError> {
        self()
    }
}

/// 文本帧协议读取器
pub struct LineFeed<R> {
    reader: R,
    line: String,
}

impl<R: BufRead + Send> LineFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }

    /// 解析一行
    ///
    /// `#` 之后是注释。只有注释的行返回 `None`，不算一帧。
    pub fn parse_line(line: &str) -> Result<Option<Frame>, VisionError> {
        let (content, comment) = match line.split_once('#') {
            Some((content, _)) => (content.trim(), true),
            None => (line.trim(), false),
        };
        if content.is_empty() {
            return Ok(if comment { None } else { Some(Frame::Lost) });
        }
        if content.eq_ignore_ascii_case("none") || content.eq_ignore_ascii_case("lost") {
            return Ok(Some(Frame::Lost));
        }

        let malformed = || VisionError::MalformedFrame {
            line: line.trim().to_string(),
        };
        let values = content
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [x, y, w, h] if values.iter().all(|v| v.is_finite()) => {
                Ok(Some(Frame::Tracked(BoundingBox::new(*x, *y, *w, *h))))
            },
            _ => Err(malformed()),
        }
    }
}

impl<R: BufRead + Send> BoundingBoxFeed for LineFeed<R> {
    fn next_frame(&mut self) -> Result<Frame, VisionError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(Frame::End);
            }
            if let Some(frame) = Self::parse_line(&self.line)? {
                return Ok(frame);
            }
        }
    }
}
