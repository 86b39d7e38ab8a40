//! 交互模式命令解析

use std::str::FromStr;

use thiserror::Error;

/// 交互命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Next,
    Previous,
    GoTo(usize),
    Status,
    Help,
    Quit,
}

/// 命令解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("空命令")]
    Empty,

    #[error("未知命令: {0}")]
    Unknown(String),

    #[error("无效的页码: {0}")]
    InvalidPage(String),
}

impl FromStr for PlayerCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(CommandError::Empty);
        };

        match head.to_ascii_lowercase().as_str() {
            "n" | "next" => Ok(Self::Next),
            "p" | "prev" | "previous" => Ok(Self::Previous),
            "s" | "status" => Ok(Self::Status),
            "h" | "help" | "?" => Ok(Self::Help),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            "g" | "goto" => {
                let arg = parts.next().unwrap_or_default();
                arg.parse()
                    .map(Self::GoTo)
                    .map_err(|_| CommandError::InvalidPage(arg.to_string()))
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

pub const HELP: &str = "n 下一页 | p 上一页 | g <页码> 跳转 | s 状态 | q 退出";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("n".parse::<PlayerCommand>(), Ok(PlayerCommand::Next));
        assert_eq!("  Prev ".parse::<PlayerCommand>(), Ok(PlayerCommand::Previous));
        assert_eq!("g 3".parse::<PlayerCommand>(), Ok(PlayerCommand::GoTo(3)));
        assert_eq!("quit".parse::<PlayerCommand>(), Ok(PlayerCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<PlayerCommand>(), Err(CommandError::Empty));
        assert_eq!(
            "jump".parse::<PlayerCommand>(),
            Err(CommandError::Unknown("jump".to_string()))
        );
        assert_eq!(
            "g x".parse::<PlayerCommand>(),
            Err(CommandError::InvalidPage("x".to_string()))
        );
        assert_eq!(
            "g".parse::<PlayerCommand>(),
            Err(CommandError::InvalidPage(String::new()))
        );
    }
}
