//! 变体规则查询接口
//!
//! 包含:
//! - 查询引擎 (变体目录 + 选项，按调用重放走法)
//! - 查询层错误类型
//! - 命令行工具使用的 JSON 请求/响应

mod engine;
mod error;
mod message;

pub use engine::{Engine, EngineOptions, STARTPOS};
pub use error::{EngineError, Result};
pub use message::{Game, Request, Response};

pub use rules::{FenOptions, FenValidation, Notation, VALUE_DRAW, VALUE_MATE};
