//! 错误类型定义

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 变体配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 无法解析的段落头
    #[error("Malformed section header at line {line}: {text}")]
    Section { line: usize, text: String },

    /// 未知的基础变体
    #[error("Unknown base variant '{base}' for section [{name}]")]
    UnknownBase { name: String, base: String },

    /// 段落之外的键值对
    #[error("Key outside of any section at line {line}: {text}")]
    Orphan { line: usize, text: String },

    /// 无效的 Betza 走法描述
    #[error("Invalid Betza string '{betza}': {reason}")]
    Betza { betza: String, reason: String },

    /// 键值类型不匹配
    #[error("Invalid value for {key} in [{variant}]: {value}")]
    Value {
        variant: String,
        key: String,
        value: String,
    },

    /// 未知棋子字母
    #[error("Unknown piece letter '{letter}' in [{variant}]")]
    PieceLetter { variant: String, letter: char },
}

/// FEN 校验结果代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum FenValidation {
    /// 合法
    Ok = 1,
    /// 空串
    Empty = 0,
    /// 回合数无效
    InvalidFullmove = -1,
    /// 半回合计数无效
    InvalidHalfmove = -2,
    /// 王的数量不对
    InvalidKings = -3,
    /// 吃过路兵格无效
    InvalidEnPassant = -4,
    /// 易位或入场标记无效
    InvalidCastling = -5,
    /// 走子方无效
    InvalidSideToMove = -6,
    /// 手持棋子无效
    InvalidPocket = -7,
    /// 行列数不对
    InvalidBoardGeometry = -8,
    /// 两王相邻
    TouchingKings = -9,
    /// 非法字符
    InvalidChar = -10,
    /// 字段数不对
    InvalidParts = -11,
    /// 非法升变标记
    InvalidPromotedPiece = -12,
    /// 将军计数无效
    InvalidCheckCount = -13,
    /// 数子规则值无效
    InvalidCounting = -14,
}

impl FenValidation {
    /// 状态码
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_ok(self) -> bool {
        self == FenValidation::Ok
    }
}

impl fmt::Display for FenValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

/// FEN 解析错误
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid FEN ({code}): {reason}")]
pub struct FenError {
    pub code: FenValidation,
    pub reason: String,
}

impl FenError {
    pub fn new(code: FenValidation, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// 规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// 未知变体
    #[error("Unknown variant: {0}")]
    UnknownVariant(String),

    /// 非法走法
    #[error("Illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },

    /// FEN 错误
    #[error(transparent)]
    Fen(#[from] FenError),

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 规则操作结果类型
pub type Result<T> = std::result::Result<T, RuleError>;
