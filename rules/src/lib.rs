//! 可配置的棋类变体规则库
//!
//! 包含:
//! - 棋子、棋盘、局面等核心数据结构
//! - Betza 走法描述与变体描述（内置变体 + INI 配置）
//! - 走法生成和合法性判定
//! - FEN 读写与校验
//! - 记谱 (UCI, SAN, LAN, 将棋, 韩国象棋, WXF, 泰国象棋)
//! - 终局裁决（含长将、长捉）

mod adjudicate;
mod attacks;
mod betza;
mod bitboard;
mod board;
mod builtin;
mod catalog;
mod chase;
mod config;
mod constants;
mod error;
mod fen;
mod movegen;
mod moves;
mod notation;
mod piece;
mod position;
mod variant;
mod zobrist;

pub use adjudicate::Adjudicator;
pub use attacks::{attackers_to, checkers, in_check, reach, Reach};
pub use betza::{AtomKind, MoveAtom, MovementSpec};
pub use bitboard::Bitboard;
pub use board::{Board, BoardState, Captured};
pub use catalog::VariantCatalog;
pub use config::parse_config;
pub use constants::*;
pub use error::{ConfigError, FenError, FenValidation, Result, RuleError};
pub use fen::{castling_king, validate_fen, FenOptions};
pub use movegen::MoveGenerator;
pub use moves::{Move, MoveKind};
pub use notation::{move_to_san, move_to_uci, parse_uci, Notation};
pub use piece::{Piece, PieceType, Side, Square};
pub use position::Position;
pub use variant::{
    ChasingRule, CountingRule, EnclosingRule, GameValue, MaterialCounting, PieceDef, Variant,
    VariantTemplate, WallingRule,
};
