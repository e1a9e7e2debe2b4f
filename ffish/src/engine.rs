//! 查询引擎
//!
//! 每次查询都从 FEN 重建局面并重放走法，查询之间不共享局面。
//! 变体目录放在读写锁后面：载入配置取写锁，查询只在取出变体时短暂持有读锁。

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rules::{
    move_to_san, move_to_uci, parse_uci, validate_fen, Adjudicator, FenOptions, MoveGenerator,
    Notation, Position, RuleError, Side, Variant, VariantCatalog, DEFAULT_VARIANT, ENGINE_AUTHORS,
    ENGINE_NAME, ENGINE_VERSION,
};

use crate::error::{EngineError, Result};

/// 以起始局面代替 FEN 的关键字
pub const STARTPOS: &str = "startpos";

/// 引擎选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// 默认变体（`UCI_Variant`）
    pub variant: String,
    /// 默认使用 960 易位记法（`UCI_Chess960`）
    pub chess960: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            variant: DEFAULT_VARIANT.to_string(),
            chess960: false,
        }
    }
}

/// 查询引擎
pub struct Engine {
    catalog: RwLock<VariantCatalog>,
    options: RwLock<EngineOptions>,
}

impl Engine {
    /// 只含内置变体的引擎
    pub fn new() -> Self {
        Self::with_catalog(VariantCatalog::with_builtins())
    }

    pub fn with_catalog(catalog: VariantCatalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            options: RwLock::new(EngineOptions::default()),
        }
    }

    /// 版本号 (major, minor, patch)
    pub fn version(&self) -> (u32, u32, u32) {
        ENGINE_VERSION
    }

    /// 引擎横幅
    pub fn info(&self) -> String {
        let (major, minor, patch) = ENGINE_VERSION;
        format!("{} {}.{}.{} by {}", ENGINE_NAME, major, minor, patch, ENGINE_AUTHORS)
    }

    /// 当前选项
    pub fn options(&self) -> Result<EngineOptions> {
        Ok(self.options.read().map_err(|_| EngineError::Poisoned)?.clone())
    }

    /// 设置选项：`UCI_Variant` 或 `UCI_Chess960`
    pub fn set_option(&self, name: &str, value: &str) -> Result<()> {
        match name {
            "UCI_Variant" => {
                if !self.catalog.read().map_err(|_| EngineError::Poisoned)?.contains(value) {
                    return Err(RuleError::UnknownVariant(value.to_string()).into());
                }
                self.options.write().map_err(|_| EngineError::Poisoned)?.variant = value.to_string();
            }
            "UCI_Chess960" => {
                let flag = match value {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(EngineError::OptionValue {
                            name: name.to_string(),
                            value: value.to_string(),
                        })
                    }
                };
                self.options.write().map_err(|_| EngineError::Poisoned)?.chess960 = flag;
            }
            _ => return Err(EngineError::UnknownOption(name.to_string())),
        }
        debug!(name, value, "option set");
        Ok(())
    }

    /// 载入变体配置，返回新登记的变体名
    ///
    /// 任一段落出错时目录保持不变。
    pub fn load_variant_config(&self, text: &str) -> Result<Vec<String>> {
        let mut catalog = self.catalog.write().map_err(|_| EngineError::Poisoned)?;
        let names = catalog.load_config(text)?;
        info!(variants = ?names, "variant config loaded");
        Ok(names)
    }

    /// 全部变体名（字典序）
    pub fn variants(&self) -> Result<Vec<String>> {
        Ok(self.catalog.read().map_err(|_| EngineError::Poisoned)?.names())
    }

    /// 取出变体描述
    pub fn variant(&self, name: &str) -> Result<Arc<Variant>> {
        Ok(self.catalog.read().map_err(|_| EngineError::Poisoned)?.get(name)?)
    }

    pub fn start_fen(&self, variant: &str) -> Result<String> {
        Ok(self.variant(variant)?.start_fen.clone())
    }

    pub fn two_boards(&self, variant: &str) -> Result<bool> {
        Ok(self.variant(variant)?.two_boards)
    }

    pub fn captures_to_hand(&self, variant: &str) -> Result<bool> {
        Ok(self.variant(variant)?.captures_to_hand)
    }

    /// 严格校验 FEN，返回状态码（1 为合法）
    pub fn validate_fen(&self, fen: &str, variant: &str, chess960: bool) -> Result<i32> {
        let v = self.variant(variant)?;
        Ok(validate_fen(&v, fen, chess960).code())
    }

    /// 从 FEN 出发重放 UCI 走法
    ///
    /// 遇到不合法的走法立即返回 [`RuleError::IllegalMove`]。
    pub fn replay<S: AsRef<str>>(&self, variant: &str, fen: &str, moves: &[S], chess960: bool) -> Result<Position> {
        let v = self.variant(variant)?;
        let fen = if fen == STARTPOS { v.start_fen.clone() } else { fen.to_string() };
        let mut pos = Position::from_fen(v, &fen, chess960).map_err(RuleError::from)?;
        for text in moves {
            let text = text.as_ref();
            let mv = parse_uci(&pos, text).ok_or_else(|| RuleError::IllegalMove {
                mv: text.to_string(),
                fen: pos.fen(&FenOptions {
                    chess960,
                    ..FenOptions::default()
                }),
            })?;
            debug!(mv = text, "replay");
            pos.do_move(mv);
        }
        Ok(pos)
    }

    /// 合法走法的 UCI 文本
    pub fn legal_moves<S: AsRef<str>>(&self, variant: &str, fen: &str, moves: &[S], chess960: bool) -> Result<Vec<String>> {
        let pos = self.replay(variant, fen, moves, chess960)?;
        Ok(MoveGenerator::generate_legal(&pos)
            .iter()
            .map(|mv| move_to_uci(&pos, mv))
            .collect())
    }

    /// 重放之后的 FEN
    pub fn get_fen<S: AsRef<str>>(&self, variant: &str, fen: &str, moves: &[S], opts: &FenOptions) -> Result<String> {
        let pos = self.replay(variant, fen, moves, opts.chess960)?;
        let opts = FenOptions {
            count_started: opts.count_started.max(0),
            ..*opts
        };
        Ok(pos.fen(&opts))
    }

    /// 单步记谱
    pub fn get_san(&self, variant: &str, fen: &str, mv: &str, chess960: bool, notation: Notation) -> Result<String> {
        let pos = self.replay::<&str>(variant, fen, &[], chess960)?;
        let parsed = parse_uci(&pos, mv).ok_or_else(|| RuleError::IllegalMove {
            mv: mv.to_string(),
            fen: fen.to_string(),
        })?;
        Ok(move_to_san(&pos, &parsed, notation))
    }

    /// 连续记谱：每一步都在执行前的局面上输出
    pub fn get_san_moves<S: AsRef<str>>(
        &self,
        variant: &str,
        fen: &str,
        moves: &[S],
        chess960: bool,
        notation: Notation,
    ) -> Result<Vec<String>> {
        let mut pos = self.replay::<&str>(variant, fen, &[], chess960)?;
        let mut sans = Vec::with_capacity(moves.len());
        for text in moves {
            let text = text.as_ref();
            let mv = parse_uci(&pos, text).ok_or_else(|| RuleError::IllegalMove {
                mv: text.to_string(),
                fen: pos.fen(&FenOptions::default()),
            })?;
            sans.push(move_to_san(&pos, &mv, notation));
            pos.do_move(mv);
        }
        Ok(sans)
    }

    /// 重放之后走子方是否被将军
    pub fn gives_check<S: AsRef<str>>(&self, variant: &str, fen: &str, moves: &[S], chess960: bool) -> Result<bool> {
        Ok(self.replay(variant, fen, moves, chess960)?.gives_check())
    }

    /// 走法在重放之后的局面中是否吃子
    pub fn is_capture<S: AsRef<str>>(
        &self,
        variant: &str,
        fen: &str,
        moves: &[S],
        mv: &str,
        chess960: bool,
    ) -> Result<bool> {
        let pos = self.replay(variant, fen, moves, chess960)?;
        let parsed = parse_uci(&pos, mv).ok_or_else(|| RuleError::IllegalMove {
            mv: mv.to_string(),
            fen: pos.fen(&FenOptions::default()),
        })?;
        Ok(pos.is_capture(&parsed))
    }

    /// 上一步吃掉的棋子交给队友时的字母；未吃子时为空串
    pub fn piece_to_partner<S: AsRef<str>>(&self, variant: &str, fen: &str, moves: &[S]) -> Result<String> {
        let pos = self.replay(variant, fen, moves, false)?;
        let v = pos.variant();
        Ok(match &pos.state().captured {
            Some(captured) => {
                let pawn = v.main_promotion_pawn_type(captured.piece.side);
                v.piece_char(captured.demoted(pawn)).to_string()
            }
            None => String::new(),
        })
    }

    /// 对局结果（以走子方为视角）
    pub fn game_result<S: AsRef<str>>(&self, variant: &str, fen: &str, moves: &[S], chess960: bool) -> Result<i32> {
        let pos = self.replay(variant, fen, moves, chess960)?;
        Ok(Adjudicator::game_result(&pos))
    }

    /// 规则强制的终局：(是否终局, 结果)
    pub fn is_immediate_game_end<S: AsRef<str>>(
        &self,
        variant: &str,
        fen: &str,
        moves: &[S],
        chess960: bool,
    ) -> Result<(bool, i32)> {
        let pos = self.replay(variant, fen, moves, chess960)?;
        Ok(Adjudicator::is_immediate_game_end(&pos).map_or((false, 0), |r| (true, r)))
    }

    /// 可由一方提出的终局：(是否终局, 结果)
    pub fn is_optional_game_end<S: AsRef<str>>(
        &self,
        variant: &str,
        fen: &str,
        moves: &[S],
        chess960: bool,
    ) -> Result<(bool, i32)> {
        let pos = self.replay(variant, fen, moves, chess960)?;
        Ok(Adjudicator::is_optional_game_end(&pos).map_or((false, 0), |r| (true, r)))
    }

    /// 双方子力是否不足：(白方, 黑方)
    pub fn has_insufficient_material<S: AsRef<str>>(
        &self,
        variant: &str,
        fen: &str,
        moves: &[S],
        chess960: bool,
    ) -> Result<(bool, bool)> {
        let pos = self.replay(variant, fen, moves, chess960)?;
        Ok((
            Adjudicator::has_insufficient_material(&pos, Side::White),
            Adjudicator::has_insufficient_material(&pos, Side::Black),
        ))
    }

    /// 走子方视角的迷雾 FEN
    pub fn get_fog_fen(&self, fen: &str, variant: &str) -> Result<String> {
        Ok(self.replay::<&str>(variant, fen, &[], false)?.fog_fen())
    }

    /// 走法树叶子计数
    pub fn perft<S: AsRef<str>>(
        &self,
        variant: &str,
        fen: &str,
        moves: &[S],
        depth: u32,
        chess960: bool,
    ) -> Result<u64> {
        let mut pos = self.replay(variant, fen, moves, chess960)?;
        Ok(MoveGenerator::perft(&mut pos, depth))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
