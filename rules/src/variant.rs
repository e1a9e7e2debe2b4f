//! 变体描述
//!
//! 一个 [`Variant`] 在载入后不再改变，由局面、走法生成、记谱与裁决共同读取。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::betza::MovementSpec;
use crate::bitboard::Bitboard;
use crate::constants::VALUE_MATE;
use crate::error::ConfigError;
use crate::piece::{Piece, PieceType, Side, Square};

/// 终局数值（以走子方视角）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameValue {
    Win,
    Loss,
    Draw,
    /// 该规则不生效
    None,
}

impl GameValue {
    /// 数值，`None` 返回 `None`
    pub fn score(self) -> Option<i32> {
        match self {
            GameValue::Win => Some(VALUE_MATE),
            GameValue::Loss => Some(-VALUE_MATE),
            GameValue::Draw => Some(0),
            GameValue::None => None,
        }
    }

    pub fn parse(text: &str) -> Option<GameValue> {
        match text {
            "win" => Some(GameValue::Win),
            "loss" => Some(GameValue::Loss),
            "draw" => Some(GameValue::Draw),
            "none" => Some(GameValue::None),
            _ => None,
        }
    }
}

/// 数子规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountingRule {
    None,
    Makruk,
    Cambodian,
    Asean,
}

/// 子力计数方式（韩国象棋比子）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialCounting {
    None,
    Janggi,
    Unweighted,
}

/// 夹子规则（黑白棋、同化棋）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnclosingRule {
    None,
    Reversi,
    Ataxx,
}

/// 障碍规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallingRule {
    None,
    /// 每步后移动鸭子
    Duck,
}

/// 追捉规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChasingRule {
    None,
    /// 亚洲象棋联合会规则
    Axf,
}

/// 变体模板（影响默认记谱法）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantTemplate {
    Fairy,
    Shogi,
}

/// 棋子定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceDef {
    pub piece_type: PieceType,
    /// 大写字母
    pub letter: char,
    /// 同义字母（记谱时优先使用）
    pub synonym: Option<char>,
    /// 白方 / 黑方是否拥有该棋子
    pub sides: [bool; 2],
    pub betza: String,
    pub movement: MovementSpec,
}

/// 变体规则描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub template: VariantTemplate,
    pub max_rank: u8,
    pub max_file: u8,
    pub pieces: BTreeMap<PieceType, PieceDef>,
    pub start_fen: String,
    pub piece_to_char_table: Option<String>,
    pub chess960: bool,
    pub two_boards: bool,
    pub mobility_region: BTreeMap<PieceType, [Bitboard; 2]>,
    /// 九宫斜线
    pub diagonal_lines: Bitboard,
    /// 王的走法由配置改写
    pub custom_king: bool,

    // 升变
    pub promotion_region: [Bitboard; 2],
    pub promotion_pawn_types: [Vec<PieceType>; 2],
    /// 可选升变类型（降序）
    pub promotion_piece_types: [Vec<PieceType>; 2],
    pub sittuyin_promotion: bool,
    pub promotion_limit: BTreeMap<PieceType, u8>,
    pub promoted_piece_type: BTreeMap<PieceType, PieceType>,
    pub piece_promotion_on_capture: bool,
    pub mandatory_pawn_promotion: bool,
    pub mandatory_piece_promotion: bool,
    pub piece_demotion: bool,
    pub blast_on_capture: bool,

    // 兵
    pub double_step: bool,
    pub double_step_region: [Bitboard; 2],
    pub en_passant: bool,

    // 易位
    pub castling: bool,
    pub castling_dropped_piece: bool,
    pub castling_kingside_file: u8,
    pub castling_queenside_file: u8,
    pub castling_rank: u8,
    pub castling_king_piece: PieceType,
    pub castling_rook_pieces: Vec<PieceType>,

    pub checking: bool,
    pub must_capture: bool,

    // 打入
    pub piece_drops: bool,
    pub must_drop: bool,
    pub captures_to_hand: bool,
    pub drop_loop: bool,
    pub first_rank_pawn_drops: bool,
    pub promotion_zone_pawn_drops: bool,
    pub drop_on_top: bool,
    pub drop_region: [Bitboard; 2],
    pub sittuyin_rook_drop: bool,
    pub drop_opposite_colored_bishop: bool,
    pub drop_promoted: bool,
    pub drop_no_doubled: Option<PieceType>,
    pub drop_no_doubled_count: u8,
    pub immobility_illegal: bool,
    /// 手中棋子无限（不输出到 FEN）
    pub free_drops: bool,
    pub enclosing_drop: EnclosingRule,

    // 入场与特殊走法
    pub gating: bool,
    pub seirawan_gating: bool,
    pub cambodian_moves: bool,
    pub flying_general: bool,
    pub xiangqi_soldier: bool,
    pub bikjang: bool,
    pub pass: bool,
    pub pass_on_stalemate: bool,
    pub makpong_rule: bool,
    pub walling_rule: WallingRule,
    pub flip_enclosed_pieces: EnclosingRule,

    // 终局
    pub n_move_rule: u32,
    pub n_fold_rule: u32,
    pub n_fold_value: GameValue,
    pub n_fold_value_absolute: bool,
    pub perpetual_check_illegal: bool,
    pub chasing_rule: ChasingRule,
    pub stalemate_value: GameValue,
    pub stalemate_piece_count: bool,
    pub checkmate_value: GameValue,
    pub shogi_pawn_drop_mate_illegal: bool,
    pub bare_king_value: GameValue,
    pub bare_king_move: bool,
    pub extinction_value: GameValue,
    pub extinction_pseudo_royal: bool,
    /// 灭绝判定的棋子类型，`None` 表示全部棋子
    pub extinction_piece_types: Option<Vec<PieceType>>,
    pub extinction_piece_count: u32,
    pub extinction_opponent_piece_count: u32,
    pub pseudo_royal_types: Vec<PieceType>,
    pub duple_check: bool,
    pub flag_piece: Option<PieceType>,
    pub flag_region: [Bitboard; 2],
    pub flag_move: bool,
    pub check_counting: bool,
    pub connect_n: u8,
    pub material_counting: MaterialCounting,
    pub counting_rule: CountingRule,
    pub adjudicate_full_board: bool,
}

/// 按行集合（0 起）构造区域
pub fn ranks_bb(ranks: impl IntoIterator<Item = u8>, max_file: u8) -> Bitboard {
    ranks
        .into_iter()
        .fold(Bitboard::EMPTY, |bb, r| bb | Bitboard::rank(r, max_file))
}

impl Variant {
    /// 国际象棋模板
    pub fn chess() -> Self {
        let mut v = Variant {
            name: "chess".to_string(),
            template: VariantTemplate::Fairy,
            max_rank: 7,
            max_file: 7,
            pieces: BTreeMap::new(),
            start_fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_string(),
            piece_to_char_table: None,
            chess960: false,
            two_boards: false,
            mobility_region: BTreeMap::new(),
            diagonal_lines: Bitboard::EMPTY,
            custom_king: false,
            promotion_region: [Bitboard::EMPTY; 2],
            promotion_pawn_types: [vec![PieceType::Pawn], vec![PieceType::Pawn]],
            promotion_piece_types: [Vec::new(), Vec::new()],
            sittuyin_promotion: false,
            promotion_limit: BTreeMap::new(),
            promoted_piece_type: BTreeMap::new(),
            piece_promotion_on_capture: false,
            mandatory_pawn_promotion: true,
            mandatory_piece_promotion: false,
            piece_demotion: false,
            blast_on_capture: false,
            double_step: true,
            double_step_region: [Bitboard::EMPTY; 2],
            en_passant: true,
            castling: true,
            castling_dropped_piece: false,
            castling_kingside_file: 6,
            castling_queenside_file: 2,
            castling_rank: 0,
            castling_king_piece: PieceType::King,
            castling_rook_pieces: vec![PieceType::Rook],
            checking: true,
            must_capture: false,
            piece_drops: false,
            must_drop: false,
            captures_to_hand: false,
            drop_loop: false,
            first_rank_pawn_drops: false,
            promotion_zone_pawn_drops: false,
            drop_on_top: false,
            drop_region: [Bitboard::EMPTY; 2],
            sittuyin_rook_drop: false,
            drop_opposite_colored_bishop: false,
            drop_promoted: false,
            drop_no_doubled: None,
            drop_no_doubled_count: 1,
            immobility_illegal: false,
            free_drops: false,
            enclosing_drop: EnclosingRule::None,
            gating: false,
            seirawan_gating: false,
            cambodian_moves: false,
            flying_general: false,
            xiangqi_soldier: false,
            bikjang: false,
            pass: false,
            pass_on_stalemate: false,
            makpong_rule: false,
            walling_rule: WallingRule::None,
            flip_enclosed_pieces: EnclosingRule::None,
            n_move_rule: 50,
            n_fold_rule: 3,
            n_fold_value: GameValue::Draw,
            n_fold_value_absolute: false,
            perpetual_check_illegal: false,
            chasing_rule: ChasingRule::None,
            stalemate_value: GameValue::Draw,
            stalemate_piece_count: false,
            checkmate_value: GameValue::Loss,
            shogi_pawn_drop_mate_illegal: false,
            bare_king_value: GameValue::None,
            bare_king_move: false,
            extinction_value: GameValue::None,
            extinction_pseudo_royal: false,
            extinction_piece_types: Some(Vec::new()),
            extinction_piece_count: 0,
            extinction_opponent_piece_count: 0,
            pseudo_royal_types: Vec::new(),
            duple_check: false,
            flag_piece: None,
            flag_region: [Bitboard::EMPTY; 2],
            flag_move: false,
            check_counting: false,
            connect_n: 0,
            material_counting: MaterialCounting::None,
            counting_rule: CountingRule::None,
            adjudicate_full_board: false,
        };
        for (pt, c) in [
            (PieceType::Pawn, 'p'),
            (PieceType::Knight, 'n'),
            (PieceType::Bishop, 'b'),
            (PieceType::Rook, 'r'),
            (PieceType::Queen, 'q'),
            (PieceType::King, 'k'),
        ] {
            v.add_builtin(pt, c);
        }
        v.promotion_piece_types = [
            vec![PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight],
            vec![PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight],
        ];
        v.reset_geometry();
        v
    }

    /// 空白模板：国际象棋规则但没有任何棋子
    pub fn fairy_template() -> Self {
        let mut v = Variant::chess();
        v.pieces.clear();
        v.promotion_piece_types = [Vec::new(), Vec::new()];
        v
    }

    /// 按尺寸重置默认区域（升变区、双步区、打入区）
    pub fn reset_geometry(&mut self) {
        let (mf, mr) = (self.max_file, self.max_rank);
        self.promotion_region = [Bitboard::rank(mr, mf), Bitboard::rank(0, mf)];
        self.double_step_region = [Bitboard::rank(1, mf), Bitboard::rank(mr.saturating_sub(1), mf)];
        let all = self.board_bb();
        self.drop_region = [all, all];
    }

    /// 设置棋盘尺寸（0 起）并重置默认区域
    pub fn set_dimensions(&mut self, max_file: u8, max_rank: u8) {
        self.max_file = max_file;
        self.max_rank = max_rank;
        self.reset_geometry();
    }

    /// 棋盘全部格子
    pub fn board_bb(&self) -> Bitboard {
        Bitboard::board(self.max_file, self.max_rank)
    }

    /// 使用默认走法添加内置棋子
    pub fn add_builtin(&mut self, pt: PieceType, letter: char) {
        let betza = pt.default_betza();
        let movement = MovementSpec::parse(betza).unwrap_or_default();
        self.insert_piece(pt, letter, betza.to_string(), movement, [true, true]);
    }

    /// 使用固定走法添加内置棋子
    pub fn add_builtin_with(&mut self, pt: PieceType, letter: char, betza: &str) {
        let movement = MovementSpec::parse(betza).unwrap_or_default();
        self.insert_piece(pt, letter, betza.to_string(), movement, [true, true]);
    }

    /// 只给一方添加固定走法的内置棋子
    pub fn add_builtin_for(&mut self, pt: PieceType, letter: char, betza: &str, side: Side) {
        let movement = MovementSpec::parse(betza).unwrap_or_default();
        let mut sides = [false, false];
        sides[side.index()] = true;
        self.insert_piece(pt, letter, betza.to_string(), movement, sides);
    }

    /// 添加棋子，可选地覆盖走法（同字母的旧棋子被移除）
    pub fn add_piece(&mut self, pt: PieceType, letter: char, betza: Option<&str>) -> Result<(), ConfigError> {
        let betza = match betza {
            Some(b) => b.to_string(),
            None => self
                .pieces
                .get(&pt)
                .map(|d| d.betza.clone())
                .unwrap_or_else(|| pt.default_betza().to_string()),
        };
        let movement = MovementSpec::parse(&betza)?;
        self.insert_piece(pt, letter, betza, movement, [true, true]);
        Ok(())
    }

    /// 只给一方添加棋子
    pub fn add_piece_for(&mut self, pt: PieceType, letter: char, betza: &str, side: Side) -> Result<(), ConfigError> {
        let movement = MovementSpec::parse(betza)?;
        let mut sides = [false, false];
        sides[side.index()] = true;
        self.insert_piece(pt, letter, betza.to_string(), movement, sides);
        Ok(())
    }

    fn insert_piece(&mut self, pt: PieceType, letter: char, betza: String, movement: MovementSpec, sides: [bool; 2]) {
        let letter = letter.to_ascii_uppercase();
        let clashes: Vec<PieceType> = self
            .pieces
            .values()
            .filter(|d| d.piece_type != pt && d.letter == letter && (0..2).any(|i| d.sides[i] && sides[i]))
            .map(|d| d.piece_type)
            .collect();
        for other in clashes {
            self.pieces.remove(&other);
        }
        let synonym = self.pieces.get(&pt).and_then(|d| d.synonym);
        self.pieces.insert(
            pt,
            PieceDef {
                piece_type: pt,
                letter,
                synonym,
                sides,
                betza,
                movement,
            },
        );
    }

    /// 设置记谱用同义字母
    pub fn set_synonym(&mut self, pt: PieceType, synonym: char) {
        if let Some(def) = self.pieces.get_mut(&pt) {
            def.synonym = Some(synonym.to_ascii_uppercase());
        }
    }

    pub fn remove_piece(&mut self, pt: PieceType) {
        self.pieces.remove(&pt);
    }

    pub fn piece_def(&self, pt: PieceType) -> Option<&PieceDef> {
        self.pieces.get(&pt)
    }

    /// 某方拥有的棋子类型（升序）
    pub fn piece_types(&self, side: Side) -> impl Iterator<Item = PieceType> + '_ {
        self.pieces
            .values()
            .filter(move |d| d.sides[side.index()])
            .map(|d| d.piece_type)
    }

    pub fn movement(&self, pt: PieceType) -> Option<&MovementSpec> {
        self.pieces.get(&pt).map(|d| &d.movement)
    }

    /// 棋子在 FEN 中的字符
    pub fn piece_char(&self, piece: Piece) -> char {
        let letter = self
            .pieces
            .get(&piece.piece_type)
            .map(|d| d.letter)
            .unwrap_or('?');
        match piece.side {
            Side::White => letter,
            Side::Black => letter.to_ascii_lowercase(),
        }
    }

    /// 记谱用的大写字母（优先同义字母）
    pub fn notation_char(&self, pt: PieceType) -> char {
        self.pieces
            .get(&pt)
            .map(|d| d.synonym.unwrap_or(d.letter))
            .unwrap_or('?')
    }

    /// 从 FEN 字符解析棋子（接受同义字母）
    pub fn piece_from_char(&self, c: char) -> Option<Piece> {
        let side = if c.is_ascii_uppercase() {
            Side::White
        } else if c.is_ascii_lowercase() {
            Side::Black
        } else {
            return None;
        };
        let upper = c.to_ascii_uppercase();
        let find = |by_synonym: bool| {
            self.pieces.values().find(|d| {
                d.sides[side.index()]
                    && if by_synonym {
                        d.synonym == Some(upper)
                    } else {
                        d.letter == upper
                    }
            })
        };
        find(false)
            .or_else(|| find(true))
            .map(|d| Piece::new(d.piece_type, side))
    }

    /// 按字母查找棋子类型（不区分阵营）
    pub fn piece_type_from_letter(&self, c: char) -> Option<PieceType> {
        let upper = c.to_ascii_uppercase();
        self.pieces
            .values()
            .find(|d| d.letter == upper)
            .or_else(|| self.pieces.values().find(|d| d.synonym == Some(upper)))
            .map(|d| d.piece_type)
    }

    /// 棋子的活动区域
    pub fn mobility(&self, side: Side, pt: PieceType) -> Bitboard {
        self.mobility_region
            .get(&pt)
            .map(|r| r[side.index()])
            .unwrap_or_else(|| self.board_bb())
    }

    /// 是否为王（含伪王）
    pub fn is_royal(&self, pt: PieceType) -> bool {
        pt == PieceType::King
            || self.pseudo_royal_types.contains(&pt)
            || (self.extinction_pseudo_royal
                && self
                    .extinction_piece_types
                    .as_ref()
                    .map_or(false, |types| types.contains(&pt)))
    }

    pub fn promoted_type(&self, pt: PieceType) -> Option<PieceType> {
        self.promoted_piece_type.get(&pt).copied()
    }

    /// 是否存在将棋式的 `+` 升变
    pub fn shogi_style_promotions(&self) -> bool {
        !self.promoted_piece_type.is_empty()
    }

    /// 是否为升变兵种
    pub fn is_promotion_pawn(&self, side: Side, pt: PieceType) -> bool {
        self.promotion_pawn_types[side.index()].contains(&pt)
    }

    /// 主升变兵种（被吃的升变棋子降为此类型）
    pub fn main_promotion_pawn_type(&self, side: Side) -> PieceType {
        self.promotion_pawn_types[side.index()]
            .first()
            .copied()
            .unwrap_or(PieceType::Pawn)
    }

    /// 易位所在行
    pub fn castling_rank_of(&self, side: Side) -> u8 {
        match side {
            Side::White => self.castling_rank,
            Side::Black => self.max_rank - self.castling_rank,
        }
    }

    /// 灭绝判定是否作用于该类型
    pub fn is_extinction_type(&self, pt: PieceType) -> bool {
        match &self.extinction_piece_types {
            None => true,
            Some(types) => types.contains(&pt),
        }
    }

    /// 是否需要在 FEN 中输出手中棋子
    pub fn has_hand(&self) -> bool {
        (self.piece_drops || self.seirawan_gating || self.two_boards) && !self.free_drops
    }

    /// 九宫内的斜线是否连接两个格子
    pub fn on_diagonal_line(&self, from: Square, to: Square) -> bool {
        self.diagonal_lines.contains(from) && self.diagonal_lines.contains(to)
    }

    /// 用字母序列解析棋子类型列表（`-` 表示空）
    pub fn parse_piece_list(&self, text: &str) -> Result<Vec<PieceType>, ConfigError> {
        let mut out = Vec::new();
        for c in text.chars().filter(|c| !c.is_whitespace() && *c != '-') {
            let pt = self.piece_type_from_letter(c).ok_or_else(|| ConfigError::PieceLetter {
                variant: self.name.clone(),
                letter: c,
            })?;
            if !out.contains(&pt) {
                out.push(pt);
            }
        }
        Ok(out)
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::chess()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chess_pieces() {
        let v = Variant::chess();
        assert_eq!(v.pieces.len(), 6);
        assert_eq!(v.piece_char(Piece::new(PieceType::Knight, Side::Black)), 'n');
        assert_eq!(
            v.piece_from_char('Q'),
            Some(Piece::new(PieceType::Queen, Side::White))
        );
        assert!(v.piece_from_char('H').is_none());
    }

    #[test]
    fn test_add_piece_replaces_same_letter() {
        let mut v = Variant::chess();
        v.add_piece(PieceType::Fers, 'q', None).unwrap();
        assert!(v.piece_def(PieceType::Queen).is_none());
        assert_eq!(v.piece_type_from_letter('q'), Some(PieceType::Fers));
    }

    #[test]
    fn test_per_side_letters() {
        let mut v = Variant::chess();
        v.add_piece_for(PieceType::King, 'k', "K", Side::White).unwrap();
        v.add_piece_for(PieceType::Commoner, 'k', "K", Side::Black).unwrap();
        assert!(v.piece_def(PieceType::King).is_some());
        assert_eq!(
            v.piece_from_char('K'),
            Some(Piece::new(PieceType::King, Side::White))
        );
        assert_eq!(
            v.piece_from_char('k'),
            Some(Piece::new(PieceType::Commoner, Side::Black))
        );
    }

    #[test]
    fn test_geometry_defaults() {
        let mut v = Variant::chess();
        v.set_dimensions(9, 9);
        assert!(v.promotion_region[0].contains(Square::parse("a10").unwrap()));
        assert!(v.double_step_region[1].contains(Square::parse("c9").unwrap()));
    }

    #[test]
    fn test_piece_list() {
        let v = Variant::chess();
        assert_eq!(
            v.parse_piece_list("qh").unwrap_err(),
            ConfigError::PieceLetter {
                variant: "chess".to_string(),
                letter: 'h'
            }
        );
        assert_eq!(v.parse_piece_list("-").unwrap(), Vec::<PieceType>::new());
        assert_eq!(
            v.parse_piece_list("rbn").unwrap(),
            vec![PieceType::Rook, PieceType::Bishop, PieceType::Knight]
        );
    }
}
