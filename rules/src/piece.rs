//! 棋子、阵营与格子定义

use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};

use crate::constants::{CUSTOM_PIECE_NB, FILE_NB, RANK_NB, SQUARE_NB};

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 白方（先手，在下方）
    White,
    /// 黑方（后手，在上方）
    Black,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::White, Side::Black];

    /// 获取对方阵营
    pub fn opponent(&self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// 数组下标
    pub fn index(&self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    /// 获取 FEN 字符
    pub fn to_fen_char(&self) -> char {
        match self {
            Side::White => 'w',
            Side::Black => 'b',
        }
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<Side> {
        match c {
            'w' | 'W' => Some(Side::White),
            'b' | 'B' => Some(Side::Black),
            _ => None,
        }
    }
}

impl Not for Side {
    type Output = Side;

    fn not(self) -> Side {
        self.opponent()
    }
}

/// 棋子类型
///
/// 声明顺序即手持棋子的排序依据（输出时从王开始倒序）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    /// 泰国象棋的 met
    Fers,
    Alfil,
    FersAlfil,
    /// 泰国象棋的 khon
    Silver,
    Aiwok,
    /// 车 + 士
    Bers,
    Archbishop,
    Chancellor,
    Amazon,
    Knibis,
    Biskni,
    Kniroo,
    Rookni,
    ShogiPawn,
    Lance,
    ShogiKnight,
    EuroshogiKnight,
    Gold,
    DragonHorse,
    Clobber,
    Breakthrough,
    Immobile,
    Ataxx,
    /// 象棋的炮
    Cannon,
    /// 韩国象棋的包
    JanggiCannon,
    /// 象棋的兵
    Soldier,
    /// 象棋的马（蹩马腿）
    Horse,
    /// 象棋的象（塞象眼）
    Elephant,
    JanggiElephant,
    Banner,
    Wazir,
    /// 非王室的王
    Commoner,
    Centaur,
    /// 自定义棋子 1..=25
    Custom(u8),
    King,
}

/// 具名棋子类型及其配置名
const NAMED_TYPES: [(PieceType, &str); 40] = [
    (PieceType::Pawn, "pawn"),
    (PieceType::Knight, "knight"),
    (PieceType::Bishop, "bishop"),
    (PieceType::Rook, "rook"),
    (PieceType::Queen, "queen"),
    (PieceType::Fers, "fers"),
    (PieceType::Alfil, "alfil"),
    (PieceType::FersAlfil, "fersAlfil"),
    (PieceType::Silver, "silver"),
    (PieceType::Aiwok, "aiwok"),
    (PieceType::Bers, "bers"),
    (PieceType::Archbishop, "archbishop"),
    (PieceType::Chancellor, "chancellor"),
    (PieceType::Amazon, "amazon"),
    (PieceType::Knibis, "knibis"),
    (PieceType::Biskni, "biskni"),
    (PieceType::Kniroo, "kniroo"),
    (PieceType::Rookni, "rookni"),
    (PieceType::ShogiPawn, "shogiPawn"),
    (PieceType::Lance, "lance"),
    (PieceType::ShogiKnight, "shogiKnight"),
    (PieceType::EuroshogiKnight, "euroshogiKnight"),
    (PieceType::Gold, "gold"),
    (PieceType::DragonHorse, "dragonHorse"),
    (PieceType::Clobber, "clobber"),
    (PieceType::Breakthrough, "breakthrough"),
    (PieceType::Immobile, "immobile"),
    (PieceType::Ataxx, "ataxx"),
    (PieceType::Cannon, "cannon"),
    (PieceType::JanggiCannon, "janggiCannon"),
    (PieceType::Soldier, "soldier"),
    (PieceType::Horse, "horse"),
    (PieceType::Elephant, "elephant"),
    (PieceType::JanggiElephant, "janggiElephant"),
    (PieceType::Banner, "banner"),
    (PieceType::Wazir, "wazir"),
    (PieceType::Commoner, "commoner"),
    (PieceType::Centaur, "centaur"),
    (PieceType::King, "king"),
    // 别名在 from_config_name 中处理
    (PieceType::Bers, "dragon"),
];

/// 棋子类型数组长度上界
pub const PIECE_TYPE_NB: usize = 39 + CUSTOM_PIECE_NB as usize + 1;

impl PieceType {
    /// 数组下标（King 固定为最后一个）
    pub fn index(&self) -> usize {
        match self {
            PieceType::Custom(n) => 38 + *n as usize,
            PieceType::King => PIECE_TYPE_NB - 1,
            other => NAMED_TYPES
                .iter()
                .position(|(t, _)| t == other)
                .unwrap_or(0),
        }
    }

    /// 从配置名解析（`knight`、`customPiece3`、别名 `met`/`khon`/`dragon`）
    pub fn from_config_name(name: &str) -> Option<PieceType> {
        if let Some(n) = name.strip_prefix("customPiece") {
            let n: u8 = n.parse().ok()?;
            return (1..=CUSTOM_PIECE_NB).contains(&n).then_some(PieceType::Custom(n));
        }
        match name {
            "met" => return Some(PieceType::Fers),
            "khon" => return Some(PieceType::Silver),
            _ => {}
        }
        NAMED_TYPES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(t, _)| *t)
    }

    /// 配置名
    pub fn config_name(&self) -> String {
        match self {
            PieceType::Custom(n) => format!("customPiece{}", n),
            other => NAMED_TYPES
                .iter()
                .find(|(t, _)| t == other)
                .map(|(_, n)| n.to_string())
                .unwrap_or_default(),
        }
    }

    /// 默认 Betza 走法
    pub fn default_betza(&self) -> &'static str {
        match self {
            PieceType::Pawn => "fmWfcFifmnD",
            PieceType::Knight => "N",
            PieceType::Bishop => "B",
            PieceType::Rook => "R",
            PieceType::Queen => "Q",
            PieceType::Fers => "F",
            PieceType::Alfil => "A",
            PieceType::FersAlfil => "FA",
            PieceType::Silver => "FfW",
            PieceType::Aiwok => "RNF",
            PieceType::Bers => "RF",
            PieceType::Archbishop => "BN",
            PieceType::Chancellor => "RN",
            PieceType::Amazon => "QN",
            PieceType::Knibis => "mNcB",
            PieceType::Biskni => "mBcN",
            PieceType::Kniroo => "mNcR",
            PieceType::Rookni => "mRcN",
            PieceType::ShogiPawn => "fW",
            PieceType::Lance => "fR",
            PieceType::ShogiKnight => "fN",
            PieceType::EuroshogiKnight => "fNsW",
            PieceType::Gold => "WfF",
            PieceType::DragonHorse => "BW",
            PieceType::Clobber => "cW",
            PieceType::Breakthrough => "fmWfF",
            PieceType::Immobile => "",
            PieceType::Ataxx => "mDmNmA",
            PieceType::Cannon => "mRcpR",
            PieceType::JanggiCannon => "pR",
            PieceType::Soldier => "fW",
            PieceType::Horse => "nN",
            PieceType::Elephant => "nA",
            PieceType::JanggiElephant => "nZ",
            PieceType::Banner => "RcpRnN",
            PieceType::Wazir => "W",
            PieceType::Commoner => "K",
            PieceType::Centaur => "KN",
            PieceType::Custom(_) => "",
            PieceType::King => "K",
        }
    }

    /// 是否为自定义棋子
    pub fn is_custom(&self) -> bool {
        matches!(self, PieceType::Custom(_))
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_name())
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub side: Side,
}

impl Piece {
    /// 创建新棋子
    pub fn new(piece_type: PieceType, side: Side) -> Self {
        Self { piece_type, side }
    }
}

/// 棋盘格子（索引为 rank * 12 + file）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Square(u8);

impl Square {
    /// 创建格子（不检查棋盘尺寸，仅检查 12x10 上界）
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        if (file as usize) < FILE_NB && (rank as usize) < RANK_NB {
            Some(Self(rank * FILE_NB as u8 + file))
        } else {
            None
        }
    }

    /// 创建格子（不检查边界，内部使用）
    pub const fn new_unchecked(file: u8, rank: u8) -> Self {
        Self(rank * FILE_NB as u8 + file)
    }

    /// 从索引创建
    pub fn from_index(index: usize) -> Option<Self> {
        (index < SQUARE_NB).then_some(Self(index as u8))
    }

    /// 列 (0-11)
    pub fn file(&self) -> u8 {
        self.0 % FILE_NB as u8
    }

    /// 行 (0-9)
    pub fn rank(&self) -> u8 {
        self.0 / FILE_NB as u8
    }

    /// 索引
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// 相对于某一方的行号
    pub fn relative_rank(&self, side: Side, max_rank: u8) -> u8 {
        match side {
            Side::White => self.rank(),
            Side::Black => max_rank - self.rank(),
        }
    }

    /// 按偏移量移动，超出棋盘返回 None
    pub fn offset(&self, df: i32, dr: i32, max_file: u8, max_rank: u8) -> Option<Square> {
        let f = self.file() as i32 + df;
        let r = self.rank() as i32 + dr;
        if f < 0 || r < 0 || f > max_file as i32 || r > max_rank as i32 {
            None
        } else {
            Some(Square::new_unchecked(f as u8, r as u8))
        }
    }

    /// 解析 `a1` / `a10` 形式的格子，返回格子与消耗的字节数
    pub fn parse_prefix(text: &str) -> Option<(Square, usize)> {
        let bytes = text.as_bytes();
        let file = *bytes.first()?;
        if !file.is_ascii_lowercase() {
            return None;
        }
        let digits = bytes[1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 || digits > 2 {
            return None;
        }
        let rank: u8 = text[1..1 + digits].parse().ok()?;
        if rank == 0 {
            return None;
        }
        Square::new(file - b'a', rank - 1).map(|sq| (sq, 1 + digits))
    }

    /// 解析完整的格子字符串
    pub fn parse(text: &str) -> Option<Square> {
        match Square::parse_prefix(text) {
            Some((sq, len)) if len == text.len() => Some(sq),
            _ => None,
        }
    }

    /// 列字母
    pub fn file_char(&self) -> char {
        (b'a' + self.file()) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_parse() {
        let sq = Square::parse("e4").unwrap();
        assert_eq!(sq.file(), 4);
        assert_eq!(sq.rank(), 3);
        assert_eq!(sq.to_string(), "e4");

        let sq = Square::parse("a10").unwrap();
        assert_eq!(sq.rank(), 9);
        assert_eq!(sq.to_string(), "a10");

        assert!(Square::parse("a0").is_none());
        assert!(Square::parse("m1").is_none());
        assert!(Square::parse("e4x").is_none());
    }

    #[test]
    fn test_square_prefix() {
        let (sq, len) = Square::parse_prefix("a10b10").unwrap();
        assert_eq!(sq.to_string(), "a10");
        assert_eq!(len, 3);
    }

    #[test]
    fn test_square_ordering_is_rank_major() {
        let a2 = Square::parse("a2").unwrap();
        let h1 = Square::parse("h1").unwrap();
        assert!(h1 < a2);
    }

    #[test]
    fn test_offset() {
        let sq = Square::parse("a1").unwrap();
        assert_eq!(sq.offset(1, 2, 7, 7).unwrap().to_string(), "b3");
        assert!(sq.offset(-1, 0, 7, 7).is_none());
        assert!(sq.offset(0, 8, 7, 7).is_none());
    }

    #[test]
    fn test_piece_type_names() {
        assert_eq!(PieceType::from_config_name("met"), Some(PieceType::Fers));
        assert_eq!(PieceType::from_config_name("dragon"), Some(PieceType::Bers));
        assert_eq!(
            PieceType::from_config_name("customPiece25"),
            Some(PieceType::Custom(25))
        );
        assert_eq!(PieceType::from_config_name("customPiece26"), None);
        assert_eq!(PieceType::Custom(3).config_name(), "customPiece3");
        assert_eq!(PieceType::JanggiCannon.config_name(), "janggiCannon");
    }

    #[test]
    fn test_piece_type_indices_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for (t, _) in NAMED_TYPES.iter().take(39) {
            assert!(seen.insert(t.index()));
        }
        for n in 1..=CUSTOM_PIECE_NB {
            assert!(seen.insert(PieceType::Custom(n).index()));
        }
        assert!(seen.iter().all(|i| *i < PIECE_TYPE_NB));
    }

    #[test]
    fn test_hand_order() {
        assert!(PieceType::King > PieceType::Custom(1));
        assert!(PieceType::Chancellor > PieceType::Archbishop);
        assert!(PieceType::Custom(2) > PieceType::Custom(1));
    }

    #[test]
    fn test_side() {
        assert_eq!(!Side::White, Side::Black);
        assert_eq!(Side::from_fen_char('b'), Some(Side::Black));
        assert_eq!(Side::Black.to_fen_char(), 'b');
    }
}
