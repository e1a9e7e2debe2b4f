//! 走法记谱：UCI 以及 SAN / LAN / 将棋 / 韩国象棋 / WXF / 泰文记法

use serde::{Deserialize, Serialize};

use crate::attacks::reach;
use crate::bitboard::Bitboard;
use crate::constants::{THAI_DIGITS, THAI_FILES};
use crate::movegen::MoveGenerator;
use crate::moves::{Move, MoveKind};
use crate::piece::{Piece, PieceType, Side, Square};
use crate::position::{castling_destinations, Position};
use crate::variant::{Variant, VariantTemplate};

/// 记谱方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Notation {
    /// 按变体选择
    #[default]
    Default,
    San,
    Lan,
    /// 例：P76, S'34
    ShogiHosking,
    /// 例：P-7f, S*3d
    ShogiHodges,
    /// 例：P-76, S*34
    ShogiHodgesNumber,
    Janggi,
    XiangqiWxf,
    ThaiSan,
    ThaiLan,
}

impl Notation {
    pub const ALL: [Notation; 10] = [
        Notation::Default,
        Notation::San,
        Notation::Lan,
        Notation::ShogiHosking,
        Notation::ShogiHodges,
        Notation::ShogiHodgesNumber,
        Notation::Janggi,
        Notation::XiangqiWxf,
        Notation::ThaiSan,
        Notation::ThaiLan,
    ];

    /// 数值编号
    pub fn code(self) -> i32 {
        Self::ALL.iter().position(|n| *n == self).unwrap_or(0) as i32
    }

    pub fn from_code(code: i32) -> Option<Notation> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// 变体的默认记法
    pub fn default_for(v: &Variant) -> Notation {
        match v.template {
            VariantTemplate::Shogi => Notation::ShogiHodgesNumber,
            VariantTemplate::Fairy => Notation::San,
        }
    }

    fn resolve(self, v: &Variant) -> Notation {
        match self {
            Notation::Default => Self::default_for(v),
            n => n,
        }
    }

    pub fn is_shogi(self) -> bool {
        matches!(
            self,
            Notation::ShogiHosking | Notation::ShogiHodges | Notation::ShogiHodgesNumber
        )
    }

    pub fn is_thai(self) -> bool {
        matches!(self, Notation::ThaiSan | Notation::ThaiLan)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disambiguation {
    None,
    File,
    Rank,
    Square,
}

/// 白方棋子字母的小写形式
fn lower_letter(v: &Variant, pt: PieceType) -> char {
    v.piece_char(Piece::new(pt, Side::White)).to_ascii_lowercase()
}

fn upper_letter(v: &Variant, pt: PieceType) -> char {
    v.piece_char(Piece::new(pt, Side::White)).to_ascii_uppercase()
}

/// 输出 UCI 走法
pub fn move_to_uci(pos: &Position, mv: &Move) -> String {
    uci_with(pos.variant(), pos, mv, pos.chess960())
}

fn uci_with(v: &Variant, pos: &Position, mv: &Move, chess960: bool) -> String {
    let mut out = match mv.kind {
        MoveKind::Drop { piece, promoted } => {
            let prefix = if promoted { "+" } else { "" };
            format!("{}{}@{}", prefix, upper_letter(v, piece), mv.to)
        }
        MoveKind::Castling => {
            let (king_to, _) = castling_destinations(v, mv.from, mv.to);
            match mv.gating {
                // 在车格入场时从车格写到王格
                Some((_, gate)) if gate == mv.to => format!("{}{}", mv.to, mv.from),
                _ => {
                    let king = pos.board().get(mv.from);
                    let collides = king_to == mv.from
                        || king.map_or(false, |k| reach(v, pos.board(), mv.from, k, false).quiet.contains(king_to));
                    let to = if chess960 || collides { mv.to } else { king_to };
                    format!("{}{}", mv.from, to)
                }
            }
        }
        _ => format!("{}{}", mv.from, mv.to),
    };
    match mv.kind {
        MoveKind::Promotion(pt) => out.push(lower_letter(v, pt)),
        MoveKind::PiecePromotion => out.push('+'),
        MoveKind::PieceDemotion => out.push('-'),
        _ => {}
    }
    if let Some((pt, _)) = mv.gating {
        out.push(lower_letter(v, pt));
    }
    if let Some(wall) = mv.wall {
        out.push_str(&format!(",{}{}", mv.to_effective(v), wall));
    }
    out
}

impl Move {
    /// 走法结束后棋子所在格（易位时为王的落点）
    pub fn to_effective(&self, v: &Variant) -> Square {
        match self.kind {
            MoveKind::Castling => castling_destinations(v, self.from, self.to).0,
            _ => self.to,
        }
    }
}

/// 在合法走法中查找 UCI 文本对应的走法
///
/// 同时接受标准写法与 960 写法的易位。打步诘的兵打入也能解析，由裁决判负。
pub fn parse_uci(pos: &Position, text: &str) -> Option<Move> {
    let v = pos.variant();
    let chess960 = pos.chess960();
    let find = |moves: &[Move]| {
        moves
            .iter()
            .find(|mv| uci_with(v, pos, mv, chess960) == text)
            .or_else(|| moves.iter().find(|mv| uci_with(v, pos, mv, !chess960) == text))
            .copied()
    };
    find(&MoveGenerator::generate_legal(pos)).or_else(|| {
        if v.shogi_pawn_drop_mate_illegal && text.contains('@') {
            find(&MoveGenerator::generate_playable(pos))
        } else {
            None
        }
    })
}

/// 输出指定记法的走法
pub fn move_to_san(pos: &Position, mv: &Move, notation: Notation) -> String {
    let n = notation.resolve(pos.variant());
    SanWriter::new(pos, n).write(mv)
}

struct SanWriter<'a> {
    pos: &'a Position,
    v: &'a Variant,
    n: Notation,
    us: Side,
    legal: Vec<Move>,
}

impl<'a> SanWriter<'a> {
    fn new(pos: &'a Position, n: Notation) -> Self {
        Self {
            pos,
            v: pos.variant(),
            n,
            us: pos.side_to_move(),
            legal: MoveGenerator::generate_legal(pos),
        }
    }

    fn write(&self, mv: &Move) -> String {
        let v = self.v;
        let n = self.n;
        let mut san = String::new();

        if mv.is_castling() {
            san.push_str(if mv.to.file() > mv.from.file() { "O-O" } else { "O-O-O" });
            if let Some((pt, gate)) = mv.gating {
                san.push('/');
                san.push(upper_letter(v, pt));
                san.push_str(&self.square(gate));
            }
        } else {
            let d = self.disambiguation_level(mv);
            san.push_str(&self.piece(mv));
            if n == Notation::ThaiLan {
                san.push(' ');
            }
            san.push_str(&self.disambiguation(mv.from, d));

            if mv.is_drop() {
                san.push(match n {
                    Notation::ShogiHosking => '\'',
                    _ if n.is_shogi() => '*',
                    _ => '@',
                });
            } else if n == Notation::XiangqiWxf {
                let (from_rank, to_rank) = (
                    mv.from.relative_rank(self.us, v.max_rank),
                    mv.to.relative_rank(self.us, v.max_rank),
                );
                san.push(match to_rank.cmp(&from_rank) {
                    std::cmp::Ordering::Equal => '=',
                    std::cmp::Ordering::Greater => '+',
                    std::cmp::Ordering::Less => '-',
                });
            } else if self.pos.is_capture(mv) {
                san.push('x');
            } else if n == Notation::Lan
                || n == Notation::Janggi
                || n == Notation::ThaiLan
                || (n.is_shogi() && (n != Notation::ShogiHosking || d == Disambiguation::Square))
                || (n == Notation::ThaiSan && !self.piece(mv).is_empty())
            {
                san.push('-');
            }

            if n == Notation::XiangqiWxf && !mv.is_drop() {
                if mv.to.file() == mv.from.file() {
                    san.push_str(&mv.to.rank().abs_diff(mv.from.rank()).to_string());
                } else {
                    san.push_str(&self.file(mv.to));
                }
            } else {
                san.push_str(&self.square(mv.to));
            }

            san.push_str(&self.suffix(mv));
            if let Some((pt, _)) = mv.gating {
                san.push('/');
                san.push(upper_letter(v, pt));
            }
            if let Some(wall) = mv.wall {
                san.push(',');
                san.push_str(&self.square(mv.to));
                san.push_str(&self.square(wall));
            }
        }

        if !n.is_shogi() && n != Notation::XiangqiWxf {
            let next = self.pos.make(*mv);
            if !next.checkers.is_empty() {
                let reply = Position::from_state(self.pos.variant_arc(), next, self.pos.chess960());
                san.push(if MoveGenerator::generate_legal(&reply).is_empty() { '#' } else { '+' });
            }
        }
        san
    }

    fn suffix(&self, mv: &Move) -> String {
        let v = self.v;
        let n = self.n;
        let board = self.pos.board();
        match mv.kind {
            MoveKind::Promotion(pt) if n.is_thai() => format!("={}", thai_glyph(pt, true)),
            MoveKind::Promotion(pt) => format!("={}", upper_letter(v, pt)),
            MoveKind::PiecePromotion if n.is_shogi() => "+".to_string(),
            MoveKind::PiecePromotion => {
                let promoted = board
                    .get(mv.from)
                    .and_then(|p| v.promoted_type(p.piece_type))
                    .map_or('?', |pt| upper_letter(v, pt));
                format!("={}", promoted)
            }
            MoveKind::PieceDemotion if n.is_shogi() => "-".to_string(),
            MoveKind::PieceDemotion => {
                let original = board.unpromoted(mv.from).map_or('?', |pt| upper_letter(v, pt));
                format!("={}", original)
            }
            MoveKind::Normal if n.is_shogi() => {
                let promotable = self.legal.iter().any(|m| {
                    m.from == mv.from && m.to == mv.to && m.kind == MoveKind::PiecePromotion
                });
                if promotable { "=".to_string() } else { String::new() }
            }
            _ => String::new(),
        }
    }

    fn piece(&self, mv: &Move) -> String {
        let v = self.v;
        let n = self.n;
        let board = self.pos.board();
        let Some(pc) = self.pos.moved_piece(mv) else {
            return String::new();
        };
        let pt = pc.piece_type;

        if n.is_thai() {
            if n == Notation::ThaiSan && pt == PieceType::Pawn && !mv.is_drop() {
                return String::new();
            }
            return thai_glyph(pt, board.is_promoted(mv.from)).to_string();
        }
        if matches!(n, Notation::San | Notation::Lan) && pt == PieceType::Pawn && !mv.is_drop() {
            return String::new();
        }
        if n == Notation::XiangqiWxf {
            if let Some(ordinal) = self.tandem_ordinal(mv.from, pt) {
                return ordinal.to_string();
            }
        }
        if n.is_shogi() {
            if let Some(original) = board.unpromoted(mv.from).filter(|_| !mv.is_drop()) {
                return format!("+{}", upper_letter(v, original));
            }
            if let MoveKind::Drop { piece, promoted: true } = mv.kind {
                return format!("+{}", upper_letter(v, piece));
            }
        }
        v.notation_char(pt).to_ascii_uppercase().to_string()
    }

    /// 同一直线上的多个同类棋子（WXF 前后序号）
    fn tandem_ordinal(&self, from: Square, pt: PieceType) -> Option<u32> {
        let v = self.v;
        let mine = self.pos.board().pieces_of(self.us, pt);
        let on_file = |f: u8| (mine & Bitboard::file(f, v.max_rank)).count();
        let stacked_files = (0..=v.max_file).filter(|f| on_file(*f) >= 2).count();
        let count = on_file(from.file());
        if count < 3 && !(count == 2 && stacked_files > 1) {
            return None;
        }
        let ahead = (mine & Bitboard::file(from.file(), v.max_rank))
            .iter()
            .filter(|sq| sq.relative_rank(self.us, v.max_rank) > from.relative_rank(self.us, v.max_rank))
            .count() as u32;
        Some(ahead + 1)
    }

    fn disambiguation_level(&self, mv: &Move) -> Disambiguation {
        let v = self.v;
        let n = self.n;
        if mv.is_drop() {
            return Disambiguation::None;
        }
        if matches!(n, Notation::Lan | Notation::Janggi | Notation::ThaiLan) {
            return Disambiguation::Square;
        }
        let board = self.pos.board();
        let Some(pc) = board.get(mv.from) else {
            return Disambiguation::None;
        };
        let pt = pc.piece_type;

        if n == Notation::XiangqiWxf {
            if self.tandem_ordinal(mv.from, pt).is_some() {
                return Disambiguation::File;
            }
            let same_file = board.pieces_of(self.us, pt) & Bitboard::file(mv.from.file(), v.max_rank);
            if same_file.count() == 2 {
                let mut others = same_file;
                others.clear(mv.from);
                if let Some(other) = others.lsb() {
                    let df = mv.to.file() as i32 - mv.from.file() as i32;
                    let dr = mv.to.rank() as i32 - mv.from.rank() as i32;
                    let target = other.offset(df, dr, v.max_file, v.max_rank);
                    if target.map_or(false, |t| v.mobility(self.us, pt).contains(t)) {
                        return Disambiguation::Rank;
                    }
                }
            }
            return Disambiguation::File;
        }

        if matches!(n, Notation::San | Notation::ThaiSan) && pt == PieceType::Pawn {
            if self.pos.is_capture(mv) {
                return Disambiguation::File;
            }
            if matches!(mv.kind, MoveKind::Promotion(_)) && mv.from != mv.to && v.sittuyin_promotion {
                return Disambiguation::Square;
            }
        }

        let gating_type = mv.gating.map(|(pt, _)| pt);
        let others: Bitboard = self
            .legal
            .iter()
            .filter(|m| m.to == mv.to && m.from != mv.from && !m.is_drop() && !m.is_castling())
            .filter(|m| m.gating.map(|(pt, _)| pt) == gating_type)
            .filter(|m| board.get(m.from).map_or(false, |p| p.piece_type == pt))
            .filter(|m| !n.is_shogi() || board.unpromoted(m.from) == board.unpromoted(mv.from))
            .map(|m| m.from)
            .collect();

        if others.is_empty() {
            Disambiguation::None
        } else if n.is_shogi() {
            Disambiguation::Square
        } else if (others & Bitboard::file(mv.from.file(), v.max_rank)).is_empty() {
            Disambiguation::File
        } else if (others & Bitboard::rank(mv.from.rank(), v.max_file)).is_empty() {
            Disambiguation::Rank
        } else {
            Disambiguation::Square
        }
    }

    fn disambiguation(&self, sq: Square, d: Disambiguation) -> String {
        match d {
            Disambiguation::None => String::new(),
            Disambiguation::File => self.file(sq),
            Disambiguation::Rank => self.rank(sq),
            Disambiguation::Square => self.square(sq),
        }
    }

    fn file(&self, sq: Square) -> String {
        let v = self.v;
        let f = sq.file();
        match self.n {
            n if n.is_shogi() => (v.max_file - f + 1).to_string(),
            Notation::Janggi => (f + 1).to_string(),
            Notation::XiangqiWxf => match self.us {
                Side::White => (v.max_file - f + 1).to_string(),
                Side::Black => (f + 1).to_string(),
            },
            Notation::ThaiSan | Notation::ThaiLan => THAI_FILES
                .get(f as usize)
                .map_or_else(|| sq.file_char().to_string(), |s| s.to_string()),
            _ => sq.file_char().to_string(),
        }
    }

    fn rank(&self, sq: Square) -> String {
        let v = self.v;
        let r = sq.rank();
        match self.n {
            Notation::ShogiHosking | Notation::ShogiHodgesNumber => (v.max_rank - r + 1).to_string(),
            Notation::ShogiHodges => ((b'a' + v.max_rank - r) as char).to_string(),
            Notation::Janggi => ((v.max_rank - r + 1) % 10).to_string(),
            Notation::XiangqiWxf => {
                let board = self.pos.board();
                match board.get(sq) {
                    None => (sq.relative_rank(self.us, v.max_rank) + 1).to_string(),
                    Some(p) => {
                        let ahead = board
                            .pieces_of(self.us, p.piece_type)
                            .iter()
                            .filter(|s| s.file() == sq.file())
                            .any(|s| s.relative_rank(self.us, v.max_rank) > sq.relative_rank(self.us, v.max_rank));
                        if ahead { "-".to_string() } else { "+".to_string() }
                    }
                }
            }
            Notation::ThaiSan | Notation::ThaiLan => THAI_DIGITS
                .get(r as usize)
                .map_or_else(|| (r + 1).to_string(), |s| s.to_string()),
            _ => (r + 1).to_string(),
        }
    }

    fn square(&self, sq: Square) -> String {
        match self.n {
            Notation::Janggi => format!("{}{}", self.rank(sq), self.file(sq)),
            _ => format!("{}{}", self.file(sq), self.rank(sq)),
        }
    }
}

/// 泰文棋子名（`promoted` 区分升变的兵）
fn thai_glyph(pt: PieceType, promoted: bool) -> String {
    let glyph = match pt {
        PieceType::King => "ข",
        PieceType::Fers if promoted => "ง",
        PieceType::Fers => "ม็",
        PieceType::Silver => "ค",
        PieceType::Knight => "ม",
        PieceType::Rook => "ร",
        PieceType::Pawn => "บ",
        other => return other.config_name(),
    };
    glyph.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn chess(fen: &str) -> Position {
        Position::from_fen(Arc::new(Variant::chess()), fen, false).unwrap()
    }

    fn san(pos: &Position, uci: &str, n: Notation) -> String {
        let mv = parse_uci(pos, uci).unwrap();
        move_to_san(pos, &mv, n)
    }

    #[test]
    fn test_notation_codes() {
        assert_eq!(Notation::San.code(), 1);
        assert_eq!(Notation::ThaiLan.code(), 9);
        assert_eq!(Notation::from_code(7), Some(Notation::XiangqiWxf));
        assert_eq!(Notation::from_code(10), None);
        assert_eq!(Notation::from_code(-1), None);
    }

    #[test]
    fn test_uci_castling_forms() {
        let pos = chess("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let mv = parse_uci(&pos, "e1g1").unwrap();
        assert!(mv.is_castling());
        assert_eq!(move_to_uci(&pos, &mv), "e1g1");
        // 960 写法也可解析
        assert_eq!(parse_uci(&pos, "e1h1"), Some(mv));
        assert_eq!(san(&pos, "e1c1", Notation::San), "O-O-O");
    }

    #[test]
    fn test_san_disambiguation() {
        let pos = chess("4k3/8/3R4/8/1R3R2/8/3R4/4K3 w - - 0 1");
        assert_eq!(san(&pos, "b4d4", Notation::San), "Rbd4");
        assert_eq!(san(&pos, "f4d4", Notation::San), "Rfd4");
        assert_eq!(san(&pos, "d2d4", Notation::San), "R2d4");
        assert_eq!(san(&pos, "d6d4", Notation::San), "R6d4");
        let pos = chess("4k3/8/3R4/3P4/1RP1PR2/8/3R4/4K3 w - - 0 1");
        assert_eq!(san(&pos, "d2d4", Notation::San), "Rd4");
    }

    #[test]
    fn test_pawn_capture_promotion() {
        let pos = chess("1r2k3/P1P5/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(san(&pos, "c7b8q", Notation::San), "cxb8=Q+");
        assert_eq!(san(&pos, "c7b8q", Notation::Lan), "c7xb8=Q+");
        assert_eq!(move_to_uci(&pos, &parse_uci(&pos, "c7b8n").unwrap()), "c7b8n");
    }

    #[test]
    fn test_checkmate_suffix() {
        let pos = chess("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2");
        assert_eq!(san(&pos, "d8h4", Notation::San), "Qh4#");
        assert_eq!(san(&pos, "d8h4", Notation::Lan), "Qd8-h4#");
    }

    #[test]
    fn test_unknown_uci_rejected() {
        let pos = chess("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert!(parse_uci(&pos, "e2e5").is_none());
        assert!(parse_uci(&pos, "zz").is_none());
    }
}
