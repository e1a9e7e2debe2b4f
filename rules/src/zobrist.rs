//! Zobrist 哈希
//!
//! 用于重复局面检测。表在首次使用时按固定种子生成。

use std::sync::OnceLock;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::SQUARE_NB;
use crate::piece::{PieceType, Side, Square, PIECE_TYPE_NB};

/// 每种计数一项；手中同类棋子不会多于棋盘格数
const HAND_SLOTS: usize = SQUARE_NB + 1;

/// Zobrist 哈希表
pub struct ZobristTable {
    /// [side][piece_type][square]
    pieces: Vec<u64>,
    /// 将棋式升变棋子的原始类型 [piece_type][square]
    unpromoted: Vec<u64>,
    /// `~` 标记 [square]
    promoted: Vec<u64>,
    walls: Vec<u64>,
    /// [side][piece_type][count]
    hands: Vec<u64>,
    castling: Vec<u64>,
    gates: Vec<u64>,
    en_passant: Vec<u64>,
    /// [side][remaining]
    checks: Vec<u64>,
    side_to_move: u64,
}

impl ZobristTable {
    /// 创建新的 Zobrist 表（固定种子保证确定性）
    pub fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(0xDEADBEEF_CAFE_1234);
        let mut fill = |n: usize| (0..n).map(|_| rng.gen::<u64>()).collect::<Vec<u64>>();
        Self {
            pieces: fill(2 * PIECE_TYPE_NB * SQUARE_NB),
            unpromoted: fill(PIECE_TYPE_NB * SQUARE_NB),
            promoted: fill(SQUARE_NB),
            walls: fill(SQUARE_NB),
            hands: fill(2 * PIECE_TYPE_NB * HAND_SLOTS),
            castling: fill(SQUARE_NB),
            gates: fill(SQUARE_NB),
            en_passant: fill(SQUARE_NB),
            checks: fill(2 * HAND_SLOTS),
            side_to_move: fill(1)[0],
        }
    }

    /// 全局共享的表
    pub fn global() -> &'static ZobristTable {
        static TABLE: OnceLock<ZobristTable> = OnceLock::new();
        TABLE.get_or_init(ZobristTable::new)
    }

    #[inline]
    pub fn piece(&self, side: Side, pt: PieceType, sq: Square) -> u64 {
        self.pieces[(side.index() * PIECE_TYPE_NB + pt.index()) * SQUARE_NB + sq.index()]
    }

    #[inline]
    pub fn unpromoted(&self, pt: PieceType, sq: Square) -> u64 {
        self.unpromoted[pt.index() * SQUARE_NB + sq.index()]
    }

    #[inline]
    pub fn promoted(&self, sq: Square) -> u64 {
        self.promoted[sq.index()]
    }

    #[inline]
    pub fn wall(&self, sq: Square) -> u64 {
        self.walls[sq.index()]
    }

    #[inline]
    pub fn hand(&self, side: Side, pt: PieceType, count: usize) -> u64 {
        let slot = count.min(HAND_SLOTS - 1);
        self.hands[(side.index() * PIECE_TYPE_NB + pt.index()) * HAND_SLOTS + slot]
    }

    #[inline]
    pub fn castling(&self, sq: Square) -> u64 {
        self.castling[sq.index()]
    }

    #[inline]
    pub fn gate(&self, sq: Square) -> u64 {
        self.gates[sq.index()]
    }

    #[inline]
    pub fn en_passant(&self, sq: Square) -> u64 {
        self.en_passant[sq.index()]
    }

    #[inline]
    pub fn checks(&self, side: Side, remaining: u32) -> u64 {
        self.checks[side.index() * HAND_SLOTS + (remaining as usize).min(HAND_SLOTS - 1)]
    }

    /// 走子方切换的哈希值
    #[inline]
    pub fn side_hash(&self) -> u64 {
        self.side_to_move
    }
}

impl Default for ZobristTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zobrist_deterministic() {
        let a = ZobristTable::new();
        let b = ZobristTable::new();
        let sq = Square::parse("e4").unwrap();
        assert_eq!(
            a.piece(Side::White, PieceType::Knight, sq),
            b.piece(Side::White, PieceType::Knight, sq)
        );
        assert_eq!(a.side_hash(), b.side_hash());
    }

    #[test]
    fn test_zobrist_keys_differ() {
        let t = ZobristTable::global();
        let sq = Square::parse("e4").unwrap();
        assert_ne!(
            t.piece(Side::White, PieceType::Knight, sq),
            t.piece(Side::Black, PieceType::Knight, sq)
        );
        assert_ne!(t.hand(Side::White, PieceType::Pawn, 1), t.hand(Side::White, PieceType::Pawn, 2));
        assert_ne!(t.hand(Side::White, PieceType::Pawn, 40), t.hand(Side::White, PieceType::Pawn, 15));
        assert_ne!(t.hand(Side::Black, PieceType::Pawn, 17), t.hand(Side::Black, PieceType::Pawn, 16));
        assert_ne!(t.checks(Side::White, 20), t.checks(Side::White, 15));
    }
}
