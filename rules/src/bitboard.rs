//! 128 位棋盘位集

use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use serde::{Deserialize, Serialize};

use crate::constants::FILE_NB;
use crate::piece::Square;

/// 位集，第 n 位对应索引为 n 的格子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bitboard(pub u128);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);

    /// 单个格子
    pub fn from_square(sq: Square) -> Self {
        Bitboard(1u128 << sq.index())
    }

    /// 整列（限定在棋盘行数内）
    pub fn file(file: u8, max_rank: u8) -> Self {
        let mut bb = Bitboard::EMPTY;
        for r in 0..=max_rank {
            bb.set(Square::new_unchecked(file, r));
        }
        bb
    }

    /// 整行（限定在棋盘列数内）
    pub fn rank(rank: u8, max_file: u8) -> Self {
        let mut bb = Bitboard::EMPTY;
        for f in 0..=max_file {
            bb.set(Square::new_unchecked(f, rank));
        }
        bb
    }

    /// 整个棋盘
    pub fn board(max_file: u8, max_rank: u8) -> Self {
        let mut bb = Bitboard::EMPTY;
        for r in 0..=max_rank {
            bb |= Bitboard::rank(r, max_file);
        }
        bb
    }

    pub fn contains(&self, sq: Square) -> bool {
        self.0 & (1u128 << sq.index()) != 0
    }

    pub fn set(&mut self, sq: Square) {
        self.0 |= 1u128 << sq.index();
    }

    pub fn clear(&mut self, sq: Square) {
        self.0 &= !(1u128 << sq.index());
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn more_than_one(&self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    /// 最低位的格子
    pub fn lsb(&self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Square::from_index(self.0.trailing_zeros() as usize)
        }
    }

    /// 按索引升序遍历
    pub fn iter(&self) -> BitboardIter {
        BitboardIter(self.0)
    }

    /// 按行数翻转（用于黑方相对区域）
    pub fn flip_ranks(&self, max_rank: u8) -> Self {
        let mut bb = Bitboard::EMPTY;
        for sq in self.iter() {
            bb.set(Square::new_unchecked(sq.file(), max_rank - sq.rank()));
        }
        bb
    }

    /// 两格之间的格子（同行、同列或同斜线，不含端点）
    pub fn between(a: Square, b: Square) -> Self {
        let df = b.file() as i32 - a.file() as i32;
        let dr = b.rank() as i32 - a.rank() as i32;
        if !(df == 0 || dr == 0 || df.abs() == dr.abs()) {
            return Bitboard::EMPTY;
        }
        let (sf, sr) = (df.signum(), dr.signum());
        let mut bb = Bitboard::EMPTY;
        let mut f = a.file() as i32 + sf;
        let mut r = a.rank() as i32 + sr;
        while (f, r) != (b.file() as i32, b.rank() as i32) {
            bb.set(Square::new_unchecked(f as u8, r as u8));
            f += sf;
            r += sr;
        }
        bb
    }

    /// 穿过两格的整条直线（同行、同列或同斜线）
    pub fn line(a: Square, b: Square, max_file: u8, max_rank: u8) -> Self {
        let df = b.file() as i32 - a.file() as i32;
        let dr = b.rank() as i32 - a.rank() as i32;
        if (df == 0 && dr == 0) || !(df == 0 || dr == 0 || df.abs() == dr.abs()) {
            return Bitboard::EMPTY;
        }
        let (sf, sr) = (df.signum(), dr.signum());
        let mut bb = Bitboard::from_square(a);
        for dir in [1, -1] {
            let mut sq = a;
            while let Some(next) = sq.offset(sf * dir, sr * dir, max_file, max_rank) {
                bb.set(next);
                sq = next;
            }
        }
        bb
    }
}

/// 升序迭代器
pub struct BitboardIter(u128);

impl Iterator for BitboardIter {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Square::from_index(index)
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        let mut bb = Bitboard::EMPTY;
        for sq in iter {
            bb.set(sq);
        }
        bb
    }
}

impl BitOr for Bitboard {
    type Output = Bitboard;
    fn bitor(self, rhs: Bitboard) -> Bitboard {
        Bitboard(self.0 | rhs.0)
    }
}

impl BitAnd for Bitboard {
    type Output = Bitboard;
    fn bitand(self, rhs: Bitboard) -> Bitboard {
        Bitboard(self.0 & rhs.0)
    }
}

impl BitXor for Bitboard {
    type Output = Bitboard;
    fn bitxor(self, rhs: Bitboard) -> Bitboard {
        Bitboard(self.0 ^ rhs.0)
    }
}

impl Not for Bitboard {
    type Output = Bitboard;
    fn not(self) -> Bitboard {
        // 只保留 12x10 范围内的位
        Bitboard(!self.0 & ((1u128 << (FILE_NB * crate::constants::RANK_NB)) - 1))
    }
}

impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Bitboard) {
        self.0 |= rhs.0;
    }
}

impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Bitboard) {
        self.0 &= rhs.0;
    }
}

impl BitXorAssign for Bitboard {
    fn bitxor_assign(&mut self, rhs: Bitboard) {
        self.0 ^= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_set_and_iterate() {
        let mut bb = Bitboard::EMPTY;
        bb.set(sq("h1"));
        bb.set(sq("a2"));
        bb.set(sq("l10"));
        let squares: Vec<String> = bb.iter().map(|s| s.to_string()).collect();
        assert_eq!(squares, vec!["h1", "a2", "l10"]);
        assert_eq!(bb.count(), 3);
        assert!(bb.more_than_one());
        bb.clear(sq("a2"));
        assert!(!bb.contains(sq("a2")));
    }

    #[test]
    fn test_regions() {
        assert_eq!(Bitboard::rank(0, 7).count(), 8);
        assert_eq!(Bitboard::file(0, 9).count(), 10);
        assert_eq!(Bitboard::board(8, 9).count(), 90);
        let flipped = Bitboard::rank(1, 7).flip_ranks(7);
        assert!(flipped.contains(sq("c7")));
    }

    #[test]
    fn test_between_and_line() {
        let b = Bitboard::between(sq("a1"), sq("d4"));
        assert_eq!(b.count(), 2);
        assert!(b.contains(sq("b2")) && b.contains(sq("c3")));
        assert!(Bitboard::between(sq("a1"), sq("b3")).is_empty());
        let l = Bitboard::line(sq("b1"), sq("b2"), 7, 7);
        assert_eq!(l.count(), 8);
    }

    #[test]
    fn test_not_stays_on_board() {
        let all = !Bitboard::EMPTY;
        assert_eq!(all.count(), 120);
    }
}
