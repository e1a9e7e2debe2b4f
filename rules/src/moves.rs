//! 走法表示

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::piece::{PieceType, Square};

/// 走法类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    /// 普通走法（含停着：起止格相同）
    Normal,
    /// 易位，`to` 为车所在格
    Castling,
    EnPassant,
    /// 兵升变为指定类型
    Promotion(PieceType),
    /// 将棋式 `+` 升变
    PiecePromotion,
    /// 将棋式 `-` 降变
    PieceDemotion,
    /// 从手中打入；`promoted` 为以升变面打入
    Drop { piece: PieceType, promoted: bool },
}

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub kind: MoveKind,
    /// 入场的棋子及其落点
    pub gating: Option<(PieceType, Square)>,
    /// 鸭子的新位置
    pub wall: Option<Square>,
}

impl Move {
    /// 创建普通走法
    pub fn new(from: Square, to: Square) -> Self {
        Self::with_kind(from, to, MoveKind::Normal)
    }

    pub fn with_kind(from: Square, to: Square, kind: MoveKind) -> Self {
        Self {
            from,
            to,
            kind,
            gating: None,
            wall: None,
        }
    }

    /// 创建打入走法
    pub fn drop(piece: PieceType, to: Square, promoted: bool) -> Self {
        Self::with_kind(to, to, MoveKind::Drop { piece, promoted })
    }

    pub fn is_drop(&self) -> bool {
        matches!(self.kind, MoveKind::Drop { .. })
    }

    pub fn is_castling(&self) -> bool {
        self.kind == MoveKind::Castling
    }

    /// 停着（原地不动）
    pub fn is_pass(&self) -> bool {
        self.kind == MoveKind::Normal && self.from == self.to
    }

    /// 是否为任意形式的升变
    pub fn is_promotion(&self) -> bool {
        matches!(self.kind, MoveKind::Promotion(_) | MoveKind::PiecePromotion)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({:?})", self.from, self.to, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_pass_and_drop() {
        let pass = Move::new(sq("e1"), sq("e1"));
        assert!(pass.is_pass());
        let drop = Move::drop(PieceType::Pawn, sq("e4"), false);
        assert!(drop.is_drop());
        assert!(!drop.is_pass());
        assert_eq!(drop.from, drop.to);
    }

    #[test]
    fn test_promotion_kinds() {
        assert!(Move::with_kind(sq("a7"), sq("a8"), MoveKind::Promotion(PieceType::Queen)).is_promotion());
        assert!(Move::with_kind(sq("a6"), sq("a7"), MoveKind::PiecePromotion).is_promotion());
        assert!(!Move::with_kind(sq("a6"), sq("a7"), MoveKind::PieceDemotion).is_promotion());
    }
}
