//! 棋盘状态

use serde::{Deserialize, Serialize};

use crate::bitboard::Bitboard;
use crate::constants::SQUARE_NB;
use crate::moves::Move;
use crate::piece::{Piece, PieceType, Side, Square, PIECE_TYPE_NB};

/// 棋盘（含障碍与手中棋子）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// 12x10 棋盘，索引为 rank * 12 + file
    squares: Vec<Option<Piece>>,
    /// 将棋式升变棋子的原始类型
    unpromoted: Vec<Option<PieceType>>,
    /// `~` 标记的升变棋子
    promoted: Bitboard,
    walls: Bitboard,
    /// 手中棋子数量 [side][piece_type]
    hands: [Vec<u8>; 2],
    by_side: [Bitboard; 2],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: vec![None; SQUARE_NB],
            unpromoted: vec![None; SQUARE_NB],
            promoted: Bitboard::EMPTY,
            walls: Bitboard::EMPTY,
            hands: [vec![0; PIECE_TYPE_NB], vec![0; PIECE_TYPE_NB]],
            by_side: [Bitboard::EMPTY; 2],
        }
    }

    /// 获取指定格子的棋子
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// 放置棋子（清除原有的升变信息）
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        if let Some(old) = self.squares[sq.index()] {
            self.by_side[old.side.index()].clear(sq);
        }
        self.squares[sq.index()] = piece;
        self.unpromoted[sq.index()] = None;
        self.promoted.clear(sq);
        if let Some(p) = piece {
            self.by_side[p.side.index()].set(sq);
        }
    }

    /// 取走棋子，返回棋子及其升变信息
    pub fn take(&mut self, sq: Square) -> Option<(Piece, Option<PieceType>, bool)> {
        let piece = self.get(sq)?;
        let info = (piece, self.unpromoted[sq.index()], self.promoted.contains(sq));
        self.set(sq, None);
        Some(info)
    }

    /// 放回带升变信息的棋子
    pub fn put(&mut self, sq: Square, piece: Piece, unpromoted: Option<PieceType>, promoted: bool) {
        self.set(sq, Some(piece));
        self.unpromoted[sq.index()] = unpromoted;
        if promoted {
            self.promoted.set(sq);
        }
    }

    /// 移动棋子（不检查规则），升变信息随棋子移动
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let captured = self.get(to);
        if let Some((piece, unpromoted, promoted)) = self.take(from) {
            self.put(to, piece, unpromoted, promoted);
        }
        captured
    }

    /// 将棋式升变的原始类型
    pub fn unpromoted(&self, sq: Square) -> Option<PieceType> {
        self.unpromoted[sq.index()]
    }

    pub fn set_unpromoted(&mut self, sq: Square, pt: Option<PieceType>) {
        self.unpromoted[sq.index()] = pt;
    }

    /// 是否带 `~` 标记
    pub fn is_promoted(&self, sq: Square) -> bool {
        self.promoted.contains(sq)
    }

    pub fn set_promoted(&mut self, sq: Square, promoted: bool) {
        if promoted {
            self.promoted.set(sq);
        } else {
            self.promoted.clear(sq);
        }
    }

    pub fn walls(&self) -> Bitboard {
        self.walls
    }

    pub fn set_wall(&mut self, sq: Square, wall: bool) {
        if wall {
            self.walls.set(sq);
        } else {
            self.walls.clear(sq);
        }
    }

    /// 某方棋子所在格
    pub fn pieces(&self, side: Side) -> Bitboard {
        self.by_side[side.index()]
    }

    /// 某方某类棋子所在格
    pub fn pieces_of(&self, side: Side, pt: PieceType) -> Bitboard {
        self.by_side[side.index()]
            .iter()
            .filter(|sq| self.squares[sq.index()].map(|p| p.piece_type) == Some(pt))
            .collect()
    }

    /// 双方某类棋子所在格
    pub fn pieces_of_type(&self, pt: PieceType) -> Bitboard {
        self.pieces_of(Side::White, pt) | self.pieces_of(Side::Black, pt)
    }

    /// 所有棋子所在格（不含障碍）
    pub fn occupied(&self) -> Bitboard {
        self.by_side[0] | self.by_side[1]
    }

    /// 所有阻挡格（棋子与障碍）
    pub fn blockers(&self) -> Bitboard {
        self.occupied() | self.walls
    }

    pub fn count(&self, side: Side, pt: PieceType) -> u32 {
        self.pieces_of(side, pt).count()
    }

    /// 获取所有棋子
    pub fn all_pieces(&self) -> Vec<(Square, Piece)> {
        self.occupied()
            .iter()
            .filter_map(|sq| self.get(sq).map(|p| (sq, p)))
            .collect()
    }

    /// 查找某方第一个指定类型的棋子
    pub fn find(&self, side: Side, pt: PieceType) -> Option<Square> {
        self.pieces_of(side, pt).lsb()
    }

    pub fn hand(&self, side: Side, pt: PieceType) -> u8 {
        self.hands[side.index()][pt.index()]
    }

    pub fn add_to_hand(&mut self, side: Side, pt: PieceType) {
        let slot = &mut self.hands[side.index()][pt.index()];
        *slot = slot.saturating_add(1);
    }

    pub fn remove_from_hand(&mut self, side: Side, pt: PieceType) {
        let slot = &mut self.hands[side.index()][pt.index()];
        *slot = slot.saturating_sub(1);
    }

    /// 手中棋子总数
    pub fn hand_count(&self, side: Side) -> u32 {
        self.hands[side.index()].iter().map(|&n| n as u32).sum()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

/// 被吃掉的棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captured {
    pub piece: Piece,
    pub square: Square,
    pub unpromoted: Option<PieceType>,
    pub promoted: bool,
}

impl Captured {
    /// 降级后的棋子（送往手中或队友）
    pub fn demoted(&self, pawn: PieceType) -> Piece {
        let piece_type = match (self.unpromoted, self.promoted) {
            (Some(original), _) => original,
            (None, true) => pawn,
            (None, false) => self.piece.piece_type,
        };
        Piece::new(piece_type, self.piece.side)
    }
}

/// 完整的棋盘状态（包含走子方、计数器等）
///
/// 每走一步都会保存一份快照，悔棋直接恢复快照。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    /// 棋盘
    pub board: Board,
    /// 当前走子方
    pub side_to_move: Side,
    /// 仍可易位的车所在格
    pub castling_rights: Bitboard,
    /// 入场格
    pub gates: Bitboard,
    /// 吃过路兵目标格
    pub ep_squares: Bitboard,
    /// 无吃子、无兵步的半回合数
    pub rule50: u32,
    /// 从开局起的半回合数
    pub game_ply: u32,
    /// 从上次停着起的半回合数
    pub plies_from_null: u32,
    /// 剩余将军次数
    pub checks_remaining: [u32; 2],
    /// 数子规则：上限与当前计数
    pub counting_limit: u32,
    pub counting_ply: u32,
    /// 局面哈希
    pub key: u64,
    /// 正在将军走子方的棋子
    pub checkers: Bitboard,
    /// 上一步造成的追捉目标
    pub chased: Bitboard,
    pub last_move: Option<Move>,
    pub captured: Option<Captured>,
    /// 双王照面（韩国象棋）
    pub bikjang: bool,
}

impl BoardState {
    /// 创建空状态
    pub fn empty() -> Self {
        Self {
            board: Board::empty(),
            side_to_move: Side::White,
            castling_rights: Bitboard::EMPTY,
            gates: Bitboard::EMPTY,
            ep_squares: Bitboard::EMPTY,
            rule50: 0,
            game_ply: 0,
            plies_from_null: 0,
            checks_remaining: [0, 0],
            counting_limit: 0,
            counting_ply: 0,
            key: 0,
            checkers: Bitboard::EMPTY,
            chased: Bitboard::EMPTY,
            last_move: None,
            captured: None,
            bikjang: false,
        }
    }

    /// 当前回合数（从 1 开始）
    pub fn fullmove_number(&self) -> u32 {
        1 + self.game_ply / 2
    }

    /// 切换走子方
    pub fn switch_turn(&mut self) {
        self.side_to_move = self.side_to_move.opponent();
        self.game_ply += 1;
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_move_piece_keeps_promotion_info() {
        let mut board = Board::empty();
        let gold = Piece::new(PieceType::Gold, Side::White);
        board.put(sq("c3"), gold, Some(PieceType::ShogiPawn), false);
        let captured = board.move_piece(sq("c3"), sq("c4"));
        assert!(captured.is_none());
        assert!(board.get(sq("c3")).is_none());
        assert_eq!(board.get(sq("c4")), Some(gold));
        assert_eq!(board.unpromoted(sq("c4")), Some(PieceType::ShogiPawn));
        assert!(board.pieces(Side::White).contains(sq("c4")));
        assert!(!board.pieces(Side::White).contains(sq("c3")));
    }

    #[test]
    fn test_overwrite_updates_sides() {
        let mut board = Board::empty();
        board.set(sq("d4"), Some(Piece::new(PieceType::Rook, Side::White)));
        board.set(sq("d4"), Some(Piece::new(PieceType::Rook, Side::Black)));
        assert!(board.pieces(Side::White).is_empty());
        assert_eq!(board.count(Side::Black, PieceType::Rook), 1);
    }

    #[test]
    fn test_hands() {
        let mut board = Board::empty();
        board.add_to_hand(Side::Black, PieceType::Knight);
        board.add_to_hand(Side::Black, PieceType::Knight);
        board.remove_from_hand(Side::Black, PieceType::Knight);
        board.remove_from_hand(Side::White, PieceType::Knight);
        assert_eq!(board.hand(Side::Black, PieceType::Knight), 1);
        assert_eq!(board.hand_count(Side::White), 0);
    }

    #[test]
    fn test_captured_demotion() {
        let queen = Captured {
            piece: Piece::new(PieceType::Queen, Side::White),
            square: sq("a8"),
            unpromoted: None,
            promoted: true,
        };
        assert_eq!(queen.demoted(PieceType::Pawn).piece_type, PieceType::Pawn);
        let tokin = Captured {
            piece: Piece::new(PieceType::Gold, Side::Black),
            square: sq("a7"),
            unpromoted: Some(PieceType::Silver),
            promoted: false,
        };
        assert_eq!(tokin.demoted(PieceType::Pawn).piece_type, PieceType::Silver);
    }

    #[test]
    fn test_fullmove_number() {
        let mut st = BoardState::empty();
        assert_eq!(st.fullmove_number(), 1);
        st.switch_turn();
        assert_eq!(st.fullmove_number(), 1);
        st.switch_turn();
        assert_eq!(st.fullmove_number(), 2);
    }
}
