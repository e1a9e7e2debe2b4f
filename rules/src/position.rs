//! 局面：变体 + 当前状态 + 历史快照

use std::sync::Arc;

use tracing::trace;

use crate::attacks::{adjacent, checkers, reach, royal_squares};
use crate::bitboard::Bitboard;
use crate::board::{Board, BoardState, Captured};
use crate::moves::{Move, MoveKind};
use crate::piece::{Piece, PieceType, Side, Square};
use crate::variant::{CountingRule, EnclosingRule, Variant, WallingRule};
use crate::zobrist::ZobristTable;

/// 局面
#[derive(Debug, Clone)]
pub struct Position {
    variant: Arc<Variant>,
    chess960: bool,
    state: BoardState,
    /// 之前各步的快照，最后一项为上一步之前的状态
    history: Vec<BoardState>,
}

impl Position {
    /// 由状态创建局面（补全哈希与将军信息）
    pub fn from_state(variant: Arc<Variant>, mut state: BoardState, chess960: bool) -> Self {
        state.checkers = checkers(&variant, &state.board, state.side_to_move);
        state.key = compute_key(&variant, &state);
        Self {
            variant,
            chess960,
            state,
            history: Vec::new(),
        }
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn variant_arc(&self) -> Arc<Variant> {
        Arc::clone(&self.variant)
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        &self.state.board
    }

    pub fn history(&self) -> &[BoardState] {
        &self.history
    }

    pub fn chess960(&self) -> bool {
        self.chess960
    }

    pub fn side_to_move(&self) -> Side {
        self.state.side_to_move
    }

    /// 走子方是否被将军
    pub fn in_check(&self) -> bool {
        !self.state.checkers.is_empty()
    }

    /// 上一步是否将军
    pub fn gives_check(&self) -> bool {
        self.in_check()
    }

    /// 执行走法（不检查合法性）
    pub fn do_move(&mut self, mv: Move) {
        let next = self.make(mv);
        trace!(mv = %mv, key = next.key, "do_move");
        let prev = std::mem::replace(&mut self.state, next);
        self.history.push(prev);
    }

    /// 撤销上一步
    pub fn undo_move(&mut self) -> Option<Move> {
        let prev = self.history.pop()?;
        let undone = std::mem::replace(&mut self.state, prev);
        undone.last_move
    }

    /// 计算走法之后的状态（不修改当前局面）
    pub fn make(&self, mv: Move) -> BoardState {
        apply_move(&self.variant, &self.state, mv)
    }

    /// 走法是否吃子
    pub fn is_capture(&self, mv: &Move) -> bool {
        match mv.kind {
            MoveKind::EnPassant => true,
            MoveKind::Drop { .. } | MoveKind::Castling => false,
            _ => {
                !mv.is_pass()
                    && self
                        .board()
                        .get(mv.to)
                        .map_or(false, |p| p.side != self.side_to_move())
            }
        }
    }

    /// 走法移动的棋子
    pub fn moved_piece(&self, mv: &Move) -> Option<Piece> {
        match mv.kind {
            MoveKind::Drop { piece, .. } => Some(Piece::new(piece, self.side_to_move())),
            _ => self.board().get(mv.from),
        }
    }

    /// 某方是否只剩王
    pub fn is_bare(&self, side: Side) -> bool {
        is_bare(&self.variant, &self.state.board, side)
    }
}

/// 某方是否只剩王（含手中无子）
pub fn is_bare(v: &Variant, board: &Board, side: Side) -> bool {
    let pieces = board.pieces(side);
    let royals = royal_squares(v, board, side);
    !royals.is_empty() && pieces == royals && board.hand_count(side) == 0
}

/// 完整计算局面哈希
pub fn compute_key(v: &Variant, st: &BoardState) -> u64 {
    let z = ZobristTable::global();
    let board = &st.board;
    let mut key = 0u64;
    for (sq, piece) in board.all_pieces() {
        key ^= z.piece(piece.side, piece.piece_type, sq);
        if let Some(original) = board.unpromoted(sq) {
            key ^= z.unpromoted(original, sq);
        }
        if board.is_promoted(sq) {
            key ^= z.promoted(sq);
        }
    }
    for sq in board.walls().iter() {
        key ^= z.wall(sq);
    }
    for side in Side::ALL {
        for pt in v.piece_types(side) {
            let n = board.hand(side, pt);
            if n > 0 {
                key ^= z.hand(side, pt, n as usize);
            }
        }
        if v.check_counting {
            key ^= z.checks(side, st.checks_remaining[side.index()]);
        }
    }
    for sq in st.castling_rights.iter() {
        key ^= z.castling(sq);
    }
    for sq in st.gates.iter() {
        key ^= z.gate(sq);
    }
    for sq in st.ep_squares.iter() {
        key ^= z.en_passant(sq);
    }
    if st.side_to_move == Side::Black {
        key ^= z.side_hash();
    }
    key
}

/// 在状态上执行走法，返回新状态
pub fn apply_move(v: &Variant, st: &BoardState, mv: Move) -> BoardState {
    let us = st.side_to_move;
    let them = us.opponent();
    let mut next = st.clone();
    next.last_move = Some(mv);
    next.captured = None;
    next.ep_squares = Bitboard::EMPTY;
    next.chased = Bitboard::EMPTY;
    next.bikjang = false;
    next.rule50 += 1;
    next.plies_from_null += 1;

    let mut promoted_now = false;
    let mut moved_type: Option<PieceType> = None;

    match mv.kind {
        MoveKind::Drop { piece, promoted } => {
            if !v.free_drops {
                next.board.remove_from_hand(us, piece);
            }
            let placed = if promoted {
                v.promoted_type(piece).unwrap_or(piece)
            } else {
                piece
            };
            let original = (placed != piece).then_some(piece);
            next.board.put(mv.to, Piece::new(placed, us), original, false);
            next.rule50 = 0;
            moved_type = Some(placed);
            if v.castling_dropped_piece {
                grant_dropped_castling(v, &mut next, mv.to, us);
            }
            flip_enclosed(v, &mut next.board, mv.to, us);
        }
        MoveKind::Castling => {
            let (king_from, rook_from) = (mv.from, mv.to);
            let (king_to, rook_to) = castling_destinations(v, king_from, rook_from);
            let king = next.board.take(king_from);
            let rook = next.board.take(rook_from);
            if let Some((p, u, pr)) = king {
                next.board.put(king_to, p, u, pr);
            }
            if let Some((p, u, pr)) = rook {
                next.board.put(rook_to, p, u, pr);
            }
            next.castling_rights &= !Bitboard::rank(king_from.rank(), v.max_file);
            next.gates.clear(king_from);
            next.gates.clear(rook_from);
            moved_type = Some(v.castling_king_piece);
        }
        _ if mv.is_pass() => {}
        _ => {
            let piece = next.board.get(mv.from);
            moved_type = piece.map(|p| p.piece_type);
            let cap_sq = if mv.kind == MoveKind::EnPassant {
                st.last_move
                    .map(|m| m.to)
                    .unwrap_or_else(|| Square::new_unchecked(mv.to.file(), mv.from.rank()))
            } else {
                mv.to
            };
            let victim = next
                .board
                .get(cap_sq)
                .filter(|p| p.side == them)
                .and_then(|_| next.board.take(cap_sq));
            if let Some((piece, unpromoted, promoted)) = victim {
                let captured = Captured {
                    piece,
                    square: cap_sq,
                    unpromoted,
                    promoted,
                };
                if v.captures_to_hand {
                    let demoted = captured.demoted(v.main_promotion_pawn_type(them));
                    next.board.add_to_hand(us, demoted.piece_type);
                }
                next.castling_rights.clear(cap_sq);
                next.gates.clear(cap_sq);
                next.captured = Some(captured);
                next.rule50 = 0;
            }
            next.board.move_piece(mv.from, mv.to);
            next.gates.clear(mv.from);

            match mv.kind {
                MoveKind::Promotion(pt) => {
                    next.board.put(mv.to, Piece::new(pt, us), None, true);
                    promoted_now = true;
                    next.rule50 = 0;
                }
                MoveKind::PiecePromotion => {
                    if let Some(p) = piece {
                        if let Some(pt) = v.promoted_type(p.piece_type) {
                            let original = st.board.unpromoted(mv.from).unwrap_or(p.piece_type);
                            next.board.put(mv.to, Piece::new(pt, us), Some(original), false);
                            promoted_now = true;
                        }
                    }
                }
                MoveKind::PieceDemotion => {
                    if let Some(original) = st.board.unpromoted(mv.from) {
                        next.board.put(mv.to, Piece::new(original, us), None, false);
                    }
                }
                _ => {}
            }

            if let Some(p) = piece {
                update_after_board_move(v, &mut next, mv, p);
            }

            if v.blast_on_capture && next.captured.is_some() {
                blast(v, &mut next, mv.to);
            }
            flip_enclosed(v, &mut next.board, mv.to, us);
        }
    }

    if let Some((pt, sq)) = mv.gating {
        next.board.remove_from_hand(us, pt);
        next.board.set(sq, Some(Piece::new(pt, us)));
        next.gates.clear(sq);
    }
    // 手中无子后入场格全部失效
    if v.gating && next.board.hand_count(us) == 0 && !v.captures_to_hand {
        next.gates &= !Bitboard::rank(v.castling_rank_of(us), v.max_file);
    }

    if v.walling_rule == WallingRule::Duck {
        for sq in next.board.walls().iter() {
            next.board.set_wall(sq, false);
        }
    }
    if let Some(wall) = mv.wall {
        next.board.set_wall(wall, true);
    }

    next.switch_turn();
    next.checkers = checkers(v, &next.board, them);

    if v.check_counting && !next.checkers.is_empty() {
        let left = &mut next.checks_remaining[us.index()];
        *left = left.saturating_sub(1);
    }

    if v.cambodian_moves {
        update_cambodian_gates(&mut next, mv, moved_type);
    }

    if v.bikjang {
        next.bikjang = kings_facing(v, &next.board);
    }

    if v.counting_rule != CountingRule::None {
        update_counting(v, &mut next, promoted_now);
    }

    if v.chasing_rule != crate::variant::ChasingRule::None {
        next.chased = crate::chase::chased(v, st, &next);
    }

    next.key = compute_key(v, &next);
    next
}

/// 易位后王与车的落点
pub fn castling_destinations(v: &Variant, king_from: Square, rook_from: Square) -> (Square, Square) {
    let rank = king_from.rank();
    let kingside = rook_from.file() > king_from.file();
    let king_file = if kingside {
        v.castling_kingside_file
    } else {
        v.castling_queenside_file
    }
    .min(v.max_file);
    // 车落在王内侧；王在边线时车只能落在另一侧
    let rook_file = match (kingside, king_file) {
        (true, 0) => 1,
        (true, f) => f - 1,
        (false, f) if f == v.max_file => f.saturating_sub(1),
        (false, f) => f + 1,
    };
    (
        Square::new_unchecked(king_file, rank),
        Square::new_unchecked(rook_file, rank),
    )
}

/// 普通走子后的易位权、吃过路兵与五十步计数
fn update_after_board_move(v: &Variant, next: &mut BoardState, mv: Move, piece: Piece) {
    let us = piece.side;
    if piece.piece_type == v.castling_king_piece {
        next.castling_rights &= !Bitboard::rank(v.castling_rank_of(us), v.max_file);
    }
    next.castling_rights.clear(mv.from);

    if !v.is_promotion_pawn(us, piece.piece_type) {
        return;
    }
    let forward = mv.to.relative_rank(us, v.max_rank) > mv.from.relative_rank(us, v.max_rank);
    let reversible = v
        .movement(piece.piece_type)
        .map_or(false, |m| m.has_quiet_backward());
    if forward && !reversible {
        next.rule50 = 0;
    }

    let dr = (mv.to.rank() as i32 - mv.from.rank() as i32).abs();
    if v.en_passant && mv.kind == MoveKind::Normal && mv.to.file() == mv.from.file() && dr >= 2 {
        let between = Bitboard::between(mv.from, mv.to);
        let them = us.opponent();
        let capturable: Bitboard = between
            .iter()
            .filter(|sq| {
                next.board.pieces(them).iter().any(|from| {
                    next.board.get(from).map_or(false, |p| {
                        v.is_promotion_pawn(them, p.piece_type)
                            && reach(v, &next.board, from, p, false).capture.contains(*sq)
                    })
                })
            })
            .collect();
        next.ep_squares = capturable;
    }
}

/// 王或车打入初始格时获得易位权
fn grant_dropped_castling(v: &Variant, next: &mut BoardState, to: Square, us: Side) {
    let rank = v.castling_rank_of(us);
    let king_sq = Square::new_unchecked((v.max_file + 1) / 2, rank);
    if next.board.get(king_sq) != Some(Piece::new(v.castling_king_piece, us)) {
        return;
    }
    for file in [0, v.max_file] {
        let sq = Square::new_unchecked(file, rank);
        let is_rook = next
            .board
            .get(sq)
            .map_or(false, |p| p.side == us && v.castling_rook_pieces.contains(&p.piece_type));
        if is_rook && (to == sq || to == king_sq) {
            next.castling_rights.set(sq);
        }
    }
}

/// 爆炸：吃子后清除落点及周围的非兵棋子
fn blast(v: &Variant, next: &mut BoardState, at: Square) {
    let area = adjacent(v, at) | Bitboard::from_square(at);
    for sq in area.iter() {
        let Some(p) = next.board.get(sq) else { continue };
        if sq != at && v.is_promotion_pawn(p.side, p.piece_type) {
            continue;
        }
        next.board.set(sq, None);
        next.castling_rights.clear(sq);
        next.gates.clear(sq);
    }
}

/// 夹子翻转（黑白棋沿八方向，同化棋翻转相邻）
fn flip_enclosed(v: &Variant, board: &mut Board, at: Square, us: Side) {
    let them = us.opponent();
    match v.flip_enclosed_pieces {
        EnclosingRule::None => {}
        EnclosingRule::Ataxx => {
            for sq in adjacent(v, at).iter() {
                if let Some(p) = board.get(sq).filter(|p| p.side == them) {
                    board.set(sq, Some(Piece::new(p.piece_type, us)));
                }
            }
        }
        EnclosingRule::Reversi => {
            for sq in enclosed_by(v, board, at, us).iter() {
                if let Some(p) = board.get(sq) {
                    board.set(sq, Some(Piece::new(p.piece_type, us)));
                }
            }
        }
    }
}

/// 在 `at` 落子后被夹住的对方棋子
pub fn enclosed_by(v: &Variant, board: &Board, at: Square, us: Side) -> Bitboard {
    let mut out = Bitboard::EMPTY;
    for df in -1..=1 {
        for dr in -1..=1 {
            if df == 0 && dr == 0 {
                continue;
            }
            let mut line = Bitboard::EMPTY;
            let mut sq = at;
            while let Some(next) = sq.offset(df, dr, v.max_file, v.max_rank) {
                match board.get(next) {
                    Some(p) if p.side != us => line.set(next),
                    Some(_) => {
                        out |= line;
                        break;
                    }
                    None => break,
                }
                sq = next;
            }
        }
    }
    out
}

/// 柬埔寨象棋：王和后的首步特权
fn update_cambodian_gates(next: &mut BoardState, mv: Move, moved_type: Option<PieceType>) {
    let defender = next.side_to_move;
    let Some(king) = next.board.find(defender, PieceType::King) else {
        return;
    };
    if !next.gates.contains(king) {
        return;
    }
    // 被将军或被车瞄准的王失去跳步
    let aimed = moved_type == Some(PieceType::Rook)
        && (mv.to.file() == king.file() || mv.to.rank() == king.rank());
    if aimed || !next.checkers.is_empty() {
        next.gates.clear(king);
    }
}

/// 两王照面（同列且中间无子）
pub fn kings_facing(v: &Variant, board: &Board) -> bool {
    let (Some(a), Some(b)) = (
        board.find(Side::White, PieceType::King),
        board.find(Side::Black, PieceType::King),
    ) else {
        return false;
    };
    a.file() == b.file() && (Bitboard::between(a, b) & board.blockers()).is_empty() && v.bikjang
}

/// 数子规则的计数值（半回合数的一半）
fn counting_value(v: &Variant, board: &Board) -> u32 {
    let has_pawns = !board.pieces_of_type(PieceType::Pawn).is_empty();
    let bare: Vec<Side> = Side::ALL
        .into_iter()
        .filter(|s| is_bare(v, board, *s))
        .collect();
    if has_pawns {
        return 0;
    }
    let strong = match bare.as_slice() {
        [weak] => weak.opponent(),
        [] => return if v.counting_rule == CountingRule::Asean { 0 } else { 64 },
        _ => return 0,
    };
    let rooks = board.count(strong, PieceType::Rook);
    let khons = board.count(strong, PieceType::Silver);
    let knights = board.count(strong, PieceType::Knight);
    if v.counting_rule == CountingRule::Asean {
        return if rooks > 0 {
            16
        } else if khons > 0 {
            44
        } else if knights > 0 {
            64
        } else {
            0
        };
    }
    if rooks > 1 {
        8
    } else if rooks == 1 {
        16
    } else if khons > 1 {
        22
    } else if knights > 1 {
        32
    } else if khons == 1 {
        44
    } else {
        64
    }
}

/// 走子后更新数子计数
fn update_counting(v: &Variant, next: &mut BoardState, promoted_now: bool) {
    if next.counting_limit > 0 {
        next.counting_ply += 1;
    }
    let board = &next.board;
    let bare_side = Side::ALL.into_iter().find(|s| is_bare(v, board, *s));
    let no_pawns = board.pieces_of_type(PieceType::Pawn).is_empty();
    let triggered = (bare_side.is_some()
        && (next.counting_limit == 0 || next.captured.is_some() || promoted_now))
        || (next.counting_limit == 0 && no_pawns);
    if !triggered {
        return;
    }
    let value = counting_value(v, board);
    next.counting_limit = match (v.counting_rule, value) {
        (_, 0) => 0,
        (CountingRule::Cambodian, n) => 2 * n - 2,
        (_, n) => 2 * n,
    };
    next.counting_ply = match bare_side {
        Some(bare) if v.counting_rule != CountingRule::Asean => {
            let all = board.occupied().count();
            2 * all - u32::from(bare != next.side_to_move)
        }
        _ => 0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn chess_position(pieces: &[(&str, PieceType, Side)], stm: Side) -> Position {
        let mut st = BoardState::empty();
        for (s, pt, side) in pieces {
            st.board.set(sq(s), Some(Piece::new(*pt, *side)));
        }
        st.side_to_move = stm;
        Position::from_state(Arc::new(Variant::chess()), st, false)
    }

    #[test]
    fn test_do_and_undo() {
        let mut pos = chess_position(
            &[
                ("e1", PieceType::King, Side::White),
                ("e8", PieceType::King, Side::Black),
                ("a2", PieceType::Pawn, Side::White),
            ],
            Side::White,
        );
        let key = pos.state().key;
        pos.do_move(Move::new(sq("a2"), sq("a4")));
        assert_eq!(pos.side_to_move(), Side::Black);
        assert!(pos.board().get(sq("a4")).is_some());
        assert_eq!(pos.state().rule50, 0);
        assert_ne!(pos.state().key, key);
        assert_eq!(pos.undo_move(), Some(Move::new(sq("a2"), sq("a4"))));
        assert_eq!(pos.state().key, key);
        assert!(pos.undo_move().is_none());
    }

    #[test]
    fn test_capture_clears_rule50() {
        let mut pos = chess_position(
            &[
                ("e1", PieceType::King, Side::White),
                ("e8", PieceType::King, Side::Black),
                ("d1", PieceType::Rook, Side::White),
                ("d7", PieceType::Knight, Side::Black),
            ],
            Side::White,
        );
        let mv = Move::new(sq("d1"), sq("d7"));
        assert!(pos.is_capture(&mv));
        pos.do_move(mv);
        assert_eq!(pos.state().captured.map(|c| c.piece.piece_type), Some(PieceType::Knight));
        assert!(pos.in_check() == false);
    }

    #[test]
    fn test_check_after_move() {
        let mut pos = chess_position(
            &[
                ("e1", PieceType::King, Side::White),
                ("e8", PieceType::King, Side::Black),
                ("a1", PieceType::Rook, Side::White),
            ],
            Side::White,
        );
        pos.do_move(Move::new(sq("a1"), sq("a8")));
        assert!(pos.gives_check());
    }

    #[test]
    fn test_castling_destinations() {
        let v = Variant::chess();
        let (k, r) = castling_destinations(&v, sq("e1"), sq("h1"));
        assert_eq!((k.to_string(), r.to_string()), ("g1".to_string(), "f1".to_string()));
        let (k, r) = castling_destinations(&v, sq("c1"), sq("a1"));
        assert_eq!((k.to_string(), r.to_string()), ("c1".to_string(), "d1".to_string()));
    }

    #[test]
    fn test_castling_destinations_stay_on_board() {
        let mut v = Variant::chess();
        v.castling_kingside_file = 0;
        v.castling_queenside_file = 7;
        let (k, r) = castling_destinations(&v, sq("e1"), sq("h1"));
        assert_eq!((k, r), (sq("a1"), sq("b1")));
        let (k, r) = castling_destinations(&v, sq("e8"), sq("a8"));
        assert_eq!((k, r), (sq("h8"), sq("g8")));
    }

    #[test]
    fn test_large_hands_hash_apart() {
        let mut v = Variant::chess();
        v.piece_drops = true;
        v.captures_to_hand = true;
        let mut st = BoardState::empty();
        for _ in 0..16 {
            st.board.add_to_hand(Side::White, PieceType::Pawn);
        }
        let sixteen = compute_key(&v, &st);
        st.board.add_to_hand(Side::White, PieceType::Pawn);
        assert_ne!(compute_key(&v, &st), sixteen);
    }

    #[test]
    fn test_enclosed_lines() {
        let v = Variant::chess();
        let mut board = Board::empty();
        board.set(sq("d4"), Some(Piece::new(PieceType::Pawn, Side::Black)));
        board.set(sq("e4"), Some(Piece::new(PieceType::Pawn, Side::Black)));
        board.set(sq("f4"), Some(Piece::new(PieceType::Pawn, Side::White)));
        board.set(sq("c5"), Some(Piece::new(PieceType::Pawn, Side::Black)));
        let flips = enclosed_by(&v, &board, sq("c4"), Side::White);
        assert_eq!(flips.count(), 2);
        assert!(flips.contains(sq("d4")) && flips.contains(sq("e4")));
    }
}
