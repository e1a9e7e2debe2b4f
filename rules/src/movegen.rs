//! 走法生成和验证

use std::cmp::Reverse;

use crate::attacks::{adjacent, attackers_to, checkers, reach, royal_squares};
use crate::bitboard::Bitboard;
use crate::board::{Board, BoardState};
use crate::moves::{Move, MoveKind};
use crate::piece::{Piece, PieceType, Side, Square, PIECE_TYPE_NB};
use crate::position::{castling_destinations, enclosed_by, Position};
use crate::variant::{EnclosingRule, Variant, WallingRule};

/// 走法生成器
pub struct MoveGenerator;

impl MoveGenerator {
    /// 生成走子方的所有伪合法走法（不考虑将军）
    pub fn generate_pseudo_legal(pos: &Position) -> Vec<Move> {
        let v = pos.variant();
        let st = pos.state();
        let us = st.side_to_move;
        let mut moves = Vec::with_capacity(64);

        let hand_types = Self::hand_types(v, &st.board, us);
        if v.must_drop && !hand_types.is_empty() {
            Self::generate_drops(v, st, &hand_types, &mut moves);
            return moves;
        }

        for from in st.board.pieces(us).iter() {
            let Some(piece) = st.board.get(from) else { continue };
            let start = moves.len();
            Self::generate_piece_moves(v, st, from, piece, &mut moves);
            if v.gating && st.gates.contains(from) {
                Self::add_gating(v, st, from, start, &mut moves);
            }
        }

        if v.piece_drops {
            Self::generate_drops(v, st, &hand_types, &mut moves);
        }
        if v.castling {
            Self::generate_castling(v, st, &mut moves);
        }
        if v.pass {
            moves.push(Self::pass_move(v, &st.board, us));
        }
        moves
    }

    /// 生成走子方的所有合法走法（已排序）
    pub fn generate_legal(pos: &Position) -> Vec<Move> {
        Self::legal_with(pos, true)
    }

    /// 棋谱中可以出现的走法：合法走法外加只因打步诘被排除的兵打入
    ///
    /// 打步诘由裁决判负，回放棋谱时仍需接受这一步。
    pub fn generate_playable(pos: &Position) -> Vec<Move> {
        Self::legal_with(pos, false)
    }

    fn legal_with(pos: &Position, drop_mate_rule: bool) -> Vec<Move> {
        let v = pos.variant();
        let mut legal: Vec<Move> = Self::generate_pseudo_legal(pos)
            .into_iter()
            .filter(|mv| Self::is_legal(pos, mv))
            .collect();

        if drop_mate_rule && v.shogi_pawn_drop_mate_illegal {
            legal.retain(|mv| !Self::is_pawn_drop_mate(pos, mv));
        }
        if v.must_capture && legal.iter().any(|mv| pos.is_capture(mv)) {
            legal.retain(|mv| pos.is_capture(mv));
        }
        if v.pass_on_stalemate && legal.is_empty() {
            let pass = Self::pass_move(v, pos.board(), pos.side_to_move());
            if Self::is_legal(pos, &pass) {
                legal.push(pass);
            }
        }
        if v.walling_rule == WallingRule::Duck {
            legal = legal
                .into_iter()
                .flat_map(|mv| Self::duck_placements(pos, mv))
                .collect();
        }

        let us = pos.side_to_move();
        legal.sort_by_key(|mv| Self::sort_key(v, us, mv));
        legal.dedup();
        legal
    }

    /// 走法是否合法（走法须来自伪合法生成）
    pub fn is_legal(pos: &Position, mv: &Move) -> bool {
        let v = pos.variant();
        let st = pos.state();
        let us = st.side_to_move;
        let them = us.opponent();
        let next = pos.make(*mv);
        let mut board = next.board.clone();
        if v.walling_rule == WallingRule::Duck {
            for sq in board.walls().iter() {
                board.set_wall(sq, false);
            }
        }

        let royals_before = royal_squares(v, &st.board, us);
        if royal_squares(v, &board, us).is_empty() {
            return royals_before.is_empty();
        }
        if v.blast_on_capture
            && royal_squares(v, &board, them).is_empty()
            && !royal_squares(v, &st.board, them).is_empty()
        {
            return true;
        }
        if !checkers(v, &board, us).is_empty() {
            return false;
        }
        if v.makpong_rule && !st.checkers.is_empty() && !mv.is_drop() {
            let moved_royal = st
                .board
                .get(mv.from)
                .map_or(false, |p| v.is_royal(p.piece_type));
            if moved_royal && !mv.is_pass() {
                return false;
            }
        }
        if !v.checking && !next.checkers.is_empty() {
            return false;
        }
        true
    }

    /// 打兵将死
    fn is_pawn_drop_mate(pos: &Position, mv: &Move) -> bool {
        let v = pos.variant();
        let MoveKind::Drop { piece, .. } = mv.kind else {
            return false;
        };
        if piece != PieceType::ShogiPawn {
            return false;
        }
        let next = pos.make(*mv);
        if next.checkers.is_empty() {
            return false;
        }
        let reply = Position::from_state(pos.variant_arc(), next, pos.chess960());
        Self::legal_with(&reply, false).is_empty()
    }

    /// 某方手中可打入的棋子类型（降序）
    fn hand_types(v: &Variant, board: &Board, side: Side) -> Vec<PieceType> {
        let mut types: Vec<PieceType> = v
            .piece_types(side)
            .filter(|pt| match v.free_drops {
                true => *pt != PieceType::King,
                false => board.hand(side, *pt) > 0,
            })
            .collect();
        types.sort_by_key(|pt| Reverse(*pt));
        types
    }

    /// 生成指定棋子的所有伪合法走法
    fn generate_piece_moves(v: &Variant, st: &BoardState, from: Square, piece: Piece, moves: &mut Vec<Move>) {
        let board = &st.board;
        let us = piece.side;
        let them = us.opponent();
        let r = reach(v, board, from, piece, false);
        let mut captures = r.capture & board.pieces(them);
        if v.blast_on_capture && v.is_royal(piece.piece_type) {
            captures = Bitboard::EMPTY;
        }
        let targets = r.quiet | captures;
        let is_pawn = v.is_promotion_pawn(us, piece.piece_type);

        for to in targets.iter() {
            Self::add_board_move(v, st, from, to, piece, captures.contains(to), moves);
        }

        if is_pawn && v.en_passant {
            for ep in (r.capture & st.ep_squares & !board.blockers()).iter() {
                moves.push(Move::with_kind(from, ep, MoveKind::EnPassant));
            }
        }

        if is_pawn && v.sittuyin_promotion {
            Self::add_sittuyin_promotions(v, board, from, piece, moves);
        }

        if v.cambodian_moves && st.gates.contains(from) {
            let leaps: &[(i32, i32)] = match piece.piece_type {
                PieceType::King if st.checkers.is_empty() => &[(-2, 1), (2, 1)],
                PieceType::Fers => &[(0, 2)],
                _ => &[],
            };
            for &(df, dr) in leaps {
                let (df, dr) = if us == Side::White { (df, dr) } else { (-df, -dr) };
                if let Some(to) = from.offset(df, dr, v.max_file, v.max_rank) {
                    if !board.blockers().contains(to) {
                        moves.push(Move::new(from, to));
                    }
                }
            }
        }
    }

    /// 添加一步棋盘走法及其升变形式
    fn add_board_move(
        v: &Variant,
        st: &BoardState,
        from: Square,
        to: Square,
        piece: Piece,
        capture: bool,
        moves: &mut Vec<Move>,
    ) {
        let us = piece.side;
        let board = &st.board;
        let pt = piece.piece_type;

        // 兵升变
        if v.is_promotion_pawn(us, pt)
            && !v.sittuyin_promotion
            && v.promotion_region[us.index()].contains(to)
            && !v.promotion_piece_types[us.index()].is_empty()
        {
            let mut promoted_any = false;
            for &target in &v.promotion_piece_types[us.index()] {
                if Self::limit_reached(v, board, us, target) {
                    continue;
                }
                moves.push(Move::with_kind(from, to, MoveKind::Promotion(target)));
                promoted_any = true;
            }
            let immobile = v.immobility_illegal && Self::is_immobile(v, pt, us, to);
            if (!v.mandatory_pawn_promotion || !promoted_any) && !immobile {
                moves.push(Move::new(from, to));
            }
            return;
        }

        let region = v.promotion_region[us.index()];
        let in_zone = region.contains(to) || region.contains(from);
        let is_promoted = board.unpromoted(from).is_some();

        // 将棋式升变
        let can_promote = !is_promoted
            && in_zone
            && v.promoted_type(pt).is_some()
            && (!v.piece_promotion_on_capture || capture);
        let can_demote = v.piece_demotion && is_promoted && in_zone;

        let immobile = v.immobility_illegal && Self::is_immobile(v, pt, us, to);
        let forced = v.mandatory_piece_promotion && (can_promote || can_demote);
        if !immobile && !forced {
            moves.push(Move::new(from, to));
        }
        if can_promote {
            moves.push(Move::with_kind(from, to, MoveKind::PiecePromotion));
        } else if can_demote {
            moves.push(Move::with_kind(from, to, MoveKind::PieceDemotion));
        }
    }

    /// 缅甸象棋的兵升变（原地或斜进一格）
    fn add_sittuyin_promotions(v: &Variant, board: &Board, from: Square, piece: Piece, moves: &mut Vec<Move>) {
        let us = piece.side;
        let them = us.opponent();
        let pawns = v.promotion_pawn_types[us.index()]
            .iter()
            .map(|pt| board.count(us, *pt))
            .sum::<u32>();
        if pawns > 1 && !v.promotion_region[us.index()].contains(from) {
            return;
        }
        let diagonals = reach(v, &Board::empty(), from, piece, false).capture;
        let targets = (diagonals & !board.blockers()) | Bitboard::from_square(from);
        for &target in &v.promotion_piece_types[us.index()] {
            if Self::limit_reached(v, board, us, target) {
                continue;
            }
            for to in targets.iter() {
                let mut after = board.clone();
                after.set(from, None);
                let promoted = Piece::new(target, us);
                after.set(to, Some(promoted));
                let attacks = reach(v, &after, to, promoted, false).capture;
                if !(attacks & after.pieces(them)).is_empty() {
                    continue;
                }
                moves.push(Move::with_kind(from, to, MoveKind::Promotion(target)));
            }
        }
    }

    /// 某类棋子是否已达到升变上限
    fn limit_reached(v: &Variant, board: &Board, side: Side, pt: PieceType) -> bool {
        v.promotion_limit
            .get(&pt)
            .map_or(false, |&limit| board.count(side, pt) >= limit as u32)
    }

    /// 棋子在该格上是否再也无法移动
    fn is_immobile(v: &Variant, pt: PieceType, side: Side, sq: Square) -> bool {
        let r = reach(v, &Board::empty(), sq, Piece::new(pt, side), false);
        (r.quiet | r.capture).is_empty()
    }

    /// 为 `start..` 之间从入场格出发的走法追加入场形式
    fn add_gating(v: &Variant, st: &BoardState, gate: Square, start: usize, moves: &mut Vec<Move>) {
        let us = st.side_to_move;
        let hand = Self::hand_types(v, &st.board, us);
        if hand.is_empty() {
            return;
        }
        let base: Vec<Move> = moves[start..].to_vec();
        for mv in base {
            for &pt in &hand {
                let mut gated = mv;
                gated.gating = Some((pt, gate));
                moves.push(gated);
            }
        }
    }

    /// 生成打入走法
    fn generate_drops(v: &Variant, st: &BoardState, hand: &[PieceType], moves: &mut Vec<Move>) {
        let board = &st.board;
        let us = st.side_to_move;
        let empty = v.board_bb() & !board.blockers();
        let mut base = empty & v.drop_region[us.index()];

        if v.drop_on_top {
            base = (0..=v.max_file)
                .filter_map(|f| {
                    (0..=v.max_rank)
                        .map(|r| Square::new_unchecked(f, r))
                        .find(|sq| empty.contains(*sq))
                })
                .collect::<Bitboard>()
                & v.drop_region[us.index()];
        }

        match v.enclosing_drop {
            EnclosingRule::None => {}
            EnclosingRule::Reversi => {
                base = base
                    .iter()
                    .filter(|sq| !enclosed_by(v, board, *sq, us).is_empty())
                    .collect();
            }
            EnclosingRule::Ataxx => {
                base = base
                    .iter()
                    .filter(|sq| !(adjacent(v, *sq) & board.pieces(us)).is_empty())
                    .collect();
            }
        }

        for &pt in hand {
            let mut targets = base & v.mobility(us, pt);
            let pawn_like = pt == PieceType::Pawn || v.is_promotion_pawn(us, pt);
            if pawn_like && !v.first_rank_pawn_drops {
                targets &= !Bitboard::rank(v.castling_rank_of(us), v.max_file);
            }
            if pawn_like && !v.promotion_zone_pawn_drops {
                targets &= !v.promotion_region[us.index()];
            }
            if v.drop_no_doubled == Some(pt) {
                for f in 0..=v.max_file {
                    let on_file = board.pieces_of(us, pt) & Bitboard::file(f, v.max_rank);
                    if on_file.count() >= v.drop_no_doubled_count as u32 {
                        targets &= !Bitboard::file(f, v.max_rank);
                    }
                }
            }
            if v.sittuyin_rook_drop && pt == PieceType::Rook {
                targets &= Bitboard::rank(v.castling_rank_of(us), v.max_file);
            }
            if v.drop_opposite_colored_bishop && pt == PieceType::Bishop {
                if let Some(other) = board.find(us, PieceType::Bishop) {
                    let colour = (other.file() + other.rank()) % 2;
                    targets = targets
                        .iter()
                        .filter(|sq| (sq.file() + sq.rank()) % 2 != colour)
                        .collect();
                }
            }
            for to in targets.iter() {
                if !(v.immobility_illegal && Self::is_immobile(v, pt, us, to)) {
                    moves.push(Move::drop(pt, to, false));
                }
                if v.drop_promoted {
                    if let Some(promoted) = v.promoted_type(pt) {
                        if !(v.immobility_illegal && Self::is_immobile(v, promoted, us, to)) {
                            moves.push(Move::drop(pt, to, true));
                        }
                    }
                }
            }
        }
    }

    /// 生成易位走法（`to` 为车所在格）
    fn generate_castling(v: &Variant, st: &BoardState, moves: &mut Vec<Move>) {
        let board = &st.board;
        let us = st.side_to_move;
        let them = us.opponent();
        let rank = Bitboard::rank(v.castling_rank_of(us), v.max_file);
        let Some(king_from) = (board.pieces_of(us, v.castling_king_piece) & rank).lsb() else {
            return;
        };
        if !st.checkers.is_empty() {
            return;
        }
        for rook_from in (st.castling_rights & board.pieces(us) & rank).iter() {
            let is_rook = board
                .get(rook_from)
                .map_or(false, |p| v.castling_rook_pieces.contains(&p.piece_type));
            if !is_rook {
                continue;
            }
            let (king_to, rook_to) = castling_destinations(v, king_from, rook_from);
            let path = Bitboard::between(king_from, king_to)
                | Bitboard::from_square(king_to)
                | Bitboard::between(rook_from, rook_to)
                | Bitboard::from_square(rook_to);
            let mut others = board.blockers();
            others.clear(king_from);
            others.clear(rook_from);
            if !(path & others).is_empty() {
                continue;
            }
            let king_path = Bitboard::between(king_from, king_to) | Bitboard::from_square(king_to);
            let mut without_king = board.clone();
            without_king.set(king_from, None);
            if king_path
                .iter()
                .any(|sq| !attackers_to(v, &without_king, sq, them).is_empty())
            {
                continue;
            }
            let mv = Move::with_kind(king_from, rook_from, MoveKind::Castling);
            moves.push(mv);
            if v.gating {
                let hand = Self::hand_types(v, board, us);
                for gate in [king_from, rook_from] {
                    if !st.gates.contains(gate) {
                        continue;
                    }
                    for &pt in &hand {
                        let mut gated = mv;
                        gated.gating = Some((pt, gate));
                        moves.push(gated);
                    }
                }
            }
        }
    }

    /// 停着：从王所在格到原格
    pub fn pass_move(v: &Variant, board: &Board, side: Side) -> Move {
        let sq = royal_squares(v, board, side)
            .lsb()
            .or_else(|| board.pieces(side).lsb())
            .unwrap_or(Square::new_unchecked(0, 0));
        Move::new(sq, sq)
    }

    /// 鸭棋：为基础走法枚举鸭子落点
    fn duck_placements(pos: &Position, mv: Move) -> Vec<Move> {
        let old = pos.board().walls();
        let after = pos.make(mv);
        let mut board = after.board;
        for sq in board.walls().iter() {
            board.set_wall(sq, false);
        }
        let v = pos.variant();
        let free = v.board_bb() & !board.occupied() & !old;
        free.iter()
            .map(|wall| Move { wall: Some(wall), ..mv })
            .collect()
    }

    /// 合法走法的排序键
    fn sort_key(v: &Variant, us: Side, mv: &Move) -> (u8, usize, usize, usize, usize, usize) {
        let gate = mv
            .gating
            .map_or(0, |(pt, sq)| 1 + (PIECE_TYPE_NB - pt.index()) * 256 + sq.index());
        let wall = mv.wall.map_or(0, |sq| 1 + sq.index());
        match mv.kind {
            MoveKind::Drop { piece, promoted } => (
                1,
                usize::MAX - piece.index(),
                mv.to.index(),
                promoted as usize,
                gate,
                wall,
            ),
            MoveKind::Castling => {
                let queenside = (mv.to.file() < mv.from.file()) as usize;
                (2, queenside, mv.to.index(), 0, gate, wall)
            }
            _ if mv.is_pass() => (3, mv.from.index(), mv.to.index(), 0, gate, wall),
            kind => {
                let order = match kind {
                    MoveKind::Promotion(pt) => v.promotion_piece_types[us.index()]
                        .iter()
                        .position(|t| *t == pt)
                        .unwrap_or(0),
                    MoveKind::PiecePromotion | MoveKind::PieceDemotion => 2000,
                    _ => 1000,
                };
                (0, mv.from.index(), mv.to.index(), order, gate, wall)
            }
        }
    }

    /// 分支计数
    pub fn perft(pos: &mut Position, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = Self::generate_legal(pos);
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut nodes = 0;
        for mv in moves {
            pos.do_move(mv);
            nodes += Self::perft(pos, depth - 1);
            pos.undo_move();
        }
        nodes
    }
}
