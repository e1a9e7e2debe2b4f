//! 长捉判定（亚洲象棋联合会规则）
//!
//! 每走一步记录对方哪些棋子被"新捉"：受到新的攻击且没有有效保护。
//! 兵（未过河）与将帅不算被捉对象；将军另行统计。

use crate::attacks::{attackers_to, checkers, in_check, reach, royal_squares};
use crate::bitboard::Bitboard;
use crate::board::{Board, BoardState};
use crate::moves::Move;
use crate::piece::{Piece, PieceType, Side, Square};
use crate::variant::Variant;

/// 把棋子所在格沿走法倒推回走之前的位置
pub fn undo_move_board(b: Bitboard, mv: Option<Move>) -> Bitboard {
    match mv {
        Some(m) if b.contains(m.to) => {
            b ^ Bitboard::from_square(m.to) ^ Bitboard::from_square(m.from)
        }
        _ => b,
    }
}

/// 上一步造成的被捉棋子（属于新的走子方）
pub fn chased(v: &Variant, prev: &BoardState, next: &BoardState) -> Bitboard {
    let Some(mv) = next.last_move else {
        return Bitboard::EMPTY;
    };
    if mv.is_pass() || mv.is_castling() {
        return Bitboard::EMPTY;
    }
    let mut ctx = ChaseContext::new(v, next);
    let board = &next.board;
    let (from, to) = (mv.from, mv.to);

    // 直接捉
    if let Some(moved) = board.get(to) {
        if !matches!(moved.piece_type, PieceType::King | PieceType::Soldier) {
            let mut direct = attacks_of(v, board, to, moved) & board.pieces(ctx.us);
            // 车炮沿原线移动不产生新攻击
            if from != to && matches!(moved.piece_type, PieceType::Rook | PieceType::Cannon) {
                direct &= !Bitboard::line(from, to, v.max_file, v.max_rank);
            }
            ctx.add_chased(to, moved.piece_type, direct);
        }
    }

    // 闪击：离开的格子解除了马腿、象眼或炮架，落点成为新的炮架
    for s in board.pieces(ctx.them).iter() {
        if s == to {
            continue;
        }
        let Some(piece) = board.get(s) else { continue };
        if !discovery_candidate(piece.piece_type, s, from, to) {
            continue;
        }
        let now = attacks_of(v, board, s, piece);
        let before = attacks_of(v, &prev.board, s, piece);
        ctx.add_chased(s, piece.piece_type, now & !before & board.pieces(ctx.us));
    }

    if next.plies_from_null > 0 {
        // 新的牵制使原有保护失效
        let blockers_before = blockers_for_king(v, &prev.board, ctx.us);
        let new_pins = ctx.pins & !blockers_before & board.pieces(ctx.us);
        for s in new_pins.iter() {
            let Some(pinned) = board.get(s) else { continue };
            let rooted = attacks_of(v, board, s, pinned) & ctx.targets;
            for s2 in rooted.iter() {
                if ctx.chased.contains(s2) {
                    continue;
                }
                for a in attackers_to(v, board, s2, ctx.them).iter() {
                    if let Some(attacker) = board.get(a) {
                        ctx.add_chased(a, attacker.piece_type, Bitboard::from_square(s2));
                    }
                }
            }
        }

        // 闪将：对方阻挡子一旦移开即可吃子
        let new_discoverers = ctx.king_blockers & !blockers_before & board.pieces(ctx.them);
        let royals = royal_squares(v, board, ctx.us);
        let king_reach = royals.iter().fold(Bitboard::EMPTY, |acc, k| match board.get(k) {
            Some(king) => acc | attacks_of(v, board, k, king),
            None => acc,
        });
        for s in new_discoverers.iter() {
            let Some(piece) = board.get(s) else { continue };
            let mut threats = attacks_of(v, board, s, piece) & board.pieces(ctx.us) & !royals;
            ctx.chased |= threats & !king_reach;
            threats &= king_reach;
            let mut without = board.clone();
            without.set(s, None);
            for s2 in threats.iter() {
                if !attackers_to(v, &without, s2, ctx.them).is_empty() {
                    ctx.chased.set(s2);
                }
            }
        }
    }

    ctx.chased
}

struct ChaseContext<'a> {
    v: &'a Variant,
    board: &'a Board,
    /// 被捉的一方（新的走子方）
    us: Side,
    them: Side,
    /// 可以被捉的棋子
    targets: Bitboard,
    /// 我方王的阻挡子（双方棋子）
    king_blockers: Bitboard,
    pins: Bitboard,
    chased: Bitboard,
}

impl<'a> ChaseContext<'a> {
    fn new(v: &'a Variant, next: &'a BoardState) -> Self {
        let board = &next.board;
        let us = next.side_to_move;
        let king_blockers = blockers_for_king(v, board, us);
        Self {
            v,
            board,
            us,
            them: us.opponent(),
            targets: chase_targets(v, board, us),
            king_blockers,
            pins: king_blockers & board.pieces(us),
            chased: Bitboard::EMPTY,
        }
    }

    fn add_chased(&mut self, attacker_sq: Square, attacker_type: PieceType, attacks: Bitboard) {
        let mut attacks = attacks & self.targets;
        if (attacks & !self.chased).is_empty() {
            return;
        }
        let board = self.board;
        let us = self.us;

        // 捉价值更高的子
        match attacker_type {
            PieceType::Horse | PieceType::Cannon => {
                self.chased |= attacks & board.pieces_of(us, PieceType::Rook);
            }
            PieceType::Elephant | PieceType::Fers => {
                self.chased |= attacks
                    & (board.pieces_of(us, PieceType::Rook)
                        | board.pieces_of(us, PieceType::Cannon)
                        | board.pieces_of(us, PieceType::Horse));
            }
            _ => {}
        }

        // 同类子互相攻击不算捉，蹩脚马与被牵制的子除外
        if attacker_type == PieceType::Horse && horse_is_lame(self.v, board, attacker_sq) {
            for h in (attacks & board.pieces_of(us, PieceType::Horse)).iter() {
                let horse = Piece::new(PieceType::Horse, us);
                if attacks_of(self.v, board, h, horse).contains(attacker_sq) {
                    attacks.clear(h);
                }
            }
        } else {
            attacks &= !board.pieces_of(us, attacker_type) | self.pins;
        }

        for s in attacks.iter() {
            if !self.chased.contains(s) && !self.is_protected(attacker_sq, s) {
                self.chased.set(s);
            }
        }
    }

    /// 对方吃掉 `s` 后我方能否合法地吃回
    fn is_protected(&self, attacker_sq: Square, s: Square) -> bool {
        let mut after = self.board.clone();
        after.move_piece(attacker_sq, s);
        for root in after.pieces(self.us).iter() {
            let Some(defender) = after.get(root) else { continue };
            if !attacks_of(self.v, &after, root, defender).contains(s) {
                continue;
            }
            let mut recaptured = after.clone();
            recaptured.move_piece(root, s);
            if !in_check(self.v, &recaptured, self.us) {
                return true;
            }
        }
        false
    }
}

fn attacks_of(v: &Variant, board: &Board, sq: Square, piece: Piece) -> Bitboard {
    reach(v, board, sq, piece, false).capture
}

/// 可被捉的棋子：将帅与未过河的兵除外
fn chase_targets(v: &Variant, board: &Board, side: Side) -> Bitboard {
    let mut targets = board.pieces(side) & !royal_squares(v, board, side);
    for s in board.pieces_of(side, PieceType::Soldier).iter() {
        if s.relative_rank(side, v.max_rank) <= v.max_rank / 2 {
            targets.clear(s);
        }
    }
    targets
}

/// 移开后会让 `side` 的王被将军的棋子（双方）
pub fn blockers_for_king(v: &Variant, board: &Board, side: Side) -> Bitboard {
    let royals = royal_squares(v, board, side);
    if royals.is_empty() {
        return Bitboard::EMPTY;
    }
    let base = checkers(v, board, side);
    let mut out = Bitboard::EMPTY;
    for sq in (board.occupied() & !royals).iter() {
        let mut without = board.clone();
        without.set(sq, None);
        if !(checkers(v, &without, side) & !base).is_empty() {
            out.set(sq);
        }
    }
    out
}

fn horse_is_lame(v: &Variant, board: &Board, sq: Square) -> bool {
    [(-1, -1), (-1, 1), (1, -1), (1, 1)].iter().any(|&(df, dr)| {
        sq.offset(df, dr, v.max_file, v.max_rank)
            .map_or(false, |n| board.get(n).is_some())
    })
}

/// 走法的起点或终点是否可能改变该子的攻击范围
fn discovery_candidate(pt: PieceType, s: Square, from: Square, to: Square) -> bool {
    let orthogonal = |a: Square, b: Square| a.file() == b.file() || a.rank() == b.rank();
    let step = |a: Square, b: Square| {
        let df = (a.file() as i32 - b.file() as i32).abs();
        let dr = (a.rank() as i32 - b.rank() as i32).abs();
        (df, dr)
    };
    match pt {
        PieceType::Horse => {
            let (df, dr) = step(s, from);
            df + dr == 1
        }
        PieceType::Elephant => step(s, from) == (1, 1),
        PieceType::Rook => orthogonal(s, from),
        PieceType::Cannon => orthogonal(s, from) || orthogonal(s, to),
        _ => false,
    }
}
