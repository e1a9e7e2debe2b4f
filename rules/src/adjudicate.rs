//! 终局裁决
//!
//! 所有分数都以当前走子方为视角：正数表示走子方获胜。

use tracing::debug;

use crate::bitboard::Bitboard;
use crate::board::BoardState;
use crate::chase::undo_move_board;
use crate::constants::{VALUE_DRAW, VALUE_MATE};
use crate::movegen::MoveGenerator;
use crate::moves::MoveKind;
use crate::piece::{PieceType, Side, Square};
use crate::position::Position;
use crate::variant::{ChasingRule, CountingRule, GameValue, MaterialCounting, Variant};

/// 终局裁决器
pub struct Adjudicator;

impl Adjudicator {
    /// 对局结果：立即终局、将死或逼和；对局未结束时为 0
    pub fn game_result(pos: &Position) -> i32 {
        if let Some(result) = Self::is_immediate_game_end(pos) {
            return result;
        }
        if MoveGenerator::generate_legal(pos).is_empty() {
            return if pos.in_check() {
                Self::checkmate_value(pos)
            } else {
                Self::stalemate_value(pos)
            };
        }
        VALUE_DRAW
    }

    /// 被将死时的分数
    pub fn checkmate_value(pos: &Position) -> i32 {
        let v = pos.variant();
        let st = pos.state();
        // 打步诘：用兵打入将死的一方判负
        if v.shogi_pawn_drop_mate_illegal
            && st.plies_from_null > 0
            && st.captured.is_none()
            && matches!(
                st.last_move.map(|m| m.kind),
                Some(MoveKind::Drop { piece: PieceType::ShogiPawn, .. })
            )
            && (st.checkers & !st.board.pieces_of_type(PieceType::ShogiPawn)).is_empty()
        {
            return VALUE_MATE;
        }
        v.checkmate_value.score().unwrap_or(-VALUE_MATE)
    }

    /// 无子可动时的分数
    pub fn stalemate_value(pos: &Position) -> i32 {
        let v = pos.variant();
        if v.stalemate_piece_count {
            let board = pos.board();
            let us = pos.side_to_move();
            let diff = board.pieces(us).count() as i32 - board.pieces(us.opponent()).count() as i32;
            return match diff.signum() {
                0 => VALUE_DRAW,
                -1 => VALUE_MATE,
                _ => -VALUE_MATE,
            };
        }
        v.stalemate_value.score().unwrap_or(VALUE_DRAW)
    }

    /// 变体规则造成的立即终局
    pub fn is_immediate_game_end(pos: &Position) -> Option<i32> {
        let v = pos.variant();
        let st = pos.state();
        let board = &st.board;
        let us = st.side_to_move;
        let them = us.opponent();

        // 光杆王
        if let Some(value) = v.bare_king_value.score() {
            if !v.bare_king_move && only_royals(v, st, us) {
                return Some(value);
            }
            if v.bare_king_move && only_royals(v, st, them) {
                return Some(-value);
            }
        }

        // 灭绝
        if let Some(value) = v.extinction_value.score() {
            if !v.extinction_pseudo_royal || v.blast_on_capture {
                for c in [them, us] {
                    for count in extinction_counts(v, st, c) {
                        let (own, other) = count;
                        if own <= v.extinction_piece_count && other >= v.extinction_opponent_piece_count {
                            debug!(side = ?c, "extinction");
                            return Some(if c == us { value } else { -value });
                        }
                    }
                }
            }
        }

        // 夺旗
        if let Some(flag) = v.flag_piece {
            let reached = |c: Side| !(board.pieces_of(c, flag) & v.flag_region[c.index()]).is_empty();
            if !v.flag_move && reached(them) {
                return Some(-VALUE_MATE);
            }
            if v.flag_move && reached(us) {
                return Some(if reached(them) && us == Side::White {
                    VALUE_DRAW
                } else {
                    VALUE_MATE
                });
            }
        }

        // N 将
        if v.check_counting && st.checks_remaining[them.index()] == 0 {
            return Some(-VALUE_MATE);
        }

        // 连子
        if v.connect_n > 0 && connects(v, st, them) {
            return Some(-VALUE_MATE);
        }

        // 双王照面或连续停着
        if st.plies_from_null > 0 {
            if let Some(prev) = pos.history().last() {
                let passed = |s: &BoardState| s.last_move.map_or(false, |m| m.is_pass());
                if (st.bikjang && prev.bikjang) || (passed(st) && passed(prev)) {
                    return Some(Self::counted_or_draw(pos));
                }
            }
        }

        // 满盘
        if v.adjudicate_full_board {
            let empty = v.board_bb() & !board.occupied() & !board.walls();
            if empty.is_empty() {
                return Some(Self::counted_or_draw(pos));
            }
        }

        None
    }

    /// 可由一方提出的和棋或判负
    pub fn is_optional_game_end(pos: &Position) -> Option<i32> {
        let v = pos.variant();
        let st = pos.state();

        // N 步规则
        if v.n_move_rule > 0
            && st.rule50 > 2 * v.n_move_rule - 1
            && (!pos.in_check() || !MoveGenerator::generate_legal(pos).is_empty())
        {
            return Some(Self::counted_or_draw(pos));
        }

        if v.n_fold_rule > 0 {
            if let Some(result) = repetition(pos) {
                return Some(result);
            }
        }

        // 数子规则
        if v.counting_rule != CountingRule::None
            && st.counting_limit > 0
            && st.counting_ply >= st.counting_limit
            && (!pos.in_check() || !MoveGenerator::generate_legal(pos).is_empty())
        {
            return Some(VALUE_DRAW);
        }

        // 缅甸象棋：只剩兵且只能原地升变
        if v.sittuyin_promotion && !pos.in_check() {
            let board = pos.board();
            let us = pos.side_to_move();
            if board.pieces(us).count() == 2 && board.count(us, PieceType::Pawn) == 1 {
                let moves = MoveGenerator::generate_legal(pos);
                if moves.iter().all(|m| matches!(m.kind, MoveKind::Promotion(_))) {
                    return Some(VALUE_DRAW);
                }
            }
        }

        None
    }

    /// 比子结果（以走子方为视角）
    pub fn material_counting_result(pos: &Position) -> i32 {
        let v = pos.variant();
        let board = pos.board();
        let weight = |pt: PieceType, w: i32| {
            w * (board.count(Side::White, pt) as i32 - board.count(Side::Black, pt) as i32)
        };
        let white_view = match v.material_counting {
            MaterialCounting::Janggi => {
                let score = weight(PieceType::Rook, 13)
                    + weight(PieceType::JanggiCannon, 7)
                    + weight(PieceType::Horse, 5)
                    + weight(PieceType::JanggiElephant, 3)
                    + weight(PieceType::Wazir, 3)
                    + weight(PieceType::Soldier, 2)
                    - 1;
                if score > 0 {
                    VALUE_MATE
                } else {
                    -VALUE_MATE
                }
            }
            MaterialCounting::Unweighted => {
                let white = board.pieces(Side::White).count();
                let black = board.pieces(Side::Black).count();
                match white.cmp(&black) {
                    std::cmp::Ordering::Greater => VALUE_MATE,
                    std::cmp::Ordering::Less => -VALUE_MATE,
                    std::cmp::Ordering::Equal => VALUE_DRAW,
                }
            }
            MaterialCounting::None => VALUE_DRAW,
        };
        match pos.side_to_move() {
            Side::White => white_view,
            Side::Black => -white_view,
        }
    }

    fn counted_or_draw(pos: &Position) -> i32 {
        if pos.variant().material_counting == MaterialCounting::None {
            VALUE_DRAW
        } else {
            Self::material_counting_result(pos)
        }
    }

    /// 双方都无法取胜
    pub fn is_insufficient_material(pos: &Position) -> bool {
        Self::has_insufficient_material(pos, Side::White) && Self::has_insufficient_material(pos, Side::Black)
    }

    /// `c` 方子力是否不足以取胜
    pub fn has_insufficient_material(pos: &Position, c: Side) -> bool {
        let v = pos.variant();
        let board = pos.board();
        let them = c.opponent();

        // 其他胜利方式
        if v.captures_to_hand
            || board.hand_count(c) > 0
            || (v.extinction_value != GameValue::None && !v.extinction_pseudo_royal)
            || v.flag_piece.map_or(false, |flag| board.count(c, flag) > 0)
            || (v.custom_king && board.count(c, PieceType::King) > 0)
        {
            return false;
        }
        let their_king_region = v.mobility(them, PieceType::King);
        let has_custom_attacker = v.piece_types(c).any(|pt| {
            pt.is_custom()
                && board.count(c, pt) > 0
                && !(v.mobility(c, pt) & their_king_region).is_empty()
        });
        if has_custom_attacker {
            return false;
        }

        // 受限棋子：王以及到不了对方王所在区域的棋子
        let mut restricted = board.pieces_of(them, PieceType::King);
        if v.extinction_pseudo_royal && v.blast_on_capture {
            restricted |= board.pieces_of(c, PieceType::Commoner);
        }
        for pt in v.piece_types(c) {
            if pt == PieceType::King || (v.mobility(c, pt) & their_king_region).is_empty() {
                restricted |= board.pieces_of(c, pt);
            }
        }

        // 可以单独将死的棋子
        let has_pawn = v.promotion_pawn_types[c.index()]
            .iter()
            .any(|pawn| board.count(c, *pawn) > 0);
        const MATING: [PieceType; 12] = [
            PieceType::Rook,
            PieceType::Queen,
            PieceType::Archbishop,
            PieceType::Chancellor,
            PieceType::Silver,
            PieceType::Gold,
            PieceType::Commoner,
            PieceType::Centaur,
            PieceType::Amazon,
            PieceType::Bers,
            PieceType::DragonHorse,
            PieceType::Aiwok,
        ];
        for pt in MATING {
            if !(board.pieces_of(c, pt) & !restricted).is_empty()
                || (has_pawn && v.promotion_piece_types[c.index()].contains(&pt))
            {
                return false;
            }
        }

        let hard_to_draw = v.stalemate_value != GameValue::Draw || v.check_counting || v.makpong_rule;

        // 同色格棋子
        let mut colorbound = Bitboard::EMPTY;
        for pt in [
            PieceType::Bishop,
            PieceType::Fers,
            PieceType::FersAlfil,
            PieceType::Alfil,
            PieceType::Elephant,
        ] {
            colorbound |= board.pieces_of_type(pt) & !restricted;
        }
        let all = board.pieces(Side::White) | board.pieces(Side::Black);
        let unbound = all ^ restricted ^ colorbound;
        let dark = dark_squares(v);
        if !(colorbound & board.pieces(c)).is_empty() {
            let both_colors = !(colorbound & dark).is_empty() && !(colorbound & !dark).is_empty();
            if both_colors || !unbound.is_empty() || hard_to_draw {
                return false;
            }
        }

        // 不受限的棋子需要任意一方再有一个帮手
        if !(board.pieces(c) & unbound).is_empty() && ((all ^ restricted).count() >= 2 || hard_to_draw) {
            return false;
        }

        true
    }
}

/// 某方除王外没有棋子
fn only_royals(v: &Variant, st: &BoardState, side: Side) -> bool {
    let board = &st.board;
    let pieces = board.pieces(side);
    let royals = pieces
        .iter()
        .filter(|sq| board.get(*sq).map_or(false, |p| v.is_royal(p.piece_type)))
        .count() as u32;
    pieces.count() == royals
}

/// 灭绝判定：每种类型的（本方数量含手中，对方数量含手中）
fn extinction_counts(v: &Variant, st: &BoardState, c: Side) -> Vec<(u32, u32)> {
    let board = &st.board;
    let count = |side: Side, pt: Option<PieceType>| match pt {
        Some(pt) => board.count(side, pt) + board.hand(side, pt) as u32,
        None => board.pieces(side).count() + board.hand_count(side),
    };
    match &v.extinction_piece_types {
        None => vec![(count(c, None), count(c.opponent(), None))],
        Some(types) => types
            .iter()
            .map(|pt| (count(c, Some(*pt)), count(c.opponent(), Some(*pt))))
            .collect(),
    }
}

/// 某方是否有 N 子连成一线
fn connects(v: &Variant, st: &BoardState, side: Side) -> bool {
    let pieces = st.board.pieces(side);
    let n = v.connect_n as i32;
    pieces.iter().any(|start| {
        [(0, 1), (1, 1), (1, 0), (1, -1)].iter().any(|&(df, dr)| {
            (1..n).all(|i| {
                start
                    .offset(df * i, dr * i, v.max_file, v.max_rank)
                    .map_or(false, |sq| pieces.contains(sq))
            })
        })
    })
}

fn dark_squares(v: &Variant) -> Bitboard {
    v.board_bb()
        .iter()
        .filter(|sq: &Square| (sq.file() + sq.rank()) % 2 == 0)
        .collect()
}

/// 重复局面：长将、长捉与普通的 N 次重复
fn repetition(pos: &Position) -> Option<i32> {
    let v = pos.variant();
    let st = pos.state();
    // states[i] 为 i 步之前的状态
    let states: Vec<&BoardState> = std::iter::once(st).chain(pos.history().iter().rev()).collect();
    let window = if v.captures_to_hand {
        st.plies_from_null
    } else {
        st.rule50.min(st.plies_from_null)
    };
    let end = (window as usize).min(states.len() - 1);
    if end < 4 {
        return None;
    }

    let checked = |i: usize| !states[i].checkers.is_empty();
    let mut perpetual_them = checked(0) && checked(2);
    let mut perpetual_us = checked(1) && checked(3);
    let mut chase_them = undo_move_board(states[0].chased, states[1].last_move) & states[2].chased;
    let mut chase_us = undo_move_board(states[1].chased, states[2].last_move) & states[3].chased;
    let mut count = 0;

    let mut i = 4;
    while i <= end {
        // 初始局面没有追捉记录
        if states[i].last_move.is_some() {
            chase_them = undo_move_board(chase_them, states[i - 1].last_move) & states[i].chased;
        }
        perpetual_them &= checked(i);

        if states[i].key == st.key {
            count += 1;
            if count + 1 == v.n_fold_rule {
                let result = repetition_verdict(v, st.side_to_move, perpetual_them, perpetual_us, chase_them, chase_us);
                debug!(result, perpetual_them, perpetual_us, "repetition");
                return Some(result);
            }
        }

        if i + 1 <= end {
            perpetual_us &= checked(i + 1);
            chase_us = undo_move_board(chase_us, states[i].last_move) & states[i + 1].chased;
        }
        i += 2;
    }
    None
}

fn repetition_verdict(
    v: &Variant,
    us: Side,
    perpetual_them: bool,
    perpetual_us: bool,
    chase_them: Bitboard,
    chase_us: Bitboard,
) -> i32 {
    let one_sided = |them: bool, ours: bool| {
        if !ours {
            VALUE_MATE
        } else if !them {
            -VALUE_MATE
        } else {
            VALUE_DRAW
        }
    };
    if v.perpetual_check_illegal && (perpetual_them || perpetual_us) {
        return one_sided(perpetual_them, perpetual_us);
    }
    let (chasing_them, chasing_us) = (!chase_them.is_empty(), !chase_us.is_empty());
    if v.chasing_rule != ChasingRule::None && (chasing_them || chasing_us) {
        return one_sided(chasing_them, chasing_us);
    }
    let value = v.n_fold_value.score().unwrap_or(VALUE_DRAW);
    if v.n_fold_value_absolute && us == Side::Black {
        -value
    } else {
        value
    }
}
