//! 攻击与可达格计算

use crate::betza::{AtomKind, MoveAtom};
use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::piece::{Piece, PieceType, Side, Square};
use crate::variant::Variant;

/// 一个棋子的可达格
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reach {
    /// 可以走到的空格
    pub quiet: Bitboard,
    /// 可以吃子的格子（不论是否有子）
    pub capture: Bitboard,
}

/// 计算棋子从 `from` 出发的可达格
///
/// `attack_mode` 为真时附加只用于将军判定的攻击（如飞将）。
pub fn reach(v: &Variant, board: &Board, from: Square, piece: Piece, attack_mode: bool) -> Reach {
    let Some(spec) = v.movement(piece.piece_type) else {
        return Reach::default();
    };
    let initial_ok = v.double_step && v.double_step_region[piece.side.index()].contains(from);
    let mut out = Reach::default();
    for atom in &spec.atoms {
        if atom.initial && !initial_ok {
            continue;
        }
        walk_atom(v, board, from, piece.side, atom, &atom.vectors, &mut out, None);
    }

    // 兵过河后可横走
    if v.xiangqi_soldier
        && piece.piece_type == PieceType::Soldier
        && from.relative_rank(piece.side, v.max_rank) > v.max_rank / 2
    {
        for df in [-1, 1] {
            if let Some(to) = from.offset(df, 0, v.max_file, v.max_rank) {
                out.quiet.set(to);
                out.capture.set(to);
            }
        }
    }

    // 九宫斜线
    if !v.diagonal_lines.is_empty() && v.diagonal_lines.contains(from) {
        for atom in &spec.atoms {
            let diagonals = palace_diagonals(atom);
            if !diagonals.is_empty() {
                walk_atom(v, board, from, piece.side, atom, &diagonals, &mut out, Some(v.diagonal_lines));
            }
        }
    }

    let region = v.mobility(piece.side, piece.piece_type);
    out.quiet &= region;
    out.capture &= region;

    // 飞将：王沿直线看到对方王视为攻击，不受九宫限制
    if attack_mode && v.flying_general && piece.piece_type == PieceType::King {
        let blockers = board.blockers();
        for dr in [-1, 1] {
            let mut sq = from;
            while let Some(next) = sq.offset(0, dr, v.max_file, v.max_rank) {
                if blockers.contains(next) {
                    let facing = board
                        .get(next)
                        .map_or(false, |p| p.side != piece.side && p.piece_type == PieceType::King);
                    if facing {
                        out.capture.set(next);
                    }
                    break;
                }
                sq = next;
            }
        }
    }

    out
}

/// 沿原子方向展开可达格；`lines` 限定只能在这些格子上行走
#[allow(clippy::too_many_arguments)]
fn walk_atom(
    v: &Variant,
    board: &Board,
    from: Square,
    side: Side,
    atom: &MoveAtom,
    vectors: &[(i8, i8)],
    out: &mut Reach,
    lines: Option<Bitboard>,
) {
    let blockers = board.blockers();
    let walls = board.walls();
    let on_lines = |sq: Square| lines.map_or(true, |l| l.contains(sq));
    let janggi_cannon = |sq: Square| {
        board.get(sq).map(|p| p.piece_type) == Some(PieceType::JanggiCannon)
    };
    let hopper_is_janggi = board.get(from).map(|p| p.piece_type) == Some(PieceType::JanggiCannon);

    for &(df, dr) in vectors {
        let (df, dr) = match side {
            Side::White => (df as i32, dr as i32),
            Side::Black => (-(df as i32), -(dr as i32)),
        };
        match atom.kind {
            AtomKind::Leap => {
                let Some(to) = from.offset(df, dr, v.max_file, v.max_rank) else {
                    continue;
                };
                if !on_lines(to) || walls.contains(to) {
                    continue;
                }
                if atom.lame && lame_path(from, df, dr, v).iter().any(|s| blockers.contains(*s)) {
                    continue;
                }
                if atom.quiet && !blockers.contains(to) {
                    out.quiet.set(to);
                }
                if atom.capture {
                    out.capture.set(to);
                }
            }
            AtomKind::Slide => {
                let mut sq = from;
                let mut steps = 0u8;
                while let Some(next) = sq.offset(df, dr, v.max_file, v.max_rank) {
                    if !on_lines(next) || walls.contains(next) {
                        break;
                    }
                    steps += 1;
                    if atom.range != 0 && steps > atom.range {
                        break;
                    }
                    if blockers.contains(next) {
                        if atom.capture {
                            out.capture.set(next);
                        }
                        break;
                    }
                    if atom.quiet {
                        out.quiet.set(next);
                    }
                    if atom.capture {
                        out.capture.set(next);
                    }
                    sq = next;
                }
            }
            AtomKind::Hop | AtomKind::Grasshopper => {
                let mut sq = from;
                let mut steps = 0u8;
                let mut screened = false;
                while let Some(next) = sq.offset(df, dr, v.max_file, v.max_rank) {
                    if !on_lines(next) {
                        break;
                    }
                    steps += 1;
                    if atom.range != 0 && steps > atom.range {
                        break;
                    }
                    if !screened {
                        if blockers.contains(next) {
                            if hopper_is_janggi && janggi_cannon(next) {
                                break;
                            }
                            screened = true;
                        }
                        sq = next;
                        continue;
                    }
                    if walls.contains(next) {
                        break;
                    }
                    if blockers.contains(next) {
                        if atom.capture && !(hopper_is_janggi && janggi_cannon(next)) {
                            out.capture.set(next);
                        }
                        break;
                    }
                    if atom.quiet {
                        out.quiet.set(next);
                    }
                    if atom.capture {
                        out.capture.set(next);
                    }
                    if atom.kind == AtomKind::Grasshopper {
                        break;
                    }
                    sq = next;
                }
            }
        }
    }
}

/// 蹩腿检查的中间格：先沿长边直走一步，再斜走
fn lame_path(from: Square, df: i32, dr: i32, v: &Variant) -> Vec<Square> {
    let mut path = Vec::new();
    let (mut rf, mut rr) = (df, dr);
    let (mut cf, mut cr) = (0, 0);
    loop {
        let (sf, sr) = if rf != 0 && rr != 0 && rf.abs() != rr.abs() {
            if rf.abs() > rr.abs() {
                (rf.signum(), 0)
            } else {
                (0, rr.signum())
            }
        } else {
            (rf.signum(), rr.signum())
        };
        cf += sf;
        cr += sr;
        rf -= sf;
        rr -= sr;
        if rf == 0 && rr == 0 {
            break;
        }
        if let Some(sq) = from.offset(cf, cr, v.max_file, v.max_rank) {
            path.push(sq);
        }
    }
    path
}

/// 直走原子在九宫斜线上对应的斜向向量
fn palace_diagonals(atom: &MoveAtom) -> Vec<(i8, i8)> {
    let orthogonal: Vec<(i8, i8)> = atom
        .vectors
        .iter()
        .copied()
        .filter(|&(a, b)| (a == 0) != (b == 0) && (a.abs() <= 1 && b.abs() <= 1))
        .collect();
    if orthogonal.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for a in [-1i8, 1] {
        for b in [-1i8, 1] {
            if orthogonal.contains(&(a, 0)) && orthogonal.contains(&(0, b)) {
                out.push((a, b));
            }
        }
    }
    out
}

/// 某方的王（含伪王）所在格
pub fn royal_squares(v: &Variant, board: &Board, side: Side) -> Bitboard {
    board
        .pieces(side)
        .iter()
        .filter(|sq| board.get(*sq).map_or(false, |p| v.is_royal(p.piece_type)))
        .collect()
}

/// `by` 方攻击 `target` 的棋子
pub fn attackers_to(v: &Variant, board: &Board, target: Square, by: Side) -> Bitboard {
    let mut out = Bitboard::EMPTY;
    for sq in board.pieces(by).iter() {
        let Some(piece) = board.get(sq) else { continue };
        // 爆炸规则下王不能吃子
        if v.blast_on_capture && v.is_royal(piece.piece_type) {
            continue;
        }
        if reach(v, board, sq, piece, true).capture.contains(target) {
            out.set(sq);
        }
    }
    out
}

/// 正在攻击 `side` 王的棋子
pub fn checkers(v: &Variant, board: &Board, side: Side) -> Bitboard {
    let royals = royal_squares(v, board, side);
    if royals.is_empty() {
        return Bitboard::EMPTY;
    }
    let attacked: Vec<(Square, Bitboard)> = royals
        .iter()
        .filter(|sq| !blast_shielded(v, board, *sq, side))
        .map(|sq| (sq, attackers_to(v, board, sq, side.opponent())))
        .collect();
    // 多王时需全部被攻击才算将军
    if v.duple_check && royals.more_than_one() {
        if attacked.len() == royals.count() as usize && attacked.iter().all(|(_, a)| !a.is_empty()) {
            return attacked.iter().fold(Bitboard::EMPTY, |acc, (_, a)| acc | *a);
        }
        return Bitboard::EMPTY;
    }
    attacked.iter().fold(Bitboard::EMPTY, |acc, (_, a)| acc | *a)
}

/// 某方是否被将军
pub fn in_check(v: &Variant, board: &Board, side: Side) -> bool {
    !checkers(v, board, side).is_empty()
}

/// 爆炸规则下与对方王相邻的王不会被将
fn blast_shielded(v: &Variant, board: &Board, royal: Square, side: Side) -> bool {
    if !v.blast_on_capture {
        return false;
    }
    royal_squares(v, board, side.opponent())
        .iter()
        .any(|other| king_distance(royal, other) == 1)
}

/// 王步距离
pub fn king_distance(a: Square, b: Square) -> u8 {
    let df = (a.file() as i32 - b.file() as i32).unsigned_abs();
    let dr = (a.rank() as i32 - b.rank() as i32).unsigned_abs();
    df.max(dr) as u8
}

/// 与某格相邻的格子
pub fn adjacent(v: &Variant, sq: Square) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    for df in -1..=1 {
        for dr in -1..=1 {
            if df == 0 && dr == 0 {
                continue;
            }
            if let Some(n) = sq.offset(df, dr, v.max_file, v.max_rank) {
                bb.set(n);
            }
        }
    }
    bb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn place(board: &mut Board, s: &str, pt: PieceType, side: Side) {
        board.set(sq(s), Some(Piece::new(pt, side)));
    }

    #[test]
    fn test_rook_slides_until_blocked() {
        let v = Variant::chess();
        let mut board = Board::empty();
        place(&mut board, "a1", PieceType::Rook, Side::White);
        place(&mut board, "a4", PieceType::Pawn, Side::Black);
        let r = reach(&v, &board, sq("a1"), Piece::new(PieceType::Rook, Side::White), false);
        assert!(r.quiet.contains(sq("a3")));
        assert!(!r.quiet.contains(sq("a4")));
        assert!(r.capture.contains(sq("a4")));
        assert!(!r.capture.contains(sq("a5")));
        assert_eq!(r.quiet.count(), 2 + 7);
    }

    #[test]
    fn test_black_pawn_moves_down() {
        let v = Variant::chess();
        let mut board = Board::empty();
        place(&mut board, "e7", PieceType::Pawn, Side::Black);
        let r = reach(&v, &board, sq("e7"), Piece::new(PieceType::Pawn, Side::Black), false);
        assert!(r.quiet.contains(sq("e6")));
        assert!(r.quiet.contains(sq("e5")));
        assert!(r.capture.contains(sq("d6")) && r.capture.contains(sq("f6")));
    }

    #[test]
    fn test_lame_horse() {
        let mut v = Variant::chess();
        v.set_dimensions(8, 9);
        v.add_builtin(PieceType::Horse, 'h');
        let mut board = Board::empty();
        place(&mut board, "b1", PieceType::Horse, Side::White);
        place(&mut board, "b2", PieceType::Pawn, Side::White);
        let r = reach(&v, &board, sq("b1"), Piece::new(PieceType::Horse, Side::White), false);
        assert!(!r.quiet.contains(sq("a3")) && !r.quiet.contains(sq("c3")));
        assert!(r.quiet.contains(sq("d2")));
    }

    #[test]
    fn test_cannon_hop() {
        let mut v = Variant::chess();
        v.set_dimensions(8, 9);
        v.add_builtin(PieceType::Cannon, 'c');
        let mut board = Board::empty();
        place(&mut board, "b3", PieceType::Cannon, Side::White);
        place(&mut board, "b5", PieceType::Pawn, Side::White);
        place(&mut board, "b8", PieceType::Rook, Side::Black);
        let r = reach(&v, &board, sq("b3"), Piece::new(PieceType::Cannon, Side::White), false);
        assert!(r.quiet.contains(sq("b4")));
        assert!(!r.quiet.contains(sq("b6")));
        assert!(r.capture.contains(sq("b8")));
        assert!(!r.capture.contains(sq("b5")));
    }

    #[test]
    fn test_lame_path() {
        let v = Variant::chess();
        let path = lame_path(sq("d4"), 2, 3, &v);
        let names: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["d5", "e6"]);
        assert_eq!(lame_path(sq("d4"), 0, 2, &v), vec![sq("d5")]);
    }

    #[test]
    fn test_check_detection() {
        let v = Variant::chess();
        let mut board = Board::empty();
        place(&mut board, "e1", PieceType::King, Side::White);
        place(&mut board, "e8", PieceType::Rook, Side::Black);
        assert!(in_check(&v, &board, Side::White));
        place(&mut board, "e4", PieceType::Pawn, Side::White);
        assert!(!in_check(&v, &board, Side::White));
    }

    #[test]
    fn test_flying_general_crosses_palace() {
        let v = crate::builtin::xiangqi();
        let mut board = Board::empty();
        place(&mut board, "e1", PieceType::King, Side::White);
        place(&mut board, "e10", PieceType::King, Side::Black);
        assert_eq!(checkers(&v, &board, Side::White), Bitboard::from_square(sq("e10")));
        let quiet = reach(&v, &board, sq("e10"), Piece::new(PieceType::King, Side::Black), true).quiet;
        assert!(!quiet.contains(sq("e5")));
        place(&mut board, "e5", PieceType::Cannon, Side::White);
        assert!(!in_check(&v, &board, Side::White));
        assert!(attackers_to(&v, &board, sq("e5"), Side::Black).is_empty());
        assert!(!in_check(&v, &board, Side::Black));
    }

    #[test]
    fn test_palace_diagonals() {
        let spec = crate::betza::MovementSpec::parse("fsW").unwrap();
        assert_eq!(palace_diagonals(&spec.atoms[0]), vec![(-1, 1), (1, 1)]);
        let spec = crate::betza::MovementSpec::parse("nN").unwrap();
        assert!(palace_diagonals(&spec.atoms[0]).is_empty());
    }
}
