//! FEN / SFEN 解析、输出与校验
//!
//! 解析分两种模式：宽松模式修正无效的易位权与入场标记，
//! 严格模式在第一个问题处返回对应的 [`FenValidation`] 代码。

use std::sync::Arc;

use tracing::warn;

use crate::attacks::reach;
use crate::bitboard::Bitboard;
use crate::board::{Board, BoardState};
use crate::error::{FenError, FenValidation};
use crate::movegen::MoveGenerator;
use crate::moves::MoveKind;
use crate::piece::{Piece, PieceType, Side, Square};
use crate::position::{is_bare, Position};
use crate::variant::{CountingRule, Variant, VariantTemplate, WallingRule};

/// 将军计数的默认值
const DEFAULT_CHECKS: u32 = 3;

/// 输出选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FenOptions {
    /// 易位权使用列字母
    pub chess960: bool,
    pub sfen: bool,
    /// 输出 `~` 升变标记
    pub show_promoted: bool,
    /// 数子开始的回合（0 表示不调整）
    pub count_started: i32,
}

impl Position {
    /// 宽松解析 FEN
    pub fn from_fen(variant: Arc<Variant>, fen: &str, chess960: bool) -> Result<Position, FenError> {
        let st = parse(&variant, fen, false)?;
        Ok(Position::from_state(variant, st, chess960))
    }

    /// 输出 FEN
    pub fn fen(&self, opts: &FenOptions) -> String {
        render(self.variant(), self.state(), opts, None)
    }

    /// 走子方视角的迷雾 FEN：看不到的格子输出为 `*`
    pub fn fog_fen(&self) -> String {
        let us = self.side_to_move();
        let mut visible = self.board().pieces(us);
        let v = self.variant();
        let push = if us == Side::White { -1 } else { 1 };
        for mv in MoveGenerator::generate_legal(self) {
            visible.set(mv.to_effective(v));
            // 吃过路兵时被吃的兵也可见
            if mv.kind == MoveKind::EnPassant {
                if let Some(victim) = mv.to.offset(0, push, v.max_file, v.max_rank) {
                    visible.set(victim);
                }
            }
        }
        let opts = FenOptions {
            chess960: self.chess960(),
            ..FenOptions::default()
        };
        render(self.variant(), self.state(), &opts, Some(visible))
    }
}

/// 严格校验 FEN
///
/// `KQkq` 与列字母两种易位写法都接受。非 960 局面中保留易位权的王必须在初始列。
pub fn validate_fen(v: &Variant, fen: &str, chess960: bool) -> FenValidation {
    let st = match parse(v, fen, true) {
        Ok(st) => st,
        Err(e) => return e.code,
    };

    if let Ok(start) = parse(v, &v.start_fen, false) {
        // 王的数量与初始局面一致
        for side in Side::ALL {
            let kings = |s: &BoardState| {
                s.board.count(side, PieceType::King) + s.board.hand(side, PieceType::King) as u32
            };
            if kings(&st) != kings(&start) {
                return FenValidation::InvalidKings;
            }
        }

        if !chess960 {
            for side in Side::ALL {
                let rank = Bitboard::rank(v.castling_rank_of(side), v.max_file);
                if (st.castling_rights & rank).is_empty() {
                    continue;
                }
                let now = castling_king(v, &st.board, side);
                let initial = castling_king(v, &start.board, side);
                if let (Some(now), Some(initial)) = (now, initial) {
                    if now.file() != initial.file() {
                        return FenValidation::InvalidCastling;
                    }
                }
            }
        }
    }

    // 两王互相攻击
    if !v.blast_on_capture {
        let white = st.board.find(Side::White, PieceType::King);
        let black = st.board.find(Side::Black, PieceType::King);
        if let (Some(w), Some(b)) = (white, black) {
            let king = Piece::new(PieceType::King, Side::White);
            if reach(v, &st.board, w, king, false).capture.contains(b) {
                return FenValidation::TouchingKings;
            }
        }
    }
    FenValidation::Ok
}

fn fail(code: FenValidation, reason: impl Into<String>) -> FenError {
    FenError::new(code, reason)
}

/// 解析 FEN（`strict` 为真时遇到问题即返回错误）
fn parse(v: &Variant, fen: &str, strict: bool) -> Result<BoardState, FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.is_empty() {
        return Err(fail(FenValidation::Empty, "empty FEN"));
    }
    let mut st = BoardState::empty();
    let limit = check_limit(v);
    if v.check_counting {
        st.checks_remaining = [limit, limit];
    }

    let hand = parse_board(v, fields[0], strict, &mut st.board)?;
    if let Some(hand) = hand {
        parse_hand(v, hand, strict, &mut st.board)?;
    }

    let sfen = v.template == VariantTemplate::Shogi
        && fields.len() == 4
        && !fields[0].contains('[')
        && is_number(fields[3])
        && !is_number(fields[2]);
    if sfen {
        // SFEN：先手为 b，手中棋子带数量，最后是步数
        st.side_to_move = if fields[1] == "w" { Side::Black } else { Side::White };
        parse_hand(v, fields[2], strict, &mut st.board)?;
        let ply: u32 = fields[3].parse().unwrap_or(1);
        st.game_ply = ply.saturating_sub(1);
        return Ok(st);
    }

    let mut rest = fields[1..].iter().copied().peekable();
    if let Some(side) = rest.next() {
        st.side_to_move = match side {
            "w" => Side::White,
            "b" => Side::Black,
            _ if strict => return Err(fail(FenValidation::InvalidSideToMove, side)),
            _ => Side::Black,
        };
    }

    // 易位与吃过路兵字段可以整体省略
    let has_flags = rest.peek().map_or(false, |f| !is_number(f));
    if has_flags {
        if let Some(castling) = rest.next() {
            parse_castling(v, castling, strict, &mut st)?;
        }
        if let Some(ep) = rest.next() {
            parse_ep(v, ep, strict, &mut st)?;
        }
    }

    if v.check_counting {
        if let Some(field) = rest.peek().copied().filter(|f| f.contains('+') && !f.starts_with('+')) {
            rest.next();
            st.checks_remaining = parse_checks(field, strict, limit)?;
        }
    }

    if let Some(field) = rest.next() {
        match field.parse::<u32>() {
            Ok(n) => st.rule50 = n,
            Err(_) if strict => return Err(fail(FenValidation::InvalidHalfmove, field)),
            Err(_) => {}
        }
    }
    let mut fullmove = 1u32;
    if let Some(field) = rest.next() {
        match field.parse::<u32>() {
            Ok(n) => fullmove = n,
            Err(_) if strict => return Err(fail(FenValidation::InvalidFullmove, field)),
            Err(_) => {}
        }
    }
    st.game_ply = 2 * fullmove.saturating_sub(1) + u32::from(st.side_to_move == Side::Black);

    // lichess 风格：+白方已将次数+黑方已将次数
    if let Some(field) = rest.next() {
        if v.check_counting && field.starts_with('+') {
            let given = parse_checks(&field[1..], strict, limit)?;
            st.checks_remaining = [limit.saturating_sub(given[0]), limit.saturating_sub(given[1])];
        } else if strict {
            return Err(fail(FenValidation::InvalidParts, field));
        }
    }
    if strict && rest.next().is_some() {
        return Err(fail(FenValidation::InvalidParts, fen));
    }

    if st.counting_limit > 0 && st.rule50 > 0 {
        st.counting_ply = st.rule50;
        st.rule50 = 0;
    }
    Ok(st)
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// 解析棋盘字段，返回其后的手中棋子文本
fn parse_board<'a>(v: &Variant, text: &'a str, strict: bool, board: &mut Board) -> Result<Option<&'a str>, FenError> {
    let geometry = |what: &str| fail(FenValidation::InvalidBoardGeometry, what.to_string());
    let mut rank = v.max_rank as i32;
    let mut file = 0i32;
    let mut last: Option<Square> = None;
    let mut chars = text.char_indices().peekable();
    let width = v.max_file as i32 + 1;

    let square_at = |file: i32, rank: i32| {
        (file <= v.max_file as i32 && rank >= 0)
            .then(|| Square::new(file as u8, rank as u8))
            .flatten()
    };

    while let Some((i, c)) = chars.next() {
        match c {
            '0'..='9' => {
                let mut n = c.to_digit(10).unwrap_or(0);
                while let Some(&(_, d)) = chars.peek() {
                    let Some(digit) = d.to_digit(10) else { break };
                    n = n * 10 + digit;
                    chars.next();
                }
                if n == 0 && strict {
                    return Err(fail(FenValidation::InvalidChar, "0"));
                }
                file += n as i32;
                last = None;
            }
            '/' => {
                if strict && file != width {
                    return Err(geometry(text));
                }
                if rank == 0 {
                    return Ok(Some(&text[i + 1..]));
                }
                rank -= 1;
                file = 0;
                last = None;
            }
            '[' => {
                let inner = &text[i + 1..];
                return match inner.strip_suffix(']') {
                    Some(hand) => {
                        if strict && (rank != 0 || file < width) {
                            return Err(geometry(text));
                        }
                        Ok(Some(hand))
                    }
                    None if strict => Err(fail(FenValidation::InvalidPocket, inner)),
                    None => Ok(Some(inner.trim_end_matches(']'))),
                };
            }
            '+' => {
                if strict && !v.shogi_style_promotions() {
                    return Err(fail(FenValidation::InvalidChar, "+"));
                }
                let Some((_, next)) = chars.next() else {
                    return Err(fail(FenValidation::InvalidPromotedPiece, "+"));
                };
                let base = v.piece_from_char(next);
                let promoted = base.and_then(|p| v.promoted_type(p.piece_type).map(|pt| (p, pt)));
                match promoted {
                    Some((base, pt)) => {
                        if let Some(sq) = square_at(file, rank) {
                            board.put(sq, Piece::new(pt, base.side), Some(base.piece_type), false);
                            last = Some(sq);
                        }
                    }
                    None if strict => {
                        return Err(fail(FenValidation::InvalidPromotedPiece, format!("+{}", next)))
                    }
                    None => {
                        if let (Some(p), Some(sq)) = (base, square_at(file, rank)) {
                            board.set(sq, Some(p));
                        }
                    }
                }
                file += 1;
            }
            '~' => {
                if let Some(sq) = last {
                    board.set_promoted(sq, true);
                } else if strict {
                    return Err(fail(FenValidation::InvalidChar, "~"));
                }
            }
            '*' => {
                if strict && v.walling_rule == WallingRule::None {
                    return Err(fail(FenValidation::InvalidChar, "*"));
                }
                if let Some(sq) = square_at(file, rank) {
                    board.set_wall(sq, true);
                }
                file += 1;
                last = None;
            }
            _ => {
                let Some(piece) = v.piece_from_char(c) else {
                    if strict {
                        return Err(fail(FenValidation::InvalidChar, c.to_string()));
                    }
                    continue;
                };
                if let Some(sq) = square_at(file, rank) {
                    board.set(sq, Some(piece));
                    last = Some(sq);
                }
                file += 1;
            }
        }
        // 最后一行的空格数可以超出宽度，棋子不能越界
        if strict && file > width && !(rank == 0 && c.is_ascii_digit()) {
            return Err(geometry(text));
        }
    }
    if strict && (rank != 0 || file < width) {
        return Err(geometry(text));
    }
    Ok(None)
}

/// 解析手中棋子（支持 SFEN 的数量前缀）
fn parse_hand(v: &Variant, text: &str, strict: bool, board: &mut Board) -> Result<(), FenError> {
    let mut count = 0u32;
    for c in text.chars() {
        if let Some(d) = c.to_digit(10) {
            count = count * 10 + d;
            continue;
        }
        if c == '-' {
            continue;
        }
        match v.piece_from_char(c) {
            Some(piece) => {
                for _ in 0..count.max(1) {
                    board.add_to_hand(piece.side, piece.piece_type);
                }
            }
            None if strict => return Err(fail(FenValidation::InvalidPocket, c.to_string())),
            None => {}
        }
        count = 0;
    }
    Ok(())
}

/// 易位所用的王（位于易位行）
pub fn castling_king(v: &Variant, board: &Board, side: Side) -> Option<Square> {
    let rank = Bitboard::rank(v.castling_rank_of(side), v.max_file);
    (board.pieces_of(side, v.castling_king_piece) & rank).lsb()
}

fn is_castling_rook(v: &Variant, board: &Board, sq: Square, side: Side) -> bool {
    board
        .get(sq)
        .map_or(false, |p| p.side == side && v.castling_rook_pieces.contains(&p.piece_type))
}

/// 按 `K` / `Q` 查找易位车：有王时从王向外找，否则从边线向内找
fn find_castling_rook(v: &Variant, board: &Board, side: Side, kingside: bool) -> Option<Square> {
    let rank = v.castling_rank_of(side);
    let files: Vec<u8> = match (castling_king(v, board, side), kingside) {
        (Some(k), true) => (k.file() + 1..=v.max_file).collect(),
        (Some(k), false) => (0..k.file()).rev().collect(),
        (None, true) => (0..=v.max_file).rev().collect(),
        (None, false) => (0..=v.max_file).collect(),
    };
    files
        .into_iter()
        .map(|f| Square::new_unchecked(f, rank))
        .find(|sq| is_castling_rook(v, board, *sq, side))
}

fn parse_castling(v: &Variant, text: &str, strict: bool, st: &mut BoardState) -> Result<(), FenError> {
    let bad = |c: char| fail(FenValidation::InvalidCastling, c.to_string());
    if text == "-" {
        return Ok(());
    }
    for c in text.chars() {
        if c == '-' {
            continue;
        }
        let side = if c.is_ascii_uppercase() { Side::White } else { Side::Black };
        let upper = c.to_ascii_uppercase();
        let rank = v.castling_rank_of(side);
        let king = castling_king(v, &st.board, side);
        let is_kq = (upper == 'K' || upper == 'Q') && !v.cambodian_moves;

        let sq = if is_kq {
            find_castling_rook(v, &st.board, side, upper == 'K')
        } else if upper.is_ascii_uppercase() && (upper as u8 - b'A') <= v.max_file {
            Some(Square::new_unchecked(upper as u8 - b'A', rank))
        } else {
            None
        };
        let Some(sq) = sq else {
            if strict {
                return Err(bad(c));
            }
            warn!(flag = %c, "dropping castling flag without a rook");
            continue;
        };
        let own_piece = st.board.get(sq).map_or(false, |p| p.side == side);

        if v.cambodian_moves || v.gating {
            if !own_piece {
                if strict {
                    return Err(bad(c));
                }
                warn!(flag = %c, "dropping gate on an empty square");
                continue;
            }
            st.gates.set(sq);
            if v.cambodian_moves {
                continue;
            }
            if is_kq {
                if let Some(k) = king {
                    st.gates.set(k);
                }
            } else if st.board.hand_count(side) > 0 || v.captures_to_hand {
                continue;
            }
        }

        if king.is_some() && is_castling_rook(v, &st.board, sq, side) {
            st.castling_rights.set(sq);
        } else if strict {
            return Err(bad(c));
        } else {
            warn!(flag = %c, "dropping castling right without king or rook");
        }
    }

    // 入场变体的 960 写法：王格有入场标记时恢复车的易位权
    if v.gating {
        for side in Side::ALL {
            let rank = Bitboard::rank(v.castling_rank_of(side), v.max_file);
            let Some(king) = castling_king(v, &st.board, side) else { continue };
            let has_hand = st.board.hand_count(side) > 0 || v.captures_to_hand;
            if st.gates.contains(king) && (st.castling_rights & rank).is_empty() && has_hand {
                for sq in (st.gates & rank).iter() {
                    if is_castling_rook(v, &st.board, sq, side) {
                        st.castling_rights.set(sq);
                    }
                }
            }
        }
    }
    Ok(())
}

fn parse_ep(v: &Variant, text: &str, strict: bool, st: &mut BoardState) -> Result<(), FenError> {
    if text == "-" {
        return Ok(());
    }
    if v.counting_rule != CountingRule::None && is_number(text) {
        return match text.parse::<u32>() {
            Ok(limit) => {
                st.counting_limit = limit;
                Ok(())
            }
            Err(_) => Err(fail(FenValidation::InvalidCounting, text)),
        };
    }
    let sq = Square::parse(text).filter(|sq| sq.file() <= v.max_file && sq.rank() <= v.max_rank);
    let Some(sq) = sq else {
        return if strict {
            Err(fail(FenValidation::InvalidEnPassant, text))
        } else {
            Ok(())
        };
    };

    // 只保留确实可以吃过路兵的格子
    let us = st.side_to_move;
    let them = us.opponent();
    let push = if them == Side::White { 1 } else { -1 };
    let victim = sq
        .offset(0, push, v.max_file, v.max_rank)
        .and_then(|s| st.board.get(s))
        .map_or(false, |p| p.side == them && v.is_promotion_pawn(them, p.piece_type));
    let capturer = st.board.pieces(us).iter().any(|from| {
        st.board.get(from).map_or(false, |p| {
            v.is_promotion_pawn(us, p.piece_type) && reach(v, &st.board, from, p, false).capture.contains(sq)
        })
    });
    if victim && capturer && !st.board.blockers().contains(sq) {
        st.ep_squares.set(sq);
    }
    Ok(())
}

/// 变体的将军次数上限：取自初始局面的计数字段，缺省为 3
fn check_limit(v: &Variant) -> u32 {
    v.start_fen
        .split_whitespace()
        .skip(1)
        .find(|f| f.contains('+') && !f.starts_with('+'))
        .and_then(|f| f.split('+').filter_map(|n| n.parse::<u32>().ok()).max())
        .unwrap_or(DEFAULT_CHECKS)
}

/// `w+b` 形式的两个计数；超过上限时严格模式报错，宽松模式截断
fn parse_checks(text: &str, strict: bool, limit: u32) -> Result<[u32; 2], FenError> {
    let counts: Vec<Option<u32>> = text.split('+').map(|p| p.parse().ok()).collect();
    match counts.as_slice() {
        [Some(w), Some(b)] if *w <= limit && *b <= limit => Ok([*w, *b]),
        _ if strict => Err(fail(FenValidation::InvalidCheckCount, text)),
        [Some(w), Some(b), ..] => Ok([(*w).min(limit), (*b).min(limit)]),
        _ => Ok([limit, limit]),
    }
}

/// 输出 FEN；`visible` 给出时其余格子输出为 `*`
fn render(v: &Variant, st: &BoardState, opts: &FenOptions, visible: Option<Bitboard>) -> String {
    let board = &st.board;
    let mut out = String::new();

    for rank in (0..=v.max_rank).rev() {
        let mut empty = 0;
        for file in 0..=v.max_file {
            let sq = Square::new_unchecked(file, rank);
            let hidden = visible.map_or(false, |vis| !vis.contains(sq));
            let token = match board.get(sq) {
                _ if hidden || board.walls().contains(sq) => Some("*".to_string()),
                Some(piece) => Some(piece_token(v, board, sq, piece, opts)),
                None => None,
            };
            match token {
                Some(t) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    out.push_str(&t);
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
        if rank > 0 {
            out.push('/');
        }
    }

    if opts.sfen {
        return render_sfen_tail(v, st, out);
    }

    if v.has_hand() {
        out.push('[');
        out.push_str(&hand_string(v, board));
        out.push(']');
    }

    out.push(' ');
    out.push(st.side_to_move.to_fen_char());
    out.push(' ');
    out.push_str(&castling_string(v, st, opts.chess960));

    let (limit, ply) = counting_fields(v, st, opts.count_started);
    out.push(' ');
    if limit > 0 {
        out.push_str(&limit.to_string());
    } else {
        match st.ep_squares.lsb() {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }
    }
    if v.check_counting {
        out.push_str(&format!(" {}+{}", st.checks_remaining[0], st.checks_remaining[1]));
    }
    let halfmove = if limit > 0 { ply } else { st.rule50 };
    out.push_str(&format!(" {} {}", halfmove, st.fullmove_number()));
    out
}

fn piece_token(v: &Variant, board: &Board, sq: Square, piece: Piece, opts: &FenOptions) -> String {
    if let Some(original) = board.unpromoted(sq) {
        return format!("+{}", v.piece_char(Piece::new(original, piece.side)));
    }
    let mut token = v.piece_char(piece).to_string();
    if board.is_promoted(sq) && (opts.show_promoted || (v.captures_to_hand && !v.drop_loop)) {
        token.push('~');
    }
    token
}

/// 手中棋子：先白后黑，各自从大到小
fn hand_string(v: &Variant, board: &Board) -> String {
    let mut out = String::new();
    for side in Side::ALL {
        let mut types: Vec<PieceType> = v.piece_types(side).collect();
        types.sort_by(|a, b| b.cmp(a));
        for pt in types {
            let c = v.piece_char(Piece::new(pt, side));
            for _ in 0..board.hand(side, pt) {
                out.push(c);
            }
        }
    }
    out
}

fn render_sfen_tail(v: &Variant, st: &BoardState, mut out: String) -> String {
    out.push(' ');
    out.push(if st.side_to_move == Side::White { 'b' } else { 'w' });
    out.push(' ');
    let mut hand = String::new();
    for side in Side::ALL {
        let mut types: Vec<PieceType> = v.piece_types(side).collect();
        types.sort_by(|a, b| b.cmp(a));
        for pt in types {
            let n = st.board.hand(side, pt);
            if n > 1 {
                hand.push_str(&n.to_string());
            }
            if n > 0 {
                hand.push(v.piece_char(Piece::new(pt, side)));
            }
        }
    }
    if hand.is_empty() {
        hand.push('-');
    }
    out.push_str(&hand);
    out.push_str(&format!(" {}", st.game_ply + 1));
    out
}

/// 易位与入场字段
fn castling_string(v: &Variant, st: &BoardState, chess960: bool) -> String {
    let board = &st.board;
    let mut out = String::new();
    for side in Side::ALL {
        let rank = Bitboard::rank(v.castling_rank_of(side), v.max_file);
        let king = castling_king(v, board, side);
        let case = |c: char| match side {
            Side::White => c,
            Side::Black => c.to_ascii_lowercase(),
        };
        let file_letter = |sq: Square| (b'A' + sq.file()) as char;

        let rights = st.castling_rights & rank;
        let mut covered = Bitboard::EMPTY;
        if let Some(k) = king {
            let mut sorted: Vec<Square> = rights.iter().collect();
            sorted.sort_by_key(|sq| (sq.file() < k.file(), std::cmp::Reverse(sq.file())));
            for sq in sorted {
                let kingside = sq.file() > k.file();
                let c = if chess960 {
                    file_letter(sq)
                } else if kingside {
                    'K'
                } else {
                    'Q'
                };
                out.push(case(c));
                covered.set(sq);
            }
            if !rights.is_empty() && !chess960 {
                covered.set(k);
            }
        }

        let show_gates = v.cambodian_moves
            || (v.gating && (board.hand_count(side) > 0 || v.captures_to_hand));
        if show_gates {
            for sq in (st.gates & rank & !covered).iter() {
                out.push(case(file_letter(sq)));
            }
        }
    }
    if out.is_empty() {
        out.push('-');
    }
    out
}

/// 数子规则的输出值 (上限, 计数)
fn counting_fields(v: &Variant, st: &BoardState, count_started: i32) -> (u32, u32) {
    let (limit, ply) = (st.counting_limit, st.counting_ply);
    if count_started == 0 || limit == 0 {
        return (limit, ply);
    }
    let cs = count_started as i64;
    let since_start = (1 + st.game_ply as i64 - cs).max(0);
    let piece_honor = Side::ALL.into_iter().any(|s| is_bare(v, &st.board, s));
    if piece_honor {
        if v.counting_rule != CountingRule::Asean && cs > 0 {
            let board_limit: i64 = if v.counting_rule == CountingRule::Cambodian { 126 } else { 128 };
            if board_limit - since_start < limit as i64 - ply as i64 {
                return (board_limit as u32, since_start as u32);
            }
        }
        return (limit, ply);
    }
    if cs < 0 {
        return (limit, 0);
    }
    (limit, ply.min(since_start as u32))
}
