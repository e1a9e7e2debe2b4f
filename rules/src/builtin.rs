//! 内置变体
//!
//! 每个变体从国际象棋或空白模板出发，逐项改写规则。

use std::cmp::Reverse;

use crate::bitboard::Bitboard;
use crate::piece::{PieceType, Side, Square};
use crate::variant::{
    ranks_bb, ChasingRule, CountingRule, EnclosingRule, GameValue, MaterialCounting, Variant,
    VariantTemplate, WallingRule,
};

/// 全部内置变体名
pub const NAMES: &[&str] = &[
    "chess",
    "fischerandom",
    "makruk",
    "makpong",
    "cambodian",
    "asean",
    "ai-wok",
    "sittuyin",
    "shatranj",
    "amazon",
    "hoppelpoppel",
    "almost",
    "chigorin",
    "shatar",
    "losalamos",
    "kingofthehill",
    "racingkings",
    "losers",
    "giveaway",
    "antichess",
    "suicide",
    "codrus",
    "extinction",
    "kinglet",
    "horde",
    "3check",
    "5check",
    "crazyhouse",
    "loop",
    "chessgi",
    "pocketknight",
    "placement",
    "bughouse",
    "newzealand",
    "atomic",
    "duck",
    "seirawan",
    "shouse",
    "capablanca",
    "capahouse",
    "grand",
    "shako",
    "tencubed",
    "spartan",
    "xiangqi",
    "janggi",
    "shogi",
    "minishogi",
    "kyotoshogi",
    "yarishogi",
    "euroshogi",
    "judkinshogi",
    "clobber",
    "breakthrough",
    "connect4",
    "tictactoe",
    "ataxx",
    "flipello",
    "chess-nocastle",
    "standard",
    "nocheckatomic",
    "antiatomic",
];

/// 按名称构造内置变体
pub fn by_name(name: &str) -> Option<Variant> {
    let mut v = match name {
        "chess" | "standard" => Variant::chess(),
        "fischerandom" => fischerandom(),
        "chess-nocastle" => nocastle(),
        "makruk" => makruk(),
        "makpong" => makpong(),
        "cambodian" => cambodian(),
        "asean" => asean(),
        "ai-wok" => aiwok(),
        "sittuyin" => sittuyin(),
        "shatranj" => shatranj(),
        "amazon" => amazon(),
        "hoppelpoppel" => hoppelpoppel(),
        "almost" => almost(),
        "chigorin" => chigorin(),
        "shatar" => shatar(),
        "losalamos" => losalamos(),
        "kingofthehill" => kingofthehill(),
        "racingkings" => racingkings(),
        "losers" => losers(),
        "giveaway" => giveaway(),
        "antichess" => antichess(),
        "suicide" => suicide(),
        "codrus" => codrus(),
        "extinction" => extinction(),
        "kinglet" => kinglet(),
        "horde" => horde(),
        "3check" => check_counting(3),
        "5check" => check_counting(5),
        "crazyhouse" => crazyhouse(),
        "loop" => loop_chess(),
        "chessgi" => chessgi(),
        "pocketknight" => pocketknight(),
        "placement" => placement(),
        "bughouse" => bughouse(),
        "newzealand" => newzealand(),
        "atomic" => atomic(),
        "nocheckatomic" => nocheckatomic(),
        "antiatomic" => antiatomic(),
        "duck" => duck(),
        "seirawan" => seirawan(),
        "shouse" => shouse(),
        "capablanca" => capablanca(),
        "capahouse" => capahouse(),
        "grand" => grand(),
        "shako" => shako(),
        "tencubed" => tencubed(),
        "spartan" => spartan(),
        "xiangqi" => xiangqi(),
        "janggi" => janggi(),
        "shogi" => shogi(),
        "minishogi" => minishogi(),
        "kyotoshogi" => kyotoshogi(),
        "yarishogi" => yarishogi(),
        "euroshogi" => euroshogi(),
        "judkinshogi" => judkinshogi(),
        "clobber" => clobber(),
        "breakthrough" => breakthrough(),
        "connect4" => connect4(),
        "tictactoe" => tictactoe(),
        "ataxx" => ataxx(),
        "flipello" => flipello(),
        _ => return None,
    };
    v.name = name.to_string();
    Some(v)
}

/// 格子列表构成的区域
fn squares(list: &[&str]) -> Bitboard {
    list.iter().filter_map(|s| Square::parse(s)).collect()
}

/// 九宫（d..f 列，己方三行）
fn palace(v: &Variant, side: Side) -> Bitboard {
    let ranks = match side {
        Side::White => 0..=2,
        Side::Black => v.max_rank - 2..=v.max_rank,
    };
    let rows = ranks_bb(ranks, v.max_file);
    (3..=5).fold(Bitboard::EMPTY, |bb, f| bb | Bitboard::file(f, v.max_rank)) & rows
}

/// 双方相同的升变列表（按棋子类型降序排列）
fn set_promotions(v: &mut Variant, mut types: Vec<PieceType>) {
    types.sort_by_key(|pt| Reverse(*pt));
    v.promotion_piece_types = [types.clone(), types];
}

/// 升变区：各方对方底线起 `depth` 行
fn set_promotion_zone(v: &mut Variant, depth: u8) {
    let (mf, mr) = (v.max_file, v.max_rank);
    v.promotion_region = [
        ranks_bb(mr + 1 - depth..=mr, mf),
        ranks_bb(0..depth, mf),
    ];
}

/// 以平民代替王（非王室）
fn commoner_king(v: &mut Variant) {
    v.remove_piece(PieceType::King);
    v.add_builtin(PieceType::Commoner, 'k');
    v.castling_king_piece = PieceType::Commoner;
}

fn no_pawn_extras(v: &mut Variant) {
    v.double_step = false;
    v.castling = false;
}

pub fn fischerandom() -> Variant {
    let mut v = Variant::chess();
    v.chess960 = true;
    v
}

fn nocastle() -> Variant {
    let mut v = Variant::chess();
    v.start_fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1".to_string();
    v.castling = false;
    v
}

// 泰国象棋一族

pub fn makruk() -> Variant {
    let mut v = Variant::chess();
    v.remove_piece(PieceType::Bishop);
    v.remove_piece(PieceType::Queen);
    v.add_builtin(PieceType::Silver, 's');
    v.add_builtin(PieceType::Fers, 'm');
    v.start_fen = "rnsmksnr/8/pppppppp/8/8/PPPPPPPP/8/RNSKMSNR w - - 0 1".to_string();
    set_promotion_zone(&mut v, 3);
    set_promotions(&mut v, vec![PieceType::Fers]);
    no_pawn_extras(&mut v);
    v.n_move_rule = 0;
    v.counting_rule = CountingRule::Makruk;
    v
}

pub fn makpong() -> Variant {
    let mut v = makruk();
    v.makpong_rule = true;
    v
}

pub fn cambodian() -> Variant {
    let mut v = makruk();
    v.start_fen = "rnsmksnr/8/pppppppp/8/8/PPPPPPPP/8/RNSKMSNR w DEde - 0 1".to_string();
    v.gating = true;
    v.cambodian_moves = true;
    v.counting_rule = CountingRule::Cambodian;
    v
}

pub fn asean() -> Variant {
    let mut v = Variant::chess();
    v.remove_piece(PieceType::Bishop);
    v.remove_piece(PieceType::Queen);
    v.add_builtin(PieceType::Silver, 'b');
    v.add_builtin(PieceType::Fers, 'q');
    v.start_fen = "rnbqkbnr/8/pppppppp/8/8/PPPPPPPP/8/RNBQKBNR w - - 0 1".to_string();
    set_promotions(
        &mut v,
        vec![PieceType::Rook, PieceType::Knight, PieceType::Silver, PieceType::Fers],
    );
    no_pawn_extras(&mut v);
    v.counting_rule = CountingRule::Asean;
    v
}

pub fn aiwok() -> Variant {
    let mut v = makruk();
    v.remove_piece(PieceType::Fers);
    v.add_builtin(PieceType::Aiwok, 'a');
    v.start_fen = "rnsaksnr/8/pppppppp/8/8/PPPPPPPP/8/RNSKASNR w - - 0 1".to_string();
    set_promotions(&mut v, vec![PieceType::Aiwok]);
    v
}

pub fn sittuyin() -> Variant {
    let mut v = makruk();
    v.remove_piece(PieceType::Fers);
    v.add_builtin(PieceType::Fers, 'f');
    v.start_fen = "8/8/4pppp/pppp4/4PPPP/PPPP4/8/8[KFRRSSNNkfrrssnn] w - - 0 1".to_string();
    v.piece_drops = true;
    v.must_drop = true;
    v.drop_region = [ranks_bb(0..=2, v.max_file), ranks_bb(5..=7, v.max_file)];
    v.sittuyin_rook_drop = true;
    v.sittuyin_promotion = true;
    v.promotion_region = [
        squares(&["a8", "b7", "c6", "d5", "e5", "f6", "g7", "h8"]),
        squares(&["a1", "b2", "c3", "d4", "e4", "f3", "g2", "h1"]),
    ];
    v.promotion_limit.insert(PieceType::Fers, 1);
    v.mandatory_pawn_promotion = false;
    v.immobility_illegal = false;
    v.counting_rule = CountingRule::Asean;
    v.n_move_rule = 50;
    v
}

// 国际象棋的古典与现代变体

pub fn shatranj() -> Variant {
    let mut v = Variant::chess();
    v.remove_piece(PieceType::Bishop);
    v.remove_piece(PieceType::Queen);
    v.add_builtin(PieceType::Alfil, 'b');
    v.add_builtin(PieceType::Fers, 'q');
    v.start_fen = "rnbkqbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBKQBNR w - - 0 1".to_string();
    set_promotions(&mut v, vec![PieceType::Fers]);
    no_pawn_extras(&mut v);
    v.bare_king_value = GameValue::Loss;
    v.bare_king_move = true;
    v.stalemate_value = GameValue::Loss;
    v
}

pub fn amazon() -> Variant {
    let mut v = Variant::chess();
    v.remove_piece(PieceType::Queen);
    v.add_builtin(PieceType::Amazon, 'a');
    v.start_fen = "rnbakbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBAKBNR w KQkq - 0 1".to_string();
    set_promotions(
        &mut v,
        vec![PieceType::Amazon, PieceType::Rook, PieceType::Bishop, PieceType::Knight],
    );
    v
}

pub fn hoppelpoppel() -> Variant {
    let mut v = Variant::chess();
    v.remove_piece(PieceType::Knight);
    v.remove_piece(PieceType::Bishop);
    v.add_builtin(PieceType::Knibis, 'n');
    v.add_builtin(PieceType::Biskni, 'b');
    set_promotions(
        &mut v,
        vec![PieceType::Queen, PieceType::Rook, PieceType::Biskni, PieceType::Knibis],
    );
    v
}

pub fn almost() -> Variant {
    let mut v = Variant::chess();
    v.remove_piece(PieceType::Queen);
    v.add_builtin(PieceType::Chancellor, 'c');
    v.start_fen = "rnbckbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBCKBNR w KQkq - 0 1".to_string();
    set_promotions(
        &mut v,
        vec![PieceType::Chancellor, PieceType::Rook, PieceType::Bishop, PieceType::Knight],
    );
    v
}

pub fn chigorin() -> Variant {
    let mut v = Variant::chess();
    v.add_builtin(PieceType::Chancellor, 'c');
    v.start_fen = "rbbqkbbr/pppppppp/8/8/8/8/PPPPPPPP/RNNCKNNR w KQkq - 0 1".to_string();
    set_promotions(
        &mut v,
        vec![
            PieceType::Queen,
            PieceType::Chancellor,
            PieceType::Rook,
            PieceType::Bishop,
            PieceType::Knight,
        ],
    );
    v
}

pub fn shatar() -> Variant {
    let mut v = Variant::chess();
    v.remove_piece(PieceType::Queen);
    v.add_builtin(PieceType::Bers, 'j');
    v.start_fen = "rnbjkbnr/ppp1pppp/8/3p4/3P4/8/PPP1PPPP/RNBJKBNR w - - 0 1".to_string();
    set_promotions(&mut v, vec![PieceType::Bers]);
    no_pawn_extras(&mut v);
    v.bare_king_value = GameValue::Draw;
    v
}

pub fn losalamos() -> Variant {
    let mut v = Variant::chess();
    v.set_dimensions(5, 5);
    v.remove_piece(PieceType::Bishop);
    v.start_fen = "rnqknr/pppppp/6/6/PPPPPP/RNQKNR w - - 0 1".to_string();
    set_promotions(&mut v, vec![PieceType::Queen, PieceType::Rook, PieceType::Knight]);
    no_pawn_extras(&mut v);
    v
}

pub fn kingofthehill() -> Variant {
    let mut v = Variant::chess();
    let hill = squares(&["d4", "e4", "d5", "e5"]);
    v.flag_piece = Some(PieceType::King);
    v.flag_region = [hill, hill];
    v
}

pub fn racingkings() -> Variant {
    let mut v = Variant::chess();
    v.start_fen = "8/8/8/8/8/8/krbnNBRK/qrbnNBRQ w - - 0 1".to_string();
    let goal = Bitboard::rank(7, v.max_file);
    v.flag_piece = Some(PieceType::King);
    v.flag_region = [goal, goal];
    v.flag_move = true;
    v.castling = false;
    v.checking = false;
    v
}

pub fn losers() -> Variant {
    let mut v = Variant::chess();
    v.checkmate_value = GameValue::Win;
    v.stalemate_value = GameValue::Win;
    v.bare_king_value = GameValue::Win;
    v.bare_king_move = false;
    v.must_capture = true;
    v
}

pub fn giveaway() -> Variant {
    let mut v = Variant::chess();
    commoner_king(&mut v);
    set_promotions(
        &mut v,
        vec![
            PieceType::Commoner,
            PieceType::Queen,
            PieceType::Rook,
            PieceType::Bishop,
            PieceType::Knight,
        ],
    );
    v.stalemate_value = GameValue::Win;
    v.extinction_value = GameValue::Win;
    v.extinction_piece_types = None;
    v.must_capture = true;
    v
}

pub fn antichess() -> Variant {
    let mut v = giveaway();
    v.start_fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1".to_string();
    v.castling = false;
    v
}

pub fn suicide() -> Variant {
    let mut v = antichess();
    v.stalemate_value = GameValue::Draw;
    v.stalemate_piece_count = true;
    v
}

pub fn codrus() -> Variant {
    let mut v = Variant::chess();
    commoner_king(&mut v);
    v.extinction_value = GameValue::Win;
    v.extinction_piece_types = Some(vec![PieceType::Commoner]);
    v.must_capture = true;
    v
}

pub fn extinction() -> Variant {
    let mut v = Variant::chess();
    commoner_king(&mut v);
    set_promotions(
        &mut v,
        vec![
            PieceType::Commoner,
            PieceType::Queen,
            PieceType::Rook,
            PieceType::Bishop,
            PieceType::Knight,
        ],
    );
    v.extinction_value = GameValue::Loss;
    v.extinction_piece_types = Some(vec![
        PieceType::Commoner,
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
        PieceType::Pawn,
    ]);
    v
}

pub fn kinglet() -> Variant {
    let mut v = Variant::chess();
    commoner_king(&mut v);
    set_promotions(&mut v, vec![PieceType::Commoner]);
    v.extinction_value = GameValue::Loss;
    v.extinction_piece_types = Some(vec![PieceType::Pawn]);
    v
}

pub fn horde() -> Variant {
    let mut v = Variant::chess();
    v.start_fen =
        "rnbqkbnr/pppppppp/8/1PP2PP1/PPPPPPPP/PPPPPPPP/PPPPPPPP/PPPPPPPP w kq - 0 1".to_string();
    v.double_step_region[Side::White.index()] = ranks_bb(0..=1, v.max_file);
    v.extinction_value = GameValue::Loss;
    v.extinction_piece_types = None;
    v
}

pub fn check_counting(checks: u32) -> Variant {
    let mut v = Variant::chess();
    v.start_fen = format!(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - {}+{} 0 1",
        checks, checks
    );
    v.check_counting = true;
    v
}

// 打入类

pub fn crazyhouse() -> Variant {
    let mut v = Variant::chess();
    v.start_fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR[] w KQkq - 0 1".to_string();
    v.piece_drops = true;
    v.captures_to_hand = true;
    v
}

pub fn loop_chess() -> Variant {
    let mut v = crazyhouse();
    v.drop_loop = true;
    v
}

pub fn chessgi() -> Variant {
    let mut v = loop_chess();
    v.first_rank_pawn_drops = true;
    v
}

pub fn pocketknight() -> Variant {
    let mut v = Variant::chess();
    v.start_fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR[Nn] w KQkq - 0 1".to_string();
    v.piece_drops = true;
    v.captures_to_hand = false;
    v
}

pub fn placement() -> Variant {
    let mut v = Variant::chess();
    v.start_fen = "8/pppppppp/8/8/8/8/PPPPPPPP/8[KQRRBBNNkqrrbbnn] w - - 0 1".to_string();
    v.piece_drops = true;
    v.must_drop = true;
    v.drop_region = [Bitboard::rank(0, v.max_file), Bitboard::rank(7, v.max_file)];
    v.drop_opposite_colored_bishop = true;
    v.castling_dropped_piece = true;
    v
}

pub fn bughouse() -> Variant {
    let mut v = crazyhouse();
    v.two_boards = true;
    v.captures_to_hand = false;
    v.stalemate_value = GameValue::Loss;
    v
}

pub fn newzealand() -> Variant {
    let mut v = Variant::chess();
    v.remove_piece(PieceType::Rook);
    v.remove_piece(PieceType::Knight);
    v.add_builtin(PieceType::Rookni, 'r');
    v.add_builtin(PieceType::Kniroo, 'n');
    v.castling_rook_pieces = vec![PieceType::Rookni];
    set_promotions(
        &mut v,
        vec![PieceType::Queen, PieceType::Rookni, PieceType::Bishop, PieceType::Kniroo],
    );
    v
}

pub fn atomic() -> Variant {
    let mut v = Variant::chess();
    commoner_king(&mut v);
    v.extinction_value = GameValue::Loss;
    v.extinction_piece_types = Some(vec![PieceType::Commoner]);
    v.extinction_pseudo_royal = true;
    v.blast_on_capture = true;
    v
}

pub fn nocheckatomic() -> Variant {
    let mut v = atomic();
    v.extinction_pseudo_royal = false;
    v
}

pub fn antiatomic() -> Variant {
    let mut v = atomic();
    v.extinction_pseudo_royal = false;
    v.extinction_value = GameValue::Win;
    v.extinction_piece_types = None;
    v.stalemate_value = GameValue::Win;
    v.must_capture = true;
    v.castling = false;
    v.start_fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1".to_string();
    v
}

pub fn duck() -> Variant {
    let mut v = Variant::chess();
    commoner_king(&mut v);
    v.walling_rule = WallingRule::Duck;
    v.stalemate_value = GameValue::Win;
    v.extinction_value = GameValue::Loss;
    v.extinction_piece_types = Some(vec![PieceType::Commoner]);
    v
}

// 大子力变体

const GATING_PROMOTIONS: [PieceType; 6] = [
    PieceType::Archbishop,
    PieceType::Chancellor,
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

pub fn seirawan() -> Variant {
    let mut v = Variant::chess();
    v.add_builtin(PieceType::Archbishop, 'h');
    v.add_builtin(PieceType::Chancellor, 'e');
    v.start_fen =
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR[HEhe] w KQBCDFGkqbcdfg - 0 1".to_string();
    v.gating = true;
    v.seirawan_gating = true;
    set_promotions(&mut v, GATING_PROMOTIONS.to_vec());
    v
}

pub fn shouse() -> Variant {
    let mut v = seirawan();
    v.piece_drops = true;
    v.captures_to_hand = true;
    v
}

pub fn capablanca() -> Variant {
    let mut v = Variant::chess();
    v.set_dimensions(9, 7);
    v.add_builtin(PieceType::Archbishop, 'a');
    v.add_builtin(PieceType::Chancellor, 'c');
    v.start_fen =
        "rnabqkbcnr/pppppppppp/10/10/10/10/PPPPPPPPPP/RNABQKBCNR w KQkq - 0 1".to_string();
    v.castling_kingside_file = 8;
    v.castling_queenside_file = 2;
    set_promotions(&mut v, GATING_PROMOTIONS.to_vec());
    v
}

pub fn capahouse() -> Variant {
    let mut v = capablanca();
    v.start_fen =
        "rnabqkbcnr/pppppppppp/10/10/10/10/PPPPPPPPPP/RNABQKBCNR[] w KQkq - 0 1".to_string();
    v.piece_drops = true;
    v.captures_to_hand = true;
    v
}

pub fn grand() -> Variant {
    let mut v = Variant::chess();
    v.set_dimensions(9, 9);
    v.add_builtin(PieceType::Archbishop, 'a');
    v.add_builtin(PieceType::Chancellor, 'c');
    v.start_fen =
        "r8r/1nbqkcabn1/pppppppppp/10/10/10/10/PPPPPPPPPP/1NBQKCABN1/R8R w - - 0 1".to_string();
    set_promotion_zone(&mut v, 3);
    set_promotions(&mut v, GATING_PROMOTIONS.to_vec());
    for (pt, limit) in [
        (PieceType::Queen, 1),
        (PieceType::Archbishop, 1),
        (PieceType::Chancellor, 1),
        (PieceType::Rook, 2),
        (PieceType::Bishop, 2),
        (PieceType::Knight, 2),
    ] {
        v.promotion_limit.insert(pt, limit);
    }
    v.mandatory_pawn_promotion = false;
    v.immobility_illegal = true;
    v.double_step_region = [Bitboard::rank(2, v.max_file), Bitboard::rank(7, v.max_file)];
    v.castling = false;
    v
}

pub fn shako() -> Variant {
    let mut v = Variant::chess();
    v.set_dimensions(9, 9);
    v.add_builtin(PieceType::FersAlfil, 'e');
    v.add_builtin(PieceType::Cannon, 'c');
    v.start_fen =
        "c8c/ernbqkbnre/pppppppppp/10/10/10/10/PPPPPPPPPP/ERNBQKBNRE/C8C w KQkq - 0 1".to_string();
    set_promotions(
        &mut v,
        vec![
            PieceType::Queen,
            PieceType::Rook,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Cannon,
            PieceType::FersAlfil,
        ],
    );
    v.castling_kingside_file = 7;
    v.castling_queenside_file = 3;
    v.castling_rank = 1;
    v.double_step_region = [Bitboard::rank(2, v.max_file), Bitboard::rank(7, v.max_file)];
    v
}

pub fn tencubed() -> Variant {
    let mut v = Variant::chess();
    v.set_dimensions(9, 9);
    v.add_builtin(PieceType::Archbishop, 'a');
    v.add_builtin(PieceType::Chancellor, 'm');
    // champion 与 wizard
    v.add_builtin_with(PieceType::Custom(1), 'c', "WAD");
    v.add_builtin_with(PieceType::Custom(2), 'w', "CF");
    v.start_fen =
        "2cwamwc2/1rnbqkbnr1/pppppppppp/10/10/10/10/PPPPPPPPPP/1RNBQKBNR1/2CWAMWC2 w - - 0 1"
            .to_string();
    set_promotions(
        &mut v,
        vec![PieceType::Archbishop, PieceType::Chancellor, PieceType::Queen],
    );
    v.double_step_region = [Bitboard::rank(2, v.max_file), Bitboard::rank(7, v.max_file)];
    v.castling = false;
    v
}

/// 斯巴达象棋：黑方为自定义兵种，可以有两个王
pub fn spartan() -> Variant {
    let mut v = Variant::chess();
    let (hoplite, lieutenant, general, warlord, captain) = (
        PieceType::Custom(1),
        PieceType::Custom(2),
        PieceType::Custom(3),
        PieceType::Custom(4),
        PieceType::Custom(5),
    );
    v.add_builtin_for(PieceType::Pawn, 'p', PieceType::Pawn.default_betza(), Side::White);
    v.add_builtin_for(PieceType::Queen, 'q', "Q", Side::White);
    v.add_builtin_for(hoplite, 'h', "fcWfmFifmnA", Side::Black);
    v.add_builtin_for(lieutenant, 'l', "FAsmW", Side::Black);
    v.add_builtin_for(general, 'g', "RF", Side::Black);
    v.add_builtin_for(warlord, 'w', "BN", Side::Black);
    v.add_builtin_for(captain, 'c', "WD", Side::Black);
    v.start_fen = "lgkcckwl/hhhhhhhh/8/8/8/8/PPPPPPPP/RNBQKBNR w KQ - 0 1".to_string();
    v.promotion_pawn_types = [vec![PieceType::Pawn], vec![hoplite]];
    let mut black = vec![general, warlord, PieceType::King, captain, lieutenant];
    black.sort_by_key(|pt| Reverse(*pt));
    v.promotion_piece_types[Side::Black.index()] = black;
    v.promotion_limit.insert(PieceType::King, 2);
    v.duple_check = true;
    v
}

// 东亚象棋

/// 象棋
pub fn xiangqi() -> Variant {
    let mut v = Variant::fairy_template();
    v.name = "xiangqi".to_string();
    v.set_dimensions(8, 9);
    v.add_builtin(PieceType::Rook, 'r');
    v.add_builtin(PieceType::Horse, 'n');
    v.set_synonym(PieceType::Horse, 'h');
    v.add_builtin(PieceType::Elephant, 'b');
    v.set_synonym(PieceType::Elephant, 'e');
    v.add_builtin(PieceType::Fers, 'a');
    v.add_builtin_with(PieceType::King, 'k', "W");
    v.add_builtin(PieceType::Cannon, 'c');
    v.add_builtin(PieceType::Soldier, 'p');
    v.start_fen =
        "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1".to_string();

    let palaces = [palace(&v, Side::White), palace(&v, Side::Black)];
    v.mobility_region.insert(PieceType::King, palaces);
    v.mobility_region.insert(PieceType::Fers, palaces);
    v.mobility_region.insert(
        PieceType::Elephant,
        [ranks_bb(0..=4, v.max_file), ranks_bb(5..=9, v.max_file)],
    );

    v.promotion_pawn_types = [Vec::new(), Vec::new()];
    v.promotion_region = [Bitboard::EMPTY; 2];
    v.double_step = false;
    v.en_passant = false;
    v.castling = false;
    v.xiangqi_soldier = true;
    v.flying_general = true;
    v.stalemate_value = GameValue::Loss;
    v.perpetual_check_illegal = true;
    v.chasing_rule = ChasingRule::Axf;
    v
}

/// 韩国象棋
pub fn janggi() -> Variant {
    let mut v = Variant::fairy_template();
    v.set_dimensions(8, 9);
    v.add_builtin(PieceType::Rook, 'r');
    v.add_builtin(PieceType::Horse, 'n');
    v.set_synonym(PieceType::Horse, 'h');
    v.add_builtin(PieceType::JanggiElephant, 'b');
    v.set_synonym(PieceType::JanggiElephant, 'e');
    v.add_builtin(PieceType::Wazir, 'a');
    v.add_builtin_with(PieceType::King, 'k', "W");
    v.add_builtin(PieceType::JanggiCannon, 'c');
    v.add_builtin_with(PieceType::Soldier, 'p', "fsW");
    v.start_fen =
        "rnba1abnr/4k4/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/4K4/RNBA1ABNR w - - 0 1".to_string();

    let palaces = [palace(&v, Side::White), palace(&v, Side::Black)];
    v.mobility_region.insert(PieceType::King, palaces);
    v.mobility_region.insert(PieceType::Wazir, palaces);
    v.diagonal_lines = squares(&["d1", "f1", "e2", "d3", "f3", "d8", "f8", "e9", "d10", "f10"]);

    v.promotion_pawn_types = [Vec::new(), Vec::new()];
    v.promotion_region = [Bitboard::EMPTY; 2];
    v.double_step = false;
    v.en_passant = false;
    v.castling = false;
    v.pass = true;
    v.bikjang = true;
    v.material_counting = MaterialCounting::Janggi;
    v.stalemate_value = GameValue::Loss;
    v.perpetual_check_illegal = true;
    v.n_move_rule = 0;
    v
}

/// 将棋类的共同规则
fn shogi_base(max_file: u8, max_rank: u8, zone: u8) -> Variant {
    let mut v = Variant::fairy_template();
    v.template = VariantTemplate::Shogi;
    v.set_dimensions(max_file, max_rank);
    set_promotion_zone(&mut v, zone);
    v.piece_drops = true;
    v.captures_to_hand = true;
    v.double_step = false;
    v.en_passant = false;
    v.castling = false;
    v.drop_no_doubled = Some(PieceType::ShogiPawn);
    v.immobility_illegal = true;
    v.shogi_pawn_drop_mate_illegal = true;
    v.first_rank_pawn_drops = true;
    v.promotion_zone_pawn_drops = true;
    v.stalemate_value = GameValue::Loss;
    v.n_fold_rule = 4;
    v.n_move_rule = 0;
    v.perpetual_check_illegal = true;
    v
}

fn add_shogi_pieces(v: &mut Variant, pieces: &[(PieceType, char)]) {
    for &(pt, letter) in pieces {
        v.add_builtin(pt, letter);
    }
}

fn promote(v: &mut Variant, pairs: &[(PieceType, PieceType)]) {
    for &(from, to) in pairs {
        v.promoted_piece_type.insert(from, to);
    }
}

pub fn shogi() -> Variant {
    let mut v = shogi_base(8, 8, 3);
    add_shogi_pieces(
        &mut v,
        &[
            (PieceType::ShogiPawn, 'p'),
            (PieceType::Lance, 'l'),
            (PieceType::ShogiKnight, 'n'),
            (PieceType::Silver, 's'),
            (PieceType::Gold, 'g'),
            (PieceType::Bishop, 'b'),
            (PieceType::DragonHorse, 'h'),
            (PieceType::Rook, 'r'),
            (PieceType::Bers, 'd'),
            (PieceType::King, 'k'),
        ],
    );
    promote(
        &mut v,
        &[
            (PieceType::ShogiPawn, PieceType::Gold),
            (PieceType::Lance, PieceType::Gold),
            (PieceType::ShogiKnight, PieceType::Gold),
            (PieceType::Silver, PieceType::Gold),
            (PieceType::Bishop, PieceType::DragonHorse),
            (PieceType::Rook, PieceType::Bers),
        ],
    );
    v.start_fen = "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL[-] w - - 0 1".to_string();
    v
}

pub fn minishogi() -> Variant {
    let mut v = shogi_base(4, 4, 1);
    add_shogi_pieces(
        &mut v,
        &[
            (PieceType::ShogiPawn, 'p'),
            (PieceType::Silver, 's'),
            (PieceType::Gold, 'g'),
            (PieceType::Bishop, 'b'),
            (PieceType::DragonHorse, 'h'),
            (PieceType::Rook, 'r'),
            (PieceType::Bers, 'd'),
            (PieceType::King, 'k'),
        ],
    );
    promote(
        &mut v,
        &[
            (PieceType::ShogiPawn, PieceType::Gold),
            (PieceType::Silver, PieceType::Gold),
            (PieceType::Bishop, PieceType::DragonHorse),
            (PieceType::Rook, PieceType::Bers),
        ],
    );
    v.start_fen = "rbsgk/4p/5/P4/KGSBR[-] w 0 1".to_string();
    v
}

/// 京都将棋：每步之后棋子在正反两面之间翻转
pub fn kyotoshogi() -> Variant {
    let mut v = shogi_base(4, 4, 1);
    add_shogi_pieces(
        &mut v,
        &[
            (PieceType::ShogiPawn, 'p'),
            (PieceType::Lance, 'l'),
            (PieceType::ShogiKnight, 'n'),
            (PieceType::Silver, 's'),
            (PieceType::Gold, 'g'),
            (PieceType::Bishop, 'b'),
            (PieceType::Rook, 'r'),
            (PieceType::King, 'k'),
        ],
    );
    promote(
        &mut v,
        &[
            (PieceType::Lance, PieceType::Gold),
            (PieceType::Silver, PieceType::Bishop),
            (PieceType::ShogiKnight, PieceType::Gold),
            (PieceType::ShogiPawn, PieceType::Rook),
        ],
    );
    v.start_fen = "p+nks+l/5/5/5/+LSK+NP[-] w 0 1".to_string();
    let all = v.board_bb();
    v.promotion_region = [all, all];
    v.mandatory_piece_promotion = true;
    v.piece_demotion = true;
    v.drop_promoted = true;
    v.immobility_illegal = false;
    v.shogi_pawn_drop_mate_illegal = false;
    v.drop_no_doubled = None;
    v
}

/// 枪将棋：棋子全部为自定义走法
pub fn yarishogi() -> Variant {
    let mut v = shogi_base(6, 8, 3);
    let (knight, bishop, rook, gold, silver) = (
        PieceType::Custom(1),
        PieceType::Custom(2),
        PieceType::Custom(3),
        PieceType::Custom(4),
        PieceType::Custom(5),
    );
    v.add_builtin(PieceType::King, 'k');
    v.add_builtin(PieceType::ShogiPawn, 'p');
    v.add_builtin(PieceType::Rook, 'l');
    v.add_builtin_with(knight, 'n', "fRvW");
    v.add_builtin_with(bishop, 'b', "fFfR");
    v.add_builtin_with(rook, 'r', "frlR");
    v.add_builtin_with(gold, 'g', "WfFbR");
    v.add_builtin_with(silver, 's', "fKbR");
    promote(
        &mut v,
        &[
            (PieceType::ShogiPawn, silver),
            (knight, gold),
            (bishop, gold),
            (rook, PieceType::Rook),
        ],
    );
    v.start_fen = "rnnkbbr/7/ppppppp/7/7/7/PPPPPPP/7/RBBKNNR[-] w - - 0 1".to_string();
    v.shogi_pawn_drop_mate_illegal = false;
    v.stalemate_value = GameValue::Draw;
    v
}

pub fn euroshogi() -> Variant {
    let mut v = shogi_base(7, 7, 3);
    add_shogi_pieces(
        &mut v,
        &[
            (PieceType::ShogiPawn, 'p'),
            (PieceType::EuroshogiKnight, 'n'),
            (PieceType::Gold, 'g'),
            (PieceType::Bishop, 'b'),
            (PieceType::DragonHorse, 'h'),
            (PieceType::Rook, 'r'),
            (PieceType::King, 'k'),
            (PieceType::Bers, 'd'),
        ],
    );
    promote(
        &mut v,
        &[
            (PieceType::ShogiPawn, PieceType::Gold),
            (PieceType::EuroshogiKnight, PieceType::Gold),
            (PieceType::Bishop, PieceType::DragonHorse),
            (PieceType::Rook, PieceType::Bers),
        ],
    );
    v.start_fen = "1nbgkgn1/1r4b1/pppppppp/8/8/PPPPPPPP/1B4R1/1NGKGBN1[-] w 0 1".to_string();
    v.mandatory_piece_promotion = true;
    v
}

pub fn judkinshogi() -> Variant {
    let mut v = shogi_base(5, 5, 2);
    add_shogi_pieces(
        &mut v,
        &[
            (PieceType::ShogiPawn, 'p'),
            (PieceType::ShogiKnight, 'n'),
            (PieceType::Silver, 's'),
            (PieceType::Gold, 'g'),
            (PieceType::Bishop, 'b'),
            (PieceType::DragonHorse, 'h'),
            (PieceType::Rook, 'r'),
            (PieceType::Bers, 'd'),
            (PieceType::King, 'k'),
        ],
    );
    promote(
        &mut v,
        &[
            (PieceType::ShogiPawn, PieceType::Gold),
            (PieceType::ShogiKnight, PieceType::Gold),
            (PieceType::Silver, PieceType::Gold),
            (PieceType::Bishop, PieceType::DragonHorse),
            (PieceType::Rook, PieceType::Bers),
        ],
    );
    v.start_fen = "rbnsgk/5p/6/6/P5/KGSNBR[-] w 0 1".to_string();
    v
}

// 非象棋类棋盘游戏

fn single_piece_game(max_file: u8, max_rank: u8, pt: PieceType) -> Variant {
    let mut v = Variant::fairy_template();
    v.set_dimensions(max_file, max_rank);
    v.add_builtin(pt, 'p');
    v.promotion_pawn_types = [Vec::new(), Vec::new()];
    v.promotion_region = [Bitboard::EMPTY; 2];
    v.double_step = false;
    v.en_passant = false;
    v.castling = false;
    v
}

pub fn clobber() -> Variant {
    let mut v = single_piece_game(4, 5, PieceType::Clobber);
    v.start_fen = "PpPpP/pPpPp/PpPpP/pPpPp/PpPpP/pPpPp w 0 1".to_string();
    v.stalemate_value = GameValue::Loss;
    v
}

pub fn breakthrough() -> Variant {
    let mut v = single_piece_game(7, 7, PieceType::Breakthrough);
    v.start_fen = "pppppppp/pppppppp/8/8/8/8/PPPPPPPP/PPPPPPPP w 0 1".to_string();
    v.stalemate_value = GameValue::Loss;
    v.flag_piece = Some(PieceType::Breakthrough);
    v.flag_region = [Bitboard::rank(7, v.max_file), Bitboard::rank(0, v.max_file)];
    v
}

pub fn connect4() -> Variant {
    let mut v = single_piece_game(6, 5, PieceType::Immobile);
    v.start_fen = format!("7/7/7/7/7/7[{}{}] w 0 1", "P".repeat(21), "p".repeat(21));
    v.piece_drops = true;
    v.drop_on_top = true;
    v.connect_n = 4;
    v
}

pub fn tictactoe() -> Variant {
    let mut v = single_piece_game(2, 2, PieceType::Immobile);
    v.start_fen = "3/3/3[PPPPPpppp] w 0 1".to_string();
    v.piece_drops = true;
    v.connect_n = 3;
    v
}

/// 同化棋：复制走一格，跳走两格，落点周围的敌子全部翻转
pub fn ataxx() -> Variant {
    let mut v = single_piece_game(6, 6, PieceType::Ataxx);
    v.start_fen = "P5p/7/7/7/7/7/p5P w 0 1".to_string();
    v.piece_drops = true;
    v.free_drops = true;
    v.enclosing_drop = EnclosingRule::Ataxx;
    v.flip_enclosed_pieces = EnclosingRule::Ataxx;
    v.stalemate_value = GameValue::Loss;
    v.stalemate_piece_count = true;
    v.pass_on_stalemate = true;
    v.material_counting = MaterialCounting::Unweighted;
    v.adjudicate_full_board = true;
    v.n_move_rule = 0;
    v
}

/// 黑白棋
pub fn flipello() -> Variant {
    let mut v = single_piece_game(7, 7, PieceType::Immobile);
    v.start_fen = format!(
        "8/8/8/3pP3/3Pp3/8/8/8[{}{}] w 0 1",
        "P".repeat(30),
        "p".repeat(30)
    );
    v.piece_drops = true;
    v.enclosing_drop = EnclosingRule::Reversi;
    v.flip_enclosed_pieces = EnclosingRule::Reversi;
    v.stalemate_value = GameValue::Loss;
    v.stalemate_piece_count = true;
    v.pass_on_stalemate = true;
    v.material_counting = MaterialCounting::Unweighted;
    v.adjudicate_full_board = true;
    v.n_move_rule = 0;
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::betza::MovementSpec;
    use crate::error::FenValidation;
    use crate::fen::validate_fen;

    #[test]
    fn test_every_start_fen_validates() {
        for &name in NAMES {
            let v = by_name(name).unwrap();
            assert_eq!(v.name, name);
            assert_eq!(
                validate_fen(&v, &v.start_fen, v.chess960),
                FenValidation::Ok,
                "{name}: {}",
                v.start_fen
            );
        }
        assert!(by_name("nosuchvariant").is_none());
    }

    #[test]
    fn test_shako_kings_start_on_castling_rank() {
        let v = shako();
        assert_eq!(validate_fen(&v, &v.start_fen, false), FenValidation::Ok);
        let fen = v.start_fen.clone();
        let pos = crate::position::Position::from_fen(std::sync::Arc::new(v), &fen, false).unwrap();
        let king = PieceType::King;
        assert_eq!(pos.board().find(Side::White, king), Square::parse("f2"));
        assert_eq!(pos.board().find(Side::Black, king), Square::parse("f9"));
        assert_eq!(pos.variant().castling_rank_of(Side::White), 1);
        assert_eq!(pos.variant().castling_rank_of(Side::Black), 8);
        assert!(pos.fen(&crate::fen::FenOptions::default()).contains(" w KQkq "));
    }

    #[test]
    fn test_builtin_betzas_parse() {
        for &name in NAMES {
            let v = by_name(name).unwrap();
            for def in v.pieces.values() {
                let parsed = MovementSpec::parse(&def.betza).unwrap();
                assert_eq!(parsed, def.movement, "{name}: {}", def.betza);
                if def.piece_type != PieceType::Immobile {
                    assert!(!def.movement.is_empty(), "{name}: {:?}", def.piece_type);
                }
            }
        }
    }

    #[test]
    fn test_xiangqi_letters_and_regions() {
        let v = xiangqi();
        assert_eq!(v.piece_type_from_letter('h'), Some(PieceType::Horse));
        assert_eq!(v.piece_type_from_letter('e'), Some(PieceType::Elephant));
        assert_eq!(v.notation_char(PieceType::Horse), 'H');
        let palace = v.mobility(Side::Black, PieceType::King);
        assert_eq!(palace.count(), 9);
        assert!(palace.contains(Square::parse("e10").unwrap()));
        assert!(!v.mobility(Side::White, PieceType::Elephant).contains(Square::parse("e6").unwrap()));
    }

    #[test]
    fn test_janggi_palace_lines() {
        let v = janggi();
        assert_eq!(v.diagonal_lines.count(), 10);
        assert!(v.on_diagonal_line(Square::parse("d1").unwrap(), Square::parse("e2").unwrap()));
        assert!(v.pass);
        assert_eq!(v.piece_type_from_letter('a'), Some(PieceType::Wazir));
    }

    #[test]
    fn test_promotion_lists_descend() {
        let v = by_name("seirawan").unwrap();
        assert_eq!(v.promotion_piece_types[0].first(), Some(&PieceType::Chancellor));
        let v = spartan();
        assert!(v.promotion_piece_types[1].contains(&PieceType::King));
        assert!(v.is_promotion_pawn(Side::Black, PieceType::Custom(1)));
        assert!(!v.is_promotion_pawn(Side::Black, PieceType::Pawn));
    }

    #[test]
    fn test_shogi_zone() {
        let v = shogi();
        assert_eq!(v.promotion_region[0].count(), 27);
        assert!(v.promotion_region[1].contains(Square::parse("a3").unwrap()));
        assert_eq!(v.promoted_type(PieceType::Rook), Some(PieceType::Bers));
    }
}
