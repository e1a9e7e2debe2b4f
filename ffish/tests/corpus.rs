//! 行为语料：通过查询接口复现各变体的已知结果

use ffish::{Engine, EngineError, FenOptions, Notation, VALUE_DRAW, VALUE_MATE};

const CHESS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const CHESS960: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w HAha - 0 1";
const CAPA: &str = "rnabqkbcnr/pppppppppp/10/10/10/10/PPPPPPPPPP/RNABQKBCNR w KQkq - 0 1";
const CAPAHOUSE: &str = "rnabqkbcnr/pppppppppp/10/10/10/10/PPPPPPPPPP/RNABQKBCNR[] w KQkq - 0 1";
const SHOGI: &str = "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL[-] w - - 0 1";
const SHOGI_SFEN: &str = "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1";
const SEIRAWAN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR[EHeh] w KQBCDFGkqbcdfg - 0 1";
const GRANDHOUSE: &str = "r8r/1nbqkcabn1/pppppppppp/10/10/10/10/PPPPPPPPPP/1NBQKCABN1/R8R[] w - - 0 1";
const XIANGQI: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";
const SHOGUN: &str = "rnb+fkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB+FKBNR[] w KQkq - 0 1";
const JANGGI: &str = "rnba1abnr/4k4/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/4K4/RNBA1ABNR w - - 0 1";

const VARIANTS_INI: &str = r#"
# 大象棋与 crazyhouse 的混合
[grandhouse:grand]
startFen = r8r/1nbqkcabn1/pppppppppp/10/10/10/10/PPPPPPPPPP/1NBQKCABN1/R8R[] w - - 0 1
pieceDrops = true
capturesToHand = true

[shogun:crazyhouse]
startFen = rnb+fkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB+FKBNR[] w KQkq - 0 1
commoner = c
centaur = g
archbishop = a
chancellor = m
fers = f
promotionRegionWhite = *6 *7 *8
promotionRegionBlack = *3 *2 *1
promotionLimit = g:1 a:1 m:1 q:1
promotionPieceTypes = -
promotedPieceType = p:c n:g b:a r:m f:q
mandatoryPawnPromotion = false
firstRankPawnDrops = true
promotionZonePawnDrops = true
dropRegionWhite = *1 *2 *3 *4 *5
dropRegionBlack = *4 *5 *6 *7 *8
immobilityIllegal = true

[orda:chess]
startFen = lhaykahl/8/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQ - 0 1
centaur = h
knibis = a
kniroo = l
silver = y
promotionPieceTypes = qh
flagPiece = k
flagRegionWhite = *8
flagRegionBlack = *1

[diana:losalamos]
pieceToCharTable = PNBRQ................Kpnbrq................k
bishop = b
promotionPieceTypes = rbn
castling = true
castlingKingsideFile = e
castlingQueensideFile = b
startFen = rbnkbr/pppppp/6/6/PPPPPP/RBNKBR w KQkq - 0 1

[passchess:chess]
pass = true

[royalduck:duck]
extinctionValue = none
pseudoRoyalTypes = k

[makhouse:makruk]
startFen = rnsmksnr/8/pppppppp/8/8/PPPPPPPP/8/RNSKMSNR[] w - - 0 1
pieceDrops = true
capturesToHand = true
firstRankPawnDrops = true
promotionZonePawnDrops = true
immobilityIllegal = true

[wazirking:chess]
fers = q
king = k:W
startFen = 7k/5Kq1/8/8/8/8/8/8 w - - 0 1
stalemateValue = loss
nFoldValue = loss

[betzatest]
maxRank = 7
maxFile = 7
customPiece1 = a:lhN
customPiece2 = b:rhN
customPiece3 = c:hlN
customPiece4 = d:hrN
startFen = 7/7/7/3A3/7/7/7 w - - 0 1

[cannonshogi:shogi]
dropNoDoubled = -
shogiPawnDropMateIllegal = false
soldier = p
cannon = u
customPiece1 = a:pR
customPiece2 = c:mBcpB
customPiece3 = i:pB
customPiece4 = w:mRpRmFpB2
customPiece5 = f:mBpBmWpR2
promotedPieceType = u:w a:w c:f i:f
startFen = lnsgkgsnl/1rci1uab1/p1p1p1p1p/9/9/9/P1P1P1P1P/1BAU1ICR1/LNSGKGSNL[-] w 0 1

[fogofwar:chess]
king = -
commoner = k
castlingKingPiece = k
extinctionValue = loss
extinctionPieceTypes = k

[pawnsideways:chess]
pawn = p:fmWfcFifmnDsmW

[pawnback:chess]
pawn = p:fmWfcFifmnDbmW
"#;

fn engine() -> Engine {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
    let engine = Engine::new();
    engine.load_variant_config(VARIANTS_INI).unwrap();
    engine
}

const NO_MOVES: &[&str] = &[];

fn fen_opts(chess960: bool, sfen: bool, show_promoted: bool, count_started: i32) -> FenOptions {
    FenOptions {
        chess960,
        sfen,
        show_promoted,
        count_started,
    }
}

#[test]
fn test_fixtures_load() {
    let engine = engine();
    let names = engine.variants().unwrap();
    for name in ["grandhouse", "shogun", "orda", "diana", "betzatest", "cannonshogi", "fogofwar"] {
        assert!(names.iter().any(|n| n == name), "{name} missing");
    }
}

#[test]
fn test_engine_surface() {
    let engine = engine();
    let (major, minor, patch) = engine.version();
    assert_eq!((major, minor, patch), rules::ENGINE_VERSION);
    assert!(engine.info().starts_with("Fairy-Stockfish"));
    assert_eq!(engine.set_option("UCI_Variant", "capablanca"), Ok(()));
    assert!(!engine.two_boards("chess").unwrap());
    assert!(engine.two_boards("bughouse").unwrap());
    assert!(!engine.captures_to_hand("seirawan").unwrap());
    assert!(engine.captures_to_hand("shouse").unwrap());
}

#[test]
fn test_start_fens() {
    let engine = engine();
    assert_eq!(engine.start_fen("capablanca").unwrap(), CAPA);
    assert_eq!(engine.start_fen("capahouse").unwrap(), CAPAHOUSE);
    assert_eq!(engine.start_fen("xiangqi").unwrap(), XIANGQI);
    assert_eq!(engine.start_fen("grandhouse").unwrap(), GRANDHOUSE);
    assert_eq!(engine.start_fen("shogun").unwrap(), SHOGUN);
}

#[test]
fn test_legal_moves() {
    let engine = engine();
    let moves = engine
        .legal_moves("capablanca", "10/10/10/10/10/k9/10/K9 w - - 0 1", NO_MOVES, false)
        .unwrap();
    assert_eq!(moves, vec!["a1b1"]);

    let moves = engine.legal_moves("xiangqi", XIANGQI, &["h3h10"], false).unwrap();
    assert!(moves.contains(&"i10h10".to_string()));

    let moves = engine
        .legal_moves("shogun", SHOGUN, &["c2c4", "b8c6", "b2b4", "b7b5", "c4b5", "c6b8"], false)
        .unwrap();
    assert!(moves.contains(&"b5b6+".to_string()));

    // 入场但不能易位
    let fen = "rnbq3r/pp2bkpp/8/2p1p2K/2p1P3/8/PPPP1PPP/RNB4R[EHeh] b ABCHabcdh - 0 10";
    let moves = engine.legal_moves("seirawan", fen, NO_MOVES, false).unwrap();
    assert!(moves.contains(&"c8g4h".to_string()));

    // 韩国象棋无子可动时只能停着
    let moves = engine
        .legal_moves("janggi", "4k4/c7R/9/3R1R3/9/9/9/9/9/3K5 b - - 0 1", NO_MOVES, false)
        .unwrap();
    assert_eq!(moves, vec!["e10e10"]);

    // 打入的兵越过升变线后仍须升变
    let moves = engine
        .legal_moves("makhouse", "rnsmksnr/8/1ppP1ppp/p3p3/8/PPP1PPPP/8/RNSKMSNR[p] w - - 0 4", NO_MOVES, false)
        .unwrap();
    assert!(moves.contains(&"d6d7m".to_string()));
    assert!(!moves.contains(&"d6d7".to_string()));
}

#[test]
fn test_yarishogi_start_moves() {
    let engine = engine();
    let start = engine.start_fen("yarishogi").unwrap();
    let mut moves = engine.legal_moves("yarishogi", &start, NO_MOVES, false).unwrap();
    let mut expected = vec![
        "a3a4", "b3b4", "c3c4", "d3d4", "e3e4", "f3f4", "g3g4", "e1e2", "f1f2", "b1a2", "b1b2", "b1c2", "c1b2",
        "c1c2", "c1d2", "a1a2", "g1g2", "d1c2", "d1d2", "d1e2",
    ];
    moves.sort();
    expected.sort();
    assert_eq!(moves, expected);
}

#[test]
fn test_betza_modifiers() {
    let engine = engine();
    let cases = [
        ("A", ["d4c2", "d4b3", "d4b5", "d4c6"]),
        ("B", ["d4e2", "d4f3", "d4f5", "d4e6"]),
        ("C", ["d4e2", "d4b3", "d4f5", "d4c6"]),
        ("D", ["d4c2", "d4f3", "d4b5", "d4e6"]),
    ];
    for (letter, expected) in cases {
        let fen = format!("7/7/7/3{letter}3/7/7/7 w - - 0 1");
        let moves = engine.legal_moves("betzatest", &fen, NO_MOVES, false).unwrap();
        assert_eq!(moves, expected, "piece {letter}");
    }
}

#[test]
fn test_cannonshogi_hopping_diagonals() {
    let engine = engine();
    let fen = "lnsg1gsnl/1rc1kuab1/p1+A1p1p1p/3P5/6i2/6P2/P1P1P3P/1B1U1ICR1/LNSGKGSNL[] w - - 1 3";
    let moves = engine.legal_moves("cannonshogi", fen, NO_MOVES, false).unwrap();
    let has = |m: &str| moves.iter().any(|x| x == m);
    assert!(has("c7b6") && has("c7d8"));
    assert!(!has("c7d6") && !has("c7b8"));
    assert!(has("c7a9") && has("c7e5"));
    assert!(!has("c7a5") && !has("c7e9"));
    assert!(!has("c7f4") && !has("c7g3"));
}

#[test]
fn test_castling_notation() {
    let engine = engine();
    // 普通王步 d1e1 存在时易位写作 d1f1
    let moves = engine
        .legal_moves("diana", "rbnk1r/pppbpp/3p2/5P/PPPPPB/RBNK1R w KQkq - 2 3", NO_MOVES, false)
        .unwrap();
    assert!(moves.contains(&"d1f1".to_string()));

    let moves = engine
        .legal_moves("shako", "c8c/ernbqkbnre/pppppppppp/10/10/10/10/PPPPPPPPPP/5K2RR/10 w Kkq - 0 1", NO_MOVES, false)
        .unwrap();
    assert!(moves.contains(&"f2h2".to_string()));
}

#[test]
fn test_get_fen() {
    let engine = engine();
    let plain = FenOptions::default();
    assert_eq!(engine.get_fen("chess", CHESS, NO_MOVES, &plain).unwrap(), CHESS);
    assert_eq!(
        engine
            .get_fen("chess", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", NO_MOVES, &plain)
            .unwrap(),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"
    );
    assert_eq!(
        engine
            .get_fen("chess", "8/rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", NO_MOVES, &plain)
            .unwrap(),
        "8/rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQ - 0 1"
    );
    assert_eq!(
        engine
            .get_fen(
                "janggi",
                "rhea1aehr/4k4/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/4K4/RHEA1AEHR w - - 0 1",
                NO_MOVES,
                &plain
            )
            .unwrap(),
        JANGGI
    );
    assert_eq!(engine.get_fen("seirawan", SEIRAWAN, NO_MOVES, &plain).unwrap(), SEIRAWAN);
    assert_eq!(
        engine.get_fen("chess", CHESS, NO_MOVES, &fen_opts(true, false, false, 0)).unwrap(),
        CHESS960
    );
    assert_eq!(
        engine.get_fen("shogi", SHOGI, NO_MOVES, &fen_opts(false, true, false, 0)).unwrap(),
        SHOGI_SFEN
    );

    let fen = "rnab1kbcnr/ppppPppppp/10/4q5/10/10/PPPPP1PPPP/RNABQKBCNR[p] b KQkq - 0 3";
    assert_eq!(
        engine
            .get_fen("capahouse", CAPA, &["f2f4", "e7e5", "f4e5", "e8e5", "P@e7"], &plain)
            .unwrap(),
        fen
    );
}

#[test]
fn test_get_fen_gating_flags() {
    let engine = engine();
    let plain = FenOptions::default();
    let fen0 = "reb1k2r/ppppqppp/2nb1n2/4p3/4P3/N1P2N2/PB1PQPPP/RE2KBHR[h] b KQkqac - 2 6";
    let fen1 = "reb2rk1/ppppqppp/2nb1n2/4p3/4P3/N1P2N2/PB1PQPPP/RE2KBHR[h] w KQac - 3 7";
    assert_eq!(engine.get_fen("seirawan", fen0, &["e8g8"], &plain).unwrap(), fen1);

    let fen0 = "rnbq3r/pp2bkpp/8/2p1p2K/2p1P3/8/PPPP1PPP/RNB4R[EHeh] b QBCEHabcdk - 0 10";
    let fen1 = "rnbq3r/pp2bkpp/8/2p1p2K/2p1P3/8/PPPP1PPP/RNB4R[EHeh] b ABCHabcdh - 0 10";
    assert_eq!(engine.get_fen("seirawan", fen0, NO_MOVES, &plain).unwrap(), fen1);

    let opts = fen_opts(true, false, false, 0);
    let fen1 = engine.get_fen("seirawan", SEIRAWAN, NO_MOVES, &opts).unwrap();
    let fen2 = engine.get_fen("seirawan", &fen1, NO_MOVES, &opts).unwrap();
    assert_eq!(fen1, fen2);
}

#[test]
fn test_get_fen_counters() {
    let engine = engine();
    let plain = FenOptions::default();
    // 停着不影响易位权
    assert_eq!(
        engine.get_fen("passchess", CHESS, &["e1e1", "e8e8"], &plain).unwrap(),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 2 2"
    );
    // 只有不可逆的走法才清零五十步计数
    assert_eq!(
        engine
            .get_fen("pawnsideways", CHESS, &["e2e4", "g8f6", "e4d4"], &plain)
            .unwrap(),
        "rnbqkb1r/pppppppp/5n2/8/3P4/8/PPPP1PPP/RNBQKBNR b KQkq - 2 2"
    );
    assert_eq!(
        engine.get_fen("pawnback", CHESS, &["e2e4", "e7e6"], &plain).unwrap(),
        "rnbqkbnr/pppp1ppp/4p3/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 2 2"
    );
    assert_eq!(
        engine
            .get_fen(
                "pocketknight",
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR[Nn] w KQkq - 0 1",
                &["N@e4"],
                &plain
            )
            .unwrap(),
        "rnbqkbnr/pppppppp/8/8/4N3/8/PPPPPPPP/RNBQKBNR[n] b KQkq - 0 1"
    );
    let duck = "r1b1k3/pp3pb1/4p3/2p2p2/2PpP2q/1P1P1P2/P1K1*3/RN1Q2N1 b q e3 0 17";
    assert_eq!(engine.get_fen("duck", duck, NO_MOVES, &plain).unwrap(), duck);
}

#[test]
fn test_counting_fens() {
    let engine = engine();
    let promoted = fen_opts(false, false, true, 0);
    let makruk_start = engine.start_fen("makruk").unwrap();
    assert_eq!(
        engine
            .get_fen("makruk", &makruk_start, &["e3e4", "d6d5", "e4d5", "a6a5", "d5c6m"], &promoted)
            .unwrap(),
        "rnsmksnr/8/1pM~1pppp/p7/8/PPPP1PPP/8/RNSKMSNR b - - 0 3"
    );
    assert_eq!(
        engine
            .get_fen("makruk", "8/3k4/8/2K1S1P1/8/8/8/8 w - - 0 1", &["g5g6m"], &promoted)
            .unwrap(),
        "8/3k4/6M~1/2K1S3/8/8/8/8 b - 88 8 1"
    );
    assert_eq!(
        engine
            .get_fen("makruk", "3k4/2m5/8/4MP2/3KS3/8/8/8 w - - 0 1", &["f5f6m"], &promoted)
            .unwrap(),
        "3k4/2m5/5M~2/4M3/3KS3/8/8/8 b - 128 0 1"
    );
    assert_eq!(
        engine
            .get_fen("cambodian", "8/3k4/8/2K1S1P1/8/8/8/8 w - - 0 1", &["g5g6m"], &promoted)
            .unwrap(),
        "8/3k4/6M~1/2K1S3/8/8/8/8 b - 86 8 1"
    );
    let plain = FenOptions::default();
    assert_eq!(
        engine
            .get_fen("asean", "4k3/3r4/2K5/8/3R4/8/8/8 w - - 0 1", &["d4d7"], &plain)
            .unwrap(),
        "4k3/3R4/2K5/8/8/8/8/8 b - 32 0 1"
    );
    assert_eq!(
        engine
            .get_fen("asean", "4k3/3r4/2K5/8/3R4/1P6/8/8 w - - 0 1", &["d4d7"], &plain)
            .unwrap(),
        "4k3/3R4/2K5/8/8/1P6/8/8 b - - 0 1"
    );
}

#[test]
fn test_get_san() {
    let engine = engine();
    let fen = "4k3/8/3R4/8/1R3R2/8/3R4/4K3 w - - 0 1";
    let san = |mv: &str| engine.get_san("chess", fen, mv, false, Notation::Default).unwrap();
    assert_eq!(san("b4d4"), "Rbd4");
    assert_eq!(san("f4d4"), "Rfd4");
    assert_eq!(san("d2d4"), "R2d4");
    assert_eq!(san("d6d4"), "R6d4");

    let fen = "1r2k3/P1P5/8/8/8/8/8/4K3 w - - 0 1";
    assert_eq!(engine.get_san("chess", fen, "c7b8q", false, Notation::Default).unwrap(), "cxb8=Q+");
    assert_eq!(engine.get_san("chess", fen, "c7b8q", false, Notation::Lan).unwrap(), "c7xb8=Q+");
    assert_eq!(engine.get_san("capablanca", CAPA, "e2e4", false, Notation::Lan).unwrap(), "e2-e4");
}

#[test]
fn test_get_san_moves() {
    let engine = engine();
    let sans = engine
        .get_san_moves(
            "seirawan",
            SEIRAWAN,
            &["e2e4", "e7e5", "g1f3", "b8c6h", "f1c4", "f8c5e"],
            false,
            Notation::Default,
        )
        .unwrap();
    assert_eq!(sans, vec!["e4", "e5", "Nf3", "Nc6/H", "Bc4", "Bc5/E"]);

    let sans = engine
        .get_san_moves("shogi", SHOGI, &["c3c4", "g7g6", "b2h8"], false, Notation::Default)
        .unwrap();
    assert_eq!(sans, vec!["P-76", "P-34", "Bx22="]);

    let sans = engine
        .get_san_moves(
            "xiangqi",
            XIANGQI,
            &["h3e3", "h10g8", "h1g3", "c10e8", "a1a3", "i10h10"],
            false,
            Notation::XiangqiWxf,
        )
        .unwrap();
    assert_eq!(sans, vec!["C2=5", "H8+7", "H2+3", "E3+5", "R9+2", "R9=8"]);

    let sans = engine
        .get_san_moves("shogun", SHOGUN, &["e2e4", "d7d5", "f1a6+", "d8d6"], false, Notation::Default)
        .unwrap();
    assert_eq!(sans, vec!["e4", "d5", "Ba6=A", "Qd6"]);
}

#[test]
fn test_gives_check() {
    let engine = engine();
    assert!(!engine.gives_check("capablanca", CAPA, NO_MOVES, false).unwrap());
    assert!(!engine.gives_check("capablanca", CAPA, &["e2e4"], false).unwrap());
    assert!(engine
        .gives_check("capablanca", CAPA, &["g2g3", "d7d5", "a2a3", "c8h3"], false)
        .unwrap());

    assert!(!engine.gives_check("atomic", CHESS, &["e2e4"], false).unwrap());
    assert!(engine.gives_check("atomic", CHESS, &["e2e4", "d7d5", "f1b5"], false).unwrap());
    assert!(!engine.gives_check("atomic", "8/8/kK6/8/8/8/Q7/8 b - - 0 1", NO_MOVES, false).unwrap());

    // 斯巴达象棋双王同时被攻击才算将军
    assert!(engine
        .gives_check("spartan", "lgkcckw1/hhhhhhhh/1N3lN1/8/8/8/PPPPPPPP/R1BQKB1R b KQ - 11 6", NO_MOVES, false)
        .unwrap());
    assert!(!engine
        .gives_check("spartan", "lgkcckwl/hhhhhhhh/6N1/8/8/8/PPPPPPPP/RNBQKB1R b KQ - 5 3", NO_MOVES, false)
        .unwrap());

    assert!(engine
        .gives_check("janggi", "4ka3/4a4/9/4R4/2B6/9/9/5K3/4p4/3r5 b - - 0 113", &["e2f2"], false)
        .unwrap());
}

#[test]
fn test_is_capture() {
    let engine = engine();
    assert!(!engine.is_capture("chess", CHESS, NO_MOVES, "e2e4", false).unwrap());
    assert!(!engine
        .is_capture("chess", CHESS, &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5"], "e1g1", false)
        .unwrap());
    let moves = ["e2e4", "g8f6", "e4e5", "d7d5"];
    assert!(engine.is_capture("chess", CHESS, &moves, "e5f6", false).unwrap());
    assert!(engine.is_capture("chess", CHESS, &moves, "e5d6", false).unwrap());
    assert!(!engine
        .is_capture("sittuyin", "8/2k5/8/4P3/4P1N1/5K2/8/8[] w - - 0 1", NO_MOVES, "e5e5f", false)
        .unwrap());
}

#[test]
fn test_piece_to_partner() {
    let engine = engine();
    let fen = "r2qkbnr/1Ppppppp/2n5/8/8/8/1PPPPPPP/RNBQKBNR[] w KQkq - 0 1";
    assert_eq!(engine.piece_to_partner("bughouse", fen, &["b7a8q"]).unwrap(), "r");
    assert_eq!(engine.piece_to_partner("bughouse", fen, &["b7a8q", "d8a8"]).unwrap(), "P");
    assert_eq!(engine.piece_to_partner("bughouse", fen, &["b7a8q", "d8b8"]).unwrap(), "");

    let fen = "lnsgkgsnl/1r5b1/ppppppppp/S8/9/9/PPPPPPPPP/1B5R1/LNSGKG1NL[] w 0 1";
    assert_eq!(engine.piece_to_partner("shogi", fen, &["a6a7+"]).unwrap(), "p");
    assert_eq!(engine.piece_to_partner("shogi", fen, &["a6a7+", "a9a7"]).unwrap(), "S");
}

#[test]
fn test_game_result() {
    let engine = engine();
    let fools = ["f2f3", "e7e5", "g2g4", "d8h4"];
    assert_eq!(engine.game_result("chess", CHESS, &fools, false).unwrap(), -VALUE_MATE);
    assert_eq!(engine.game_result("losers", CHESS, &fools, false).unwrap(), VALUE_MATE);

    // 打步诘
    let fen = "lnsg3nk/1r2b1gs1/ppppppp1p/7N1/7p1/9/PPPPPPPP1/1B5R1/LNSGKGS1L[P] w 0 1";
    assert_eq!(engine.game_result("shogi", fen, &["P@i8"], false).unwrap(), VALUE_MATE);
    let legal = engine.legal_moves("shogi", fen, NO_MOVES, false).unwrap();
    assert!(!legal.iter().any(|m| m == "P@i8"));

    let suicide = |fen: &str| engine.game_result("suicide", fen, NO_MOVES, false).unwrap();
    assert_eq!(suicide("8/8/8/7p/7P/8/8/8 w - - 0 1"), VALUE_DRAW);
    assert_eq!(suicide("8/8/8/7p/7P/7P/8/8 w - - 0 1"), -VALUE_MATE);
    assert_eq!(suicide("8/8/8/7p/7P/8/8/n7 w - - 0 1"), VALUE_MATE);

    assert_eq!(
        engine.game_result("atomic", "BQ6/Rk6/8/8/8/8/8/4K3 b - - 0 1", NO_MOVES, false).unwrap(),
        -VALUE_MATE
    );
    assert_eq!(
        engine.game_result("atomic", "KQ6/Rk6/2B5/8/8/8/8/8 b - - 0 1", NO_MOVES, false).unwrap(),
        VALUE_DRAW
    );
}

#[test]
fn test_immediate_game_end() {
    let engine = engine();
    assert_eq!(engine.is_immediate_game_end("capablanca", CAPA, NO_MOVES, false).unwrap(), (false, 0));
    let (ended, result) = engine
        .is_immediate_game_end(
            "flipello",
            "pppppppp/pppppppp/pppPpppp/pPpPpppp/pppppppp/pPpPPPPP/ppPpPPpp/pppppppp[PPpp] b - - 63 32",
            NO_MOVES,
            false,
        )
        .unwrap();
    assert!(ended);
    assert_eq!(result, VALUE_MATE);
    let (ended, result) = engine
        .is_immediate_game_end(
            "ataxx",
            "PPPpppp/pppPPPp/pPPPPPP/PPPPPPp/ppPPPpp/pPPPPpP/pPPPPPP b - - 99 50",
            NO_MOVES,
            false,
        )
        .unwrap();
    assert!(ended);
    assert_eq!(result, -VALUE_MATE);
}

#[test]
fn test_optional_game_end() {
    let engine = engine();
    assert!(!engine.is_optional_game_end("capablanca", CAPA, NO_MOVES, false).unwrap().0);
    assert_eq!(
        engine
            .is_optional_game_end("sittuyin", "1k4PK/3r4/8/8/8/8/8/8[] w - - 0 1", NO_MOVES, false)
            .unwrap(),
        (true, VALUE_DRAW)
    );

    // 炮长捉车
    let fen = "2bakabnr/9/r1n1c4/2p1p1p1p/PP7/9/4P1P1P/2C3NC1/9/1NBAKAB1R w - - 0 1";
    let chase = ["c3a3", "a8b8", "a3b3", "b8a8", "b3a3", "a8b8", "a3b3", "b8a8", "b3a3"];
    assert_eq!(
        engine.is_optional_game_end("xiangqi", fen, &chase, false).unwrap(),
        (true, VALUE_MATE)
    );

    // 兵捉子不算长捉
    let fen = "2bakabr1/9/9/r1p1p1p2/p7R/P8/9/9/9/1C1AKA3 w - - 0 1";
    let moves = ["a5a6", "a7b7", "a6b6", "b7a7", "b6a6", "a7b7", "a6b6", "b7a7", "b6a6"];
    assert_eq!(
        engine.is_optional_game_end("xiangqi", fen, &moves, false).unwrap(),
        (true, VALUE_DRAW)
    );

    // 长将
    let cycle = ["d7e7", "e5d5", "e7d7", "d5e5"];
    let moves: Vec<&str> = cycle.iter().chain(cycle.iter()).copied().collect();
    assert_eq!(
        engine
            .is_optional_game_end("xiangqi", "9/3kc4/3a5/3P5/9/4p4/9/4K4/9/3C5 w - - 0 1", &moves, false)
            .unwrap(),
        (true, VALUE_MATE)
    );

    // 双方长将为和
    let cycle = ["e4d4", "d7e7", "d4e4", "e7d7"];
    let moves: Vec<&str> = cycle.iter().chain(cycle.iter()).copied().collect();
    assert_eq!(
        engine
            .is_optional_game_end("xiangqi", "9/4c4/3k5/3r5/9/9/4C4/9/4K4/3R5 w - - 0 1", &moves, false)
            .unwrap(),
        (true, VALUE_DRAW)
    );
}

#[test]
fn test_insufficient_material() {
    let engine = engine();
    let cases = [
        ("chess", "k7/8/8/8/8/8/8/K7 w - - 0 1", (true, true)),
        ("chess", "k7/p7/8/8/8/8/8/K7 w - - 0 1", (true, false)),
        ("chess", "k7/bb6/8/8/8/8/8/K7 w - - 0 1", (true, false)),
        ("chess", "k7/b1b5/8/8/8/8/8/K7 w - - 0 1", (true, true)),
        ("chess", "kb6/8/8/8/8/8/8/KB7 w - - 0 1", (false, false)),
        ("xiangqi", "4k4/9/9/9/9/9/9/9/9/3KN4 w - - 0 1", (false, true)),
        ("xiangqi", "4k4/9/4b4/9/9/9/9/4B4/9/4K4 w - - 0 1", (true, true)),
        ("seirawan", "k7/8/8/8/8/8/8/KH6[] w - - 0 1", (false, true)),
        ("orda", "k7/8/8/8/8/8/8/K7 w - - 0 1", (false, false)),
        ("wazirking", "7k/6K1/8/8/8/8/8/8 b - - 0 1", (false, false)),
    ];
    for (variant, fen, expected) in cases {
        assert_eq!(
            engine.has_insufficient_material(variant, fen, NO_MOVES, false).unwrap(),
            expected,
            "{variant}: {fen}"
        );
    }
}

#[test]
fn test_validate_fen() {
    let engine = engine();
    assert_eq!(engine.validate_fen(CHESS960, "chess", true).unwrap(), 1);
    assert_eq!(
        engine
            .validate_fen("nrbqbkrn/pppppppp/8/8/8/8/PPPPPPPP/NRBQBKRN w BGbg - 0 1", "newzealand", true)
            .unwrap(),
        1
    );
    for fen in ["kb6/8/8/8/8/8/8/K1B6 w - - 0 1", "kb6/8/8/8/8/8/8/KB7 w - - 0 1"] {
        assert_eq!(engine.validate_fen(fen, "chess", false).unwrap(), 1, "{fen}");
    }
    let invalid = [
        ("chess", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 a"),
        ("3check", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 99+99 0 1"),
        ("shako", "c8c/ernbqkbnre/pppppppppp/10/10/10/10/PPPPPPPPPP/C8C/ERNBQKBNRE w KQkq - 0 1"),
        ("chess", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR g KQkq - 0 1"),
        ("chess", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNH w KQkq - 0 1"),
        ("chess", "rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        ("chess", "1nbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        ("3check", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 3+a 0 1"),
        ("sittuyin", "8/8/4pppp/pppp4/4PPPP/PPPP4/8/8[FRRSSNNkfrrssnn] w - - 0 1"),
    ];
    for (variant, fen) in invalid {
        assert_ne!(engine.validate_fen(fen, variant, false).unwrap(), 1, "{variant}: {fen}");
    }
    for name in engine.variants().unwrap() {
        let fen = engine.start_fen(&name).unwrap();
        assert_eq!(engine.validate_fen(&fen, &name, false).unwrap(), 1, "{name}");
    }
}

#[test]
fn test_fog_fen() {
    let engine = engine();
    assert_eq!(
        engine.get_fog_fen(CHESS, "fogofwar").unwrap(),
        "********/********/********/********/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
    assert_eq!(
        engine
            .get_fog_fen("rnbqkbnr/p1p2ppp/8/Pp1pp3/4P3/8/1PPP1PPP/RNBQKBNR w KQkq b6 0 1", "fogofwar")
            .unwrap(),
        "********/********/2******/Pp*p***1/4P3/4*3/1PPP1PPP/RNBQKBNR w KQkq b6 0 1"
    );
}

#[test]
fn test_config_errors_keep_catalog() {
    let engine = engine();
    let before = engine.variants().unwrap();
    let err = engine.load_variant_config("[broken:nosuchbase]\npass = true\n").unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
    assert_eq!(engine.variants().unwrap(), before);
}
