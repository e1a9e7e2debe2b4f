//! 变体配置（INI）解析
//!
//! ```ini
//! # 注释
//! [shogun:crazyhouse]
//! commoner = c
//! promotedPieceType = p:c n:g
//! customPiece1 = a:mBcpB
//! ```
//!
//! 每个段落先复制基础变体（没有基础时为无棋子的国际象棋模板），再依次应用
//! 尺寸、棋子定义与其余键。整段文本解析成功后才会登记任何变体。

use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::bitboard::Bitboard;
use crate::error::ConfigError;
use crate::fen::validate_fen;
use crate::piece::{PieceType, Side, Square};
use crate::variant::{
    ranks_bb, ChasingRule, CountingRule, EnclosingRule, GameValue, MaterialCounting, Variant,
    VariantTemplate, WallingRule,
};

/// 一行 `key = value`
#[derive(Debug, Clone)]
struct Entry {
    line: usize,
    key: String,
    value: String,
}

#[derive(Debug)]
struct Section {
    name: String,
    base: Option<String>,
    entries: Vec<Entry>,
}

/// 解析配置文本，返回按出现顺序排列的变体
///
/// `base_of` 用于查找文本之外的基础变体；文本中靠前的段落可以作为后面段落的基础。
pub fn parse_config<F>(text: &str, base_of: F) -> Result<Vec<Variant>, ConfigError>
where
    F: Fn(&str) -> Option<Variant>,
{
    let sections = split_sections(text)?;
    let mut parsed: Vec<Variant> = Vec::with_capacity(sections.len());

    for section in sections {
        let mut v = match &section.base {
            Some(base) => parsed
                .iter()
                .rev()
                .find(|p| &p.name == base)
                .cloned()
                .or_else(|| base_of(base))
                .ok_or_else(|| ConfigError::UnknownBase {
                    name: section.name.clone(),
                    base: base.clone(),
                })?,
            None => Variant::fairy_template(),
        };
        v.name = section.name.clone();
        apply_section(&mut v, &section.entries)?;

        if !validate_fen(&v, &v.start_fen, v.chess960).is_ok() {
            warn!(variant = %v.name, fen = %v.start_fen, "start position does not validate");
        }
        debug!(
            variant = %v.name,
            base = ?section.base,
            keys = section.entries.len(),
            "parsed variant section"
        );
        parsed.push(v);
    }
    Ok(parsed)
}

fn split_sections(text: &str) -> Result<Vec<Section>, ConfigError> {
    let mut sections: Vec<Section> = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') {
            let header = trimmed
                .strip_prefix('[')
                .and_then(|t| t.strip_suffix(']'))
                .map(str::trim)
                .filter(|h| !h.is_empty());
            let Some(header) = header else {
                return Err(ConfigError::Section {
                    line,
                    text: trimmed.to_string(),
                });
            };
            let (name, base) = match header.split_once(':') {
                Some((name, base)) => (name.trim(), Some(base.trim().to_string())),
                None => (header, None),
            };
            if name.is_empty() || base.as_deref() == Some("") {
                return Err(ConfigError::Section {
                    line,
                    text: trimmed.to_string(),
                });
            }
            sections.push(Section {
                name: name.to_string(),
                base,
                entries: Vec::new(),
            });
            continue;
        }

        let Some(section) = sections.last_mut() else {
            return Err(ConfigError::Orphan {
                line,
                text: trimmed.to_string(),
            });
        };
        match trimmed.split_once('=') {
            Some((key, value)) => section.entries.push(Entry {
                line,
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            None => warn!(line, text = trimmed, "ignoring config line without '='"),
        }
    }
    Ok(sections)
}

/// 按顺序应用：尺寸、棋子、其余选项
fn apply_section(v: &mut Variant, entries: &[Entry]) -> Result<(), ConfigError> {
    let is_dimension = |e: &&Entry| e.key == "maxRank" || e.key == "maxFile";
    let is_piece = |e: &&Entry| PieceType::from_config_name(&e.key).is_some();

    let (mut max_file, mut max_rank) = (v.max_file, v.max_rank);
    let mut resized = false;
    for e in entries.iter().filter(is_dimension) {
        let n: u8 = number(v, e)?;
        if n == 0 || n as usize > limit(&e.key) {
            return Err(invalid(v, e));
        }
        match e.key.as_str() {
            "maxRank" => max_rank = n - 1,
            _ => max_file = n - 1,
        }
        resized = true;
    }
    if resized {
        v.set_dimensions(max_file, max_rank);
    }

    for e in entries.iter().filter(is_piece) {
        apply_piece(v, e)?;
    }

    for e in entries.iter().filter(|e| !is_dimension(e) && !is_piece(e)) {
        if !apply_option(v, e)? {
            warn!(variant = %v.name, key = %e.key, line = e.line, "ignoring unknown config key");
        }
    }
    Ok(())
}

fn limit(key: &str) -> usize {
    match key {
        "maxRank" => crate::constants::RANK_NB,
        _ => crate::constants::FILE_NB,
    }
}

/// `<pieceName> = <letter>[:<betza>]` 或 `-`
fn apply_piece(v: &mut Variant, e: &Entry) -> Result<(), ConfigError> {
    let Some(pt) = PieceType::from_config_name(&e.key) else {
        return Ok(());
    };
    if e.value == "-" {
        v.remove_piece(pt);
        return Ok(());
    }
    let (letter, betza) = match e.value.split_once(':') {
        Some((letter, betza)) => (letter.trim(), Some(betza.trim())),
        None => (e.value.as_str(), None),
    };
    let mut chars = letter.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return Err(invalid(v, e));
    };
    if !letter.is_ascii_alphabetic() {
        return Err(invalid(v, e));
    }
    if pt.is_custom() && betza.is_none() {
        return Err(invalid(v, e));
    }
    v.add_piece(pt, letter, betza)?;
    if pt == PieceType::King && betza.is_some() {
        v.custom_king = true;
    }
    Ok(())
}

/// 应用一个规则选项，未知键返回 `false`
fn apply_option(v: &mut Variant, e: &Entry) -> Result<bool, ConfigError> {
    let key = e.key.as_str();

    if let Some(rest) = key.strip_prefix("mobilityRegion") {
        let (side, name) = if let Some(name) = rest.strip_prefix("White") {
            (Side::White, name)
        } else if let Some(name) = rest.strip_prefix("Black") {
            (Side::Black, name)
        } else {
            return Ok(false);
        };
        let pt = lower_first(name)
            .and_then(|n| PieceType::from_config_name(&n))
            .ok_or_else(|| invalid(v, e))?;
        let region = region(v, e)?;
        let board = v.board_bb();
        v.mobility_region.entry(pt).or_insert([board, board])[side.index()] = region;
        return Ok(true);
    }

    match key {
        "startFen" => v.start_fen = e.value.clone(),
        "pieceToCharTable" => v.piece_to_char_table = Some(e.value.clone()),
        "variantTemplate" => {
            v.template = match e.value.as_str() {
                "fairy" => VariantTemplate::Fairy,
                "shogi" => VariantTemplate::Shogi,
                _ => return Err(invalid(v, e)),
            }
        }
        "chess960" => v.chess960 = boolean(v, e)?,
        "twoBoards" => v.two_boards = boolean(v, e)?,

        // 升变
        "promotionRank" => {
            let r = rank(v, e)?;
            let (mf, mr) = (v.max_file, v.max_rank);
            v.promotion_region = [ranks_bb(r..=mr, mf), ranks_bb(0..=mr - r, mf)];
        }
        "promotionRegionWhite" => v.promotion_region[0] = region(v, e)?,
        "promotionRegionBlack" => v.promotion_region[1] = region(v, e)?,
        "promotionPawnType" => {
            let pt = piece(v, e)?.ok_or_else(|| invalid(v, e))?;
            v.promotion_pawn_types = [vec![pt], vec![pt]];
        }
        "promotionPawnTypes" => {
            let types = pieces(v, e)?;
            v.promotion_pawn_types = [types.clone(), types];
        }
        "promotionPawnTypesWhite" => v.promotion_pawn_types[0] = pieces(v, e)?,
        "promotionPawnTypesBlack" => v.promotion_pawn_types[1] = pieces(v, e)?,
        "promotionPieceTypes" => {
            let types = descending(pieces(v, e)?);
            v.promotion_piece_types = [types.clone(), types];
        }
        "promotionPieceTypesWhite" => v.promotion_piece_types[0] = descending(pieces(v, e)?),
        "promotionPieceTypesBlack" => v.promotion_piece_types[1] = descending(pieces(v, e)?),
        "sittuyinPromotion" => v.sittuyin_promotion = boolean(v, e)?,
        "promotionLimit" => {
            let mut limits = BTreeMap::new();
            for (pt, count) in pairs(v, e)? {
                let count: u8 = count.parse().map_err(|_| invalid(v, e))?;
                limits.insert(pt, count);
            }
            v.promotion_limit = limits;
        }
        "promotedPieceType" => {
            for (from, to) in pairs(v, e)? {
                let to = letter_type(v, e, &to)?;
                v.promoted_piece_type.insert(from, to);
            }
        }
        "piecePromotionOnCapture" => v.piece_promotion_on_capture = boolean(v, e)?,
        "mandatoryPawnPromotion" => v.mandatory_pawn_promotion = boolean(v, e)?,
        "mandatoryPiecePromotion" => v.mandatory_piece_promotion = boolean(v, e)?,
        "pieceDemotion" => v.piece_demotion = boolean(v, e)?,
        "blastOnCapture" => v.blast_on_capture = boolean(v, e)?,

        // 兵
        "doubleStep" => v.double_step = boolean(v, e)?,
        "doubleStepRegionWhite" => v.double_step_region[0] = region(v, e)?,
        "doubleStepRegionBlack" => v.double_step_region[1] = region(v, e)?,
        "enPassant" => v.en_passant = boolean(v, e)?,

        // 易位
        "castling" => v.castling = boolean(v, e)?,
        "castlingDroppedPiece" => v.castling_dropped_piece = boolean(v, e)?,
        "castlingKingsideFile" => v.castling_kingside_file = castling_file(v, e, true)?,
        "castlingQueensideFile" => v.castling_queenside_file = castling_file(v, e, false)?,
        "castlingRank" => v.castling_rank = rank(v, e)?,
        "castlingKingPiece" => v.castling_king_piece = piece(v, e)?.ok_or_else(|| invalid(v, e))?,
        "castlingRookPiece" | "castlingRookPieces" => v.castling_rook_pieces = pieces(v, e)?,

        "checking" => v.checking = boolean(v, e)?,
        "mustCapture" => v.must_capture = boolean(v, e)?,

        // 打入
        "pieceDrops" => v.piece_drops = boolean(v, e)?,
        "mustDrop" => v.must_drop = boolean(v, e)?,
        "capturesToHand" => v.captures_to_hand = boolean(v, e)?,
        "dropLoop" => v.drop_loop = boolean(v, e)?,
        "firstRankPawnDrops" => v.first_rank_pawn_drops = boolean(v, e)?,
        "promotionZonePawnDrops" => v.promotion_zone_pawn_drops = boolean(v, e)?,
        "dropOnTop" => v.drop_on_top = boolean(v, e)?,
        "dropRegionWhite" => v.drop_region[0] = region(v, e)?,
        "dropRegionBlack" => v.drop_region[1] = region(v, e)?,
        "sittuyinRookDrop" => v.sittuyin_rook_drop = boolean(v, e)?,
        "dropOppositeColoredBishop" => v.drop_opposite_colored_bishop = boolean(v, e)?,
        "dropPromoted" => v.drop_promoted = boolean(v, e)?,
        "dropNoDoubled" => v.drop_no_doubled = piece(v, e)?,
        "dropNoDoubledCount" => v.drop_no_doubled_count = number(v, e)?,
        "immobilityIllegal" => v.immobility_illegal = boolean(v, e)?,
        "freeDrops" => v.free_drops = boolean(v, e)?,
        "enclosingDrop" => v.enclosing_drop = enclosing(v, e)?,

        // 特殊走法
        "gating" => v.gating = boolean(v, e)?,
        "seirawanGating" => v.seirawan_gating = boolean(v, e)?,
        "cambodianMoves" => v.cambodian_moves = boolean(v, e)?,
        "flyingGeneral" => v.flying_general = boolean(v, e)?,
        "soldierSideways" | "xiangqiSoldier" => v.xiangqi_soldier = boolean(v, e)?,
        "diagonalLines" => v.diagonal_lines = region(v, e)?,
        "bikjang" => v.bikjang = boolean(v, e)?,
        "pass" => v.pass = boolean(v, e)?,
        "passOnStalemate" => v.pass_on_stalemate = boolean(v, e)?,
        "makpongRule" => v.makpong_rule = boolean(v, e)?,
        "wallingRule" => {
            v.walling_rule = match e.value.as_str() {
                "duck" => WallingRule::Duck,
                "none" => WallingRule::None,
                _ => return Err(invalid(v, e)),
            }
        }
        "flipEnclosedPieces" => v.flip_enclosed_pieces = enclosing(v, e)?,

        // 终局
        "nMoveRule" => v.n_move_rule = number(v, e)?,
        "nFoldRule" => v.n_fold_rule = number(v, e)?,
        "nFoldValue" => v.n_fold_value = game_value(v, e)?,
        "nFoldValueAbsolute" => v.n_fold_value_absolute = boolean(v, e)?,
        "perpetualCheckIllegal" => v.perpetual_check_illegal = boolean(v, e)?,
        "chasingRule" => {
            v.chasing_rule = match e.value.as_str() {
                "axf" => ChasingRule::Axf,
                "none" => ChasingRule::None,
                _ => return Err(invalid(v, e)),
            }
        }
        "stalemateValue" => v.stalemate_value = game_value(v, e)?,
        "stalematePieceCount" => v.stalemate_piece_count = boolean(v, e)?,
        "checkmateValue" => v.checkmate_value = game_value(v, e)?,
        "shogiPawnDropMateIllegal" => v.shogi_pawn_drop_mate_illegal = boolean(v, e)?,
        "bareKingValue" => v.bare_king_value = game_value(v, e)?,
        "bareKingMove" => v.bare_king_move = boolean(v, e)?,
        "extinctionValue" => v.extinction_value = game_value(v, e)?,
        "extinctionPseudoRoyal" => v.extinction_pseudo_royal = boolean(v, e)?,
        "extinctionPieceTypes" => {
            v.extinction_piece_types = match e.value.as_str() {
                "*" => None,
                _ => Some(pieces(v, e)?),
            }
        }
        "extinctionPieceCount" => v.extinction_piece_count = number(v, e)?,
        "extinctionOpponentPieceCount" => v.extinction_opponent_piece_count = number(v, e)?,
        "pseudoRoyalTypes" => v.pseudo_royal_types = pieces(v, e)?,
        "dupleCheck" => v.duple_check = boolean(v, e)?,
        "flagPiece" => v.flag_piece = piece(v, e)?,
        "flagRegionWhite" => v.flag_region[0] = region(v, e)?,
        "flagRegionBlack" => v.flag_region[1] = region(v, e)?,
        "flagMove" => v.flag_move = boolean(v, e)?,
        "checkCounting" => v.check_counting = boolean(v, e)?,
        "connectN" => v.connect_n = number(v, e)?,
        "materialCounting" => {
            v.material_counting = match e.value.as_str() {
                "janggi" => MaterialCounting::Janggi,
                "unweighted" => MaterialCounting::Unweighted,
                "none" => MaterialCounting::None,
                _ => return Err(invalid(v, e)),
            }
        }
        "countingRule" => {
            v.counting_rule = match e.value.as_str() {
                "makruk" => CountingRule::Makruk,
                "cambodian" => CountingRule::Cambodian,
                "asean" => CountingRule::Asean,
                "none" => CountingRule::None,
                _ => return Err(invalid(v, e)),
            }
        }
        "adjudicateFullBoard" => v.adjudicate_full_board = boolean(v, e)?,
        _ => return Ok(false),
    }
    Ok(true)
}

fn invalid(v: &Variant, e: &Entry) -> ConfigError {
    ConfigError::Value {
        variant: v.name.clone(),
        key: e.key.clone(),
        value: e.value.clone(),
    }
}

fn boolean(v: &Variant, e: &Entry) -> Result<bool, ConfigError> {
    match e.value.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(v, e)),
    }
}

fn number<T: FromStr>(v: &Variant, e: &Entry) -> Result<T, ConfigError> {
    e.value.parse().map_err(|_| invalid(v, e))
}

fn game_value(v: &Variant, e: &Entry) -> Result<GameValue, ConfigError> {
    GameValue::parse(&e.value).ok_or_else(|| invalid(v, e))
}

fn enclosing(v: &Variant, e: &Entry) -> Result<EnclosingRule, ConfigError> {
    match e.value.as_str() {
        "reversi" => Ok(EnclosingRule::Reversi),
        "ataxx" => Ok(EnclosingRule::Ataxx),
        "none" => Ok(EnclosingRule::None),
        _ => Err(invalid(v, e)),
    }
}

/// 1 起的行号
fn rank(v: &Variant, e: &Entry) -> Result<u8, ConfigError> {
    let n: u8 = number(v, e)?;
    if n == 0 || n > v.max_rank + 1 {
        return Err(invalid(v, e));
    }
    Ok(n - 1)
}

/// 列字母或 1 起的列号
fn file(v: &Variant, e: &Entry) -> Result<u8, ConfigError> {
    let index = match e.value.parse::<u8>() {
        Ok(n) => n.checked_sub(1),
        Err(_) => {
            let mut chars = e.value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_lowercase() => Some(c as u8 - b'a'),
                _ => None,
            }
        }
    };
    index
        .filter(|f| *f <= v.max_file)
        .ok_or_else(|| invalid(v, e))
}

/// 易位后王的落点列；车落在王内侧，因此王不能落在该侧的边线上
fn castling_file(v: &Variant, e: &Entry, kingside: bool) -> Result<u8, ConfigError> {
    let f = file(v, e)?;
    let edge = if kingside { 0 } else { v.max_file };
    if f == edge {
        return Err(invalid(v, e));
    }
    Ok(f)
}

/// `*6 *7 e4 a*` 形式的区域
fn region(v: &Variant, e: &Entry) -> Result<Bitboard, ConfigError> {
    let mut bb = Bitboard::EMPTY;
    for token in e.value.split_whitespace() {
        let mut chars = token.chars();
        let Some(f) = chars.next() else { continue };
        let r = chars.as_str();
        let files: Vec<u8> = match f {
            '*' => (0..=v.max_file).collect(),
            'a'..='l' => vec![f as u8 - b'a'],
            _ => return Err(invalid(v, e)),
        };
        let ranks: Vec<u8> = match r {
            "*" | "" if f == '*' => (0..=v.max_rank).collect(),
            "*" => (0..=v.max_rank).collect(),
            digits => {
                let n: u8 = digits.parse().map_err(|_| invalid(v, e))?;
                match n.checked_sub(1) {
                    Some(r) => vec![r],
                    None => return Err(invalid(v, e)),
                }
            }
        };
        for &f in &files {
            for &r in &ranks {
                if let Some(sq) = Square::new(f, r) {
                    bb.set(sq);
                }
            }
        }
    }
    Ok(bb & v.board_bb())
}

fn letter_type(v: &Variant, e: &Entry, text: &str) -> Result<PieceType, ConfigError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => v.piece_type_from_letter(c).ok_or_else(|| ConfigError::PieceLetter {
            variant: v.name.clone(),
            letter: c,
        }),
        _ => Err(invalid(v, e)),
    }
}

/// 单个棋子字母，`-` 表示无
fn piece(v: &Variant, e: &Entry) -> Result<Option<PieceType>, ConfigError> {
    if e.value == "-" {
        return Ok(None);
    }
    letter_type(v, e, &e.value).map(Some)
}

fn pieces(v: &Variant, e: &Entry) -> Result<Vec<PieceType>, ConfigError> {
    v.parse_piece_list(&e.value)
}

/// `p:c n:g` 形式的映射
fn pairs(v: &Variant, e: &Entry) -> Result<Vec<(PieceType, String)>, ConfigError> {
    e.value
        .split_whitespace()
        .map(|token| {
            let (from, to) = token.split_once(':').ok_or_else(|| invalid(v, e))?;
            Ok((letter_type(v, e, from)?, to.to_string()))
        })
        .collect()
}

fn descending(mut types: Vec<PieceType>) -> Vec<PieceType> {
    types.sort_by_key(|pt| std::cmp::Reverse(*pt));
    types
}

/// `King` -> `king`
fn lower_first(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    Some(first.to_ascii_lowercase().to_string() + chars.as_str())
}
