//! Betza 走法描述解析
//!
//! 把 `mRcpR`、`fmWfcF`、`hlN` 这类描述解析成一组封闭的走法原子：
//! - 大写字母为原子（W F D N A H C Z G 跳子，R B Q 滑子，K = W + F）
//! - 原子重复（`WW`）或后缀数字（`R4`）表示骑行及其步数上限
//! - 小写字母为修饰（m c p g n i 以及方向 f b l r v s h）
//!
//! 修饰只作用于紧随其后的原子。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 原子种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomKind {
    /// 单步跳跃
    Leap,
    /// 沿射线滑行
    Slide,
    /// 翻过一个炮架后继续（炮）
    Hop,
    /// 落在炮架正后方（蚱蜢）
    Grasshopper,
}

/// 走法原子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveAtom {
    /// 白方视角的方向向量 (df, dr)
    pub vectors: Vec<(i8, i8)>,
    pub kind: AtomKind,
    /// 步数上限，0 表示不限
    pub range: u8,
    /// 可以走到空格
    pub quiet: bool,
    /// 可以吃子
    pub capture: bool,
    /// 中间格必须为空（蹩马腿）
    pub lame: bool,
    /// 仅在初始区域可用
    pub initial: bool,
}

/// 一种棋子的完整走法
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MovementSpec {
    pub atoms: Vec<MoveAtom>,
}

const DIRECTION_PAIRS: [&str; 22] = [
    "ff", "bb", "ll", "rr", "fl", "fr", "bl", "br", "lf", "rf", "lb", "rb", "fs", "bs", "lv",
    "rv", "fh", "bh", "lh", "rh", "hl", "hr",
];

#[derive(Default)]
struct Modifiers {
    quiet_only: bool,
    capture_only: bool,
    hop: bool,
    grasshopper: bool,
    lame: bool,
    initial: bool,
    directions: Vec<String>,
}

impl Modifiers {
    fn is_empty(&self) -> bool {
        !(self.quiet_only
            || self.capture_only
            || self.hop
            || self.grasshopper
            || self.lame
            || self.initial
            || !self.directions.is_empty())
    }
}

impl MovementSpec {
    /// 解析 Betza 字符串
    pub fn parse(betza: &str) -> Result<Self, ConfigError> {
        let fail = |reason: String| ConfigError::Betza {
            betza: betza.to_string(),
            reason,
        };
        let chars: Vec<char> = betza.chars().collect();
        let mut atoms = Vec::new();
        let mut mods = Modifiers::default();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                'm' => mods.quiet_only = true,
                'c' => mods.capture_only = true,
                'p' => mods.hop = true,
                'g' => mods.grasshopper = true,
                'n' => mods.lame = true,
                'i' => mods.initial = true,
                'f' | 'b' | 'l' | 'r' | 'v' | 's' | 'h' => {
                    let pair: Option<String> = chars
                        .get(i + 1)
                        .map(|next| format!("{}{}", c, next))
                        .filter(|p| DIRECTION_PAIRS.contains(&p.as_str()));
                    match pair {
                        Some(p) => {
                            mods.directions.push(p);
                            i += 1;
                        }
                        None if c == 'h' => {
                            return Err(fail(format!("dangling 'h' at {}", i)));
                        }
                        None => mods.directions.push(c.to_string()),
                    }
                }
                'W' | 'F' | 'D' | 'N' | 'A' | 'H' | 'C' | 'Z' | 'G' | 'K' | 'R' | 'B' | 'Q' => {
                    i += 1;
                    let rider = matches!(c, 'R' | 'B' | 'Q');
                    let mut range: u8 = if rider { 0 } else { 1 };
                    if !rider && chars.get(i) == Some(&c) {
                        range = 0;
                        i += 1;
                    }
                    let digits: String = chars[i..].iter().take_while(|d| d.is_ascii_digit()).collect();
                    if !digits.is_empty() {
                        range = digits
                            .parse()
                            .map_err(|_| fail(format!("bad range '{}'", digits)))?;
                        i += digits.len();
                    }
                    for base in atom_bases(c) {
                        atoms.push(build_atom(base, range, &mods));
                    }
                    mods = Modifiers::default();
                    continue;
                }
                other => return Err(fail(format!("unexpected '{}' at {}", other, i))),
            }
            i += 1;
        }

        if !mods.is_empty() {
            return Err(fail("modifiers without an atom".to_string()));
        }
        Ok(Self { atoms })
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// 是否存在向后的非吃子走法（兵可后退时兵步不重置五十步计数）
    pub fn has_quiet_backward(&self) -> bool {
        self.atoms
            .iter()
            .any(|a| a.quiet && a.vectors.iter().any(|(_, dr)| *dr < 0))
    }

    /// 是否含有骑行或炮类原子
    pub fn has_slider(&self) -> bool {
        self.atoms.iter().any(|a| a.kind != AtomKind::Leap)
    }
}

/// 原子字母对应的基础向量 (p, q)，p <= q
fn atom_bases(c: char) -> Vec<(i8, i8)> {
    match c {
        'W' | 'R' => vec![(0, 1)],
        'F' | 'B' => vec![(1, 1)],
        'K' | 'Q' => vec![(0, 1), (1, 1)],
        'D' => vec![(0, 2)],
        'N' => vec![(1, 2)],
        'A' => vec![(2, 2)],
        'H' => vec![(0, 3)],
        'C' => vec![(1, 3)],
        'Z' => vec![(2, 3)],
        'G' => vec![(3, 3)],
        _ => Vec::new(),
    }
}

fn build_atom(base: (i8, i8), range: u8, mods: &Modifiers) -> MoveAtom {
    let (p, q) = base;
    let mut vectors: Vec<(i8, i8)> = Vec::new();
    for (a, b) in [(p, q), (q, p)] {
        for sx in [1, -1] {
            for sy in [1, -1] {
                let v = (a * sx, b * sy);
                if !vectors.contains(&v) {
                    vectors.push(v);
                }
            }
        }
    }
    if !mods.directions.is_empty() {
        vectors.retain(|&(df, dr)| {
            mods.directions
                .iter()
                .any(|d| direction_matches(d, df as i32, dr as i32, (p as i32, q as i32)))
        });
    }
    vectors.sort();

    let kind = if mods.grasshopper {
        AtomKind::Grasshopper
    } else if mods.hop {
        AtomKind::Hop
    } else if range == 1 {
        AtomKind::Leap
    } else {
        AtomKind::Slide
    };
    let (quiet, capture) = match (mods.quiet_only, mods.capture_only) {
        (true, false) => (true, false),
        (false, true) => (false, true),
        _ => (true, true),
    };
    MoveAtom {
        vectors,
        kind,
        range,
        quiet,
        capture,
        lame: mods.lame,
        initial: mods.initial,
    }
}

/// 方向修饰是否选中向量 (df, dr)
fn direction_matches(dir: &str, df: i32, dr: i32, base: (i32, i32)) -> bool {
    // 直线原子上的双字母方向拆成两个单字母（`frlR`、`fsW`）
    let bytes = dir.as_bytes();
    let orthogonal = base.0 == 0 || base.1 == 0;
    if orthogonal && bytes.len() == 2 && bytes[0] != bytes[1] && !bytes.contains(&b'h') {
        return dir
            .chars()
            .any(|c| direction_matches(c.encode_utf8(&mut [0; 4]), df, dr, base));
    }
    let (adf, adr) = (df.abs(), dr.abs());
    let oblique = adf != adr && adf != 0 && adr != 0;
    let vertical = if oblique { adr > adf } else { true };
    let horizontal = if oblique { adf > adr } else { true };
    match dir {
        "f" | "ff" => dr > 0 && vertical,
        "b" | "bb" => dr < 0 && vertical,
        "l" | "ll" => df < 0 && horizontal,
        "r" | "rr" => df > 0 && horizontal,
        "v" => {
            if oblique {
                adr > adf
            } else {
                df == 0 || adf == adr
            }
        }
        "s" => {
            if oblique {
                adf > adr
            } else {
                dr == 0 || adf == adr
            }
        }
        "fh" => dr > 0,
        "bh" => dr < 0,
        "lh" => df < 0,
        "rh" => df > 0,
        "fl" => df < 0 && dr > 0 && vertical,
        "fr" => df > 0 && dr > 0 && vertical,
        "bl" => df < 0 && dr < 0 && vertical,
        "br" => df > 0 && dr < 0 && vertical,
        "lf" => df < 0 && dr > 0 && horizontal,
        "rf" => df > 0 && dr > 0 && horizontal,
        "lb" => df < 0 && dr < 0 && horizontal,
        "rb" => df > 0 && dr < 0 && horizontal,
        "fs" => direction_matches("f", df, dr, base) || direction_matches("s", df, dr, base),
        "bs" => direction_matches("b", df, dr, base) || direction_matches("s", df, dr, base),
        "lv" => {
            if oblique {
                df < 0 && adr > adf
            } else {
                direction_matches("l", df, dr, base) || direction_matches("v", df, dr, base)
            }
        }
        "rv" => {
            if oblique {
                df > 0 && adr > adf
            } else {
                direction_matches("r", df, dr, base) || direction_matches("v", df, dr, base)
            }
        }
        "hl" | "hr" => {
            if !oblique {
                return true;
            }
            let (a, b) = (base.0.min(base.1), base.0.max(base.1));
            let seed = if dir == "hl" { (-a, b) } else { (a, b) };
            let mut v = seed;
            for _ in 0..4 {
                if v == (df, dr) {
                    return true;
                }
                v = (v.1, -v.0);
            }
            false
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    fn vectors(betza: &str) -> Vec<(i8, i8)> {
        let spec = MovementSpec::parse(betza).unwrap();
        let mut all: Vec<(i8, i8)> = spec.atoms.iter().flat_map(|a| a.vectors.clone()).collect();
        all.sort();
        all
    }

    #[test]
    fn test_simple_atoms() {
        assert_eq!(vectors("W").len(), 4);
        assert_eq!(vectors("N").len(), 8);
        assert_eq!(vectors("K").len(), 8);
        let spec = MovementSpec::parse("R").unwrap();
        assert_eq!(spec.atoms[0].kind, AtomKind::Slide);
        assert_eq!(spec.atoms[0].range, 0);
    }

    #[test]
    fn test_range_and_doubling() {
        let spec = MovementSpec::parse("WW").unwrap();
        assert_eq!(spec.atoms[0].kind, AtomKind::Slide);
        assert_eq!(spec.atoms[0].range, 0);

        let spec = MovementSpec::parse("R4").unwrap();
        assert_eq!(spec.atoms[0].range, 4);

        let spec = MovementSpec::parse("pB2").unwrap();
        assert_eq!(spec.atoms[0].kind, AtomKind::Hop);
        assert_eq!(spec.atoms[0].range, 2);
    }

    #[test]
    fn test_pawn() {
        let spec = MovementSpec::parse("fmWfcF").unwrap();
        assert_eq!(spec.atoms.len(), 2);
        assert_eq!(spec.atoms[0].vectors, vec![(0, 1)]);
        assert!(spec.atoms[0].quiet && !spec.atoms[0].capture);
        assert_eq!(spec.atoms[1].vectors, vec![(-1, 1), (1, 1)]);
        assert!(!spec.atoms[1].quiet && spec.atoms[1].capture);
        assert!(!spec.has_quiet_backward());
        assert!(MovementSpec::parse("fbmWfcF").unwrap().has_quiet_backward());
    }

    #[test]
    fn test_forward_and_sideways_pair() {
        assert_eq!(vectors("fsmW"), vec![(-1, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_orthogonal_pairs_split() {
        assert_eq!(vectors("frlR"), vec![(-1, 0), (0, 1), (1, 0)]);
        assert_eq!(vectors("fFfR"), vec![(-1, 1), (0, 1), (1, 1)]);
        assert_eq!(vectors("frF"), vec![(1, 1)]);
    }

    #[test]
    fn test_narrow_knight() {
        assert_eq!(vectors("fN"), vec![(-1, 2), (1, 2)]);
        assert_eq!(vectors("fNsW"), vec![(-1, 0), (-1, 2), (1, 0), (1, 2)]);
    }

    #[test]
    fn test_half_planes() {
        assert_eq!(vectors("lhN"), vec![(-2, -1), (-2, 1), (-1, -2), (-1, 2)]);
        assert_eq!(vectors("rhN"), vec![(1, -2), (1, 2), (2, -1), (2, 1)]);
    }

    #[test]
    fn test_chiral_knights() {
        assert_eq!(vectors("hlN"), vec![(-2, -1), (-1, 2), (1, -2), (2, 1)]);
        assert_eq!(vectors("hrN"), vec![(-2, 1), (-1, -2), (1, 2), (2, -1)]);
    }

    #[test]
    fn test_cannon_variants() {
        let spec = MovementSpec::parse("mBcpB").unwrap();
        assert_eq!(spec.atoms[0].kind, AtomKind::Slide);
        assert!(spec.atoms[0].quiet && !spec.atoms[0].capture);
        assert_eq!(spec.atoms[1].kind, AtomKind::Hop);
        assert!(spec.atoms[1].capture && !spec.atoms[1].quiet);

        let spec = MovementSpec::parse("mRpRmFpB2").unwrap();
        assert_eq!(spec.atoms.len(), 4);
        assert_eq!(spec.atoms[2].kind, AtomKind::Leap);
        assert_eq!(spec.atoms[3].range, 2);
    }

    #[test]
    fn test_lame_and_initial() {
        let spec = MovementSpec::parse("ifmnD").unwrap();
        let atom = &spec.atoms[0];
        assert!(atom.initial && atom.lame && atom.quiet && !atom.capture);
        assert_eq!(atom.vectors, vec![(0, 2)]);
    }

    #[test]
    fn test_modifiers_reset_after_atom() {
        let spec = MovementSpec::parse("mNcB").unwrap();
        assert!(spec.atoms[0].quiet && !spec.atoms[0].capture);
        assert!(!spec.atoms[1].quiet && spec.atoms[1].capture);
        let spec = MovementSpec::parse("fRW").unwrap();
        assert_eq!(spec.atoms[1].vectors.len(), 4);
    }

    #[test]
    fn test_invalid() {
        assert!(MovementSpec::parse("X").is_err());
        assert!(MovementSpec::parse("fm").is_err());
        assert!(MovementSpec::parse("Rx").is_err());
        assert!(MovementSpec::parse("").unwrap().is_empty());
    }

    #[proptest]
    fn test_parse_is_total(#[strategy("[mcpgnifblrvshWFDNAHCZGKRBQ0-9x]{0,10}")] betza: String) {
        if let Ok(spec) = MovementSpec::parse(&betza) {
            for atom in &spec.atoms {
                assert!(atom.quiet || atom.capture);
                assert!(atom.vectors.iter().all(|v| *v != (0, 0)));
            }
        }
    }
}
