//! 常量定义

/// 最大列数
pub const FILE_NB: usize = 12;

/// 最大行数
pub const RANK_NB: usize = 10;

/// 格子总数（索引为 rank * FILE_NB + file）
pub const SQUARE_NB: usize = FILE_NB * RANK_NB;

/// 自定义棋子槽位数
pub const CUSTOM_PIECE_NB: u8 = 25;

/// 胜负值（正值表示走子方获胜）
pub const VALUE_MATE: i32 = 32000;

/// 和棋值
pub const VALUE_DRAW: i32 = 0;

/// 引擎名称
pub const ENGINE_NAME: &str = "Fairy-Stockfish";

/// 引擎版本号 (major, minor, patch)
pub const ENGINE_VERSION: (u32, u32, u32) = (0, 1, 0);

/// 引擎作者
pub const ENGINE_AUTHORS: &str = "the rules crate authors";

/// 默认变体
pub const DEFAULT_VARIANT: &str = "chess";

/// 泰文列名 (a..h)
pub const THAI_FILES: [&str; 8] = ["ก", "ข", "ค", "ง", "จ", "ฉ", "ช", "ญ"];

/// 泰文数字 (1..8)
pub const THAI_DIGITS: [&str; 8] = ["๑", "๒", "๓", "๔", "๕", "๖", "๗", "๘"];
