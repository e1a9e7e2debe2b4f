//! 命令行工具的请求与响应
//!
//! 每行一个 JSON 请求，例如
//! `{"cmd":"legal_moves","variant":"xiangqi","fen":"startpos","moves":["h3e3"]}`。
//! 省略的 `variant` 与 `chess960` 取引擎当前选项。

use serde::{Deserialize, Serialize};

use rules::{FenOptions, Notation};

use crate::engine::{Engine, STARTPOS};
use crate::error::{EngineError, Result};

fn startpos() -> String {
    STARTPOS.to_string()
}

/// 请求中的局面：变体、FEN 和走法序列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Game {
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default = "startpos")]
    pub fen: String,
    #[serde(default)]
    pub moves: Vec<String>,
    #[serde(default)]
    pub chess960: Option<bool>,
}

/// 请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    Version,
    Info,
    SetOption { name: String, value: String },
    LoadVariantConfig { text: String },
    Variants,
    StartFen { variant: Option<String> },
    TwoBoards { variant: Option<String> },
    CapturesToHand { variant: Option<String> },
    ValidateFen {
        fen: String,
        variant: Option<String>,
        #[serde(default)]
        chess960: Option<bool>,
    },
    LegalMoves(Game),
    GetFen {
        #[serde(flatten)]
        game: Game,
        #[serde(default)]
        sfen: bool,
        #[serde(default)]
        show_promoted: bool,
        #[serde(default)]
        count_started: i32,
    },
    GetSan {
        #[serde(flatten)]
        game: Game,
        #[serde(rename = "move")]
        mv: String,
        #[serde(default)]
        notation: i32,
    },
    GetSanMoves {
        #[serde(flatten)]
        game: Game,
        #[serde(default)]
        notation: i32,
    },
    GivesCheck(Game),
    IsCapture {
        #[serde(flatten)]
        game: Game,
        #[serde(rename = "move")]
        mv: String,
    },
    PieceToPartner(Game),
    GameResult(Game),
    IsImmediateGameEnd(Game),
    IsOptionalGameEnd(Game),
    HasInsufficientMaterial(Game),
    GetFogFen { fen: String, variant: Option<String> },
    Perft {
        #[serde(flatten)]
        game: Game,
        depth: u32,
    },
}

/// 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok,
    Text(String),
    Texts(Vec<String>),
    Flag(bool),
    Value(i32),
    Count(u64),
    Version(u32, u32, u32),
    GameEnd { ended: bool, result: i32 },
    Insufficient { white: bool, black: bool },
    Error(String),
}

impl Engine {
    /// 处理一个请求；错误转换为 [`Response::Error`]
    pub fn handle(&self, request: Request) -> Response {
        self.dispatch(request)
            .unwrap_or_else(|err| Response::Error(err.to_string()))
    }

    fn dispatch(&self, request: Request) -> Result<Response> {
        let opts = self.options()?;
        let name = |variant: Option<String>| variant.unwrap_or_else(|| opts.variant.clone());
        let flag = |chess960: Option<bool>| chess960.unwrap_or(opts.chess960);
        let notation = |code: i32| Notation::from_code(code).ok_or(EngineError::Notation(code));

        Ok(match request {
            Request::Version => {
                let (major, minor, patch) = self.version();
                Response::Version(major, minor, patch)
            }
            Request::Info => Response::Text(self.info()),
            Request::SetOption { name, value } => {
                self.set_option(&name, &value)?;
                Response::Ok
            }
            Request::LoadVariantConfig { text } => Response::Texts(self.load_variant_config(&text)?),
            Request::Variants => Response::Texts(self.variants()?),
            Request::StartFen { variant } => Response::Text(self.start_fen(&name(variant))?),
            Request::TwoBoards { variant } => Response::Flag(self.two_boards(&name(variant))?),
            Request::CapturesToHand { variant } => Response::Flag(self.captures_to_hand(&name(variant))?),
            Request::ValidateFen { fen, variant, chess960 } => {
                Response::Value(self.validate_fen(&fen, &name(variant), flag(chess960))?)
            }
            Request::LegalMoves(g) => {
                Response::Texts(self.legal_moves(&name(g.variant), &g.fen, &g.moves, flag(g.chess960))?)
            }
            Request::GetFen {
                game: g,
                sfen,
                show_promoted,
                count_started,
            } => {
                let fen_opts = FenOptions {
                    chess960: flag(g.chess960),
                    sfen,
                    show_promoted,
                    count_started,
                };
                Response::Text(self.get_fen(&name(g.variant), &g.fen, &g.moves, &fen_opts)?)
            }
            Request::GetSan { game: g, mv, notation: code } => {
                let pos_fen = self.get_fen(&name(g.variant.clone()), &g.fen, &g.moves, &FenOptions {
                    chess960: flag(g.chess960),
                    ..FenOptions::default()
                })?;
                Response::Text(self.get_san(&name(g.variant), &pos_fen, &mv, flag(g.chess960), notation(code)?)?)
            }
            Request::GetSanMoves { game: g, notation: code } => Response::Texts(self.get_san_moves(
                &name(g.variant),
                &g.fen,
                &g.moves,
                flag(g.chess960),
                notation(code)?,
            )?),
            Request::GivesCheck(g) => {
                Response::Flag(self.gives_check(&name(g.variant), &g.fen, &g.moves, flag(g.chess960))?)
            }
            Request::IsCapture { game: g, mv } => {
                Response::Flag(self.is_capture(&name(g.variant), &g.fen, &g.moves, &mv, flag(g.chess960))?)
            }
            Request::PieceToPartner(g) => Response::Text(self.piece_to_partner(&name(g.variant), &g.fen, &g.moves)?),
            Request::GameResult(g) => {
                Response::Value(self.game_result(&name(g.variant), &g.fen, &g.moves, flag(g.chess960))?)
            }
            Request::IsImmediateGameEnd(g) => {
                let (ended, result) =
                    self.is_immediate_game_end(&name(g.variant), &g.fen, &g.moves, flag(g.chess960))?;
                Response::GameEnd { ended, result }
            }
            Request::IsOptionalGameEnd(g) => {
                let (ended, result) =
                    self.is_optional_game_end(&name(g.variant), &g.fen, &g.moves, flag(g.chess960))?;
                Response::GameEnd { ended, result }
            }
            Request::HasInsufficientMaterial(g) => {
                let (white, black) =
                    self.has_insufficient_material(&name(g.variant), &g.fen, &g.moves, flag(g.chess960))?;
                Response::Insufficient { white, black }
            }
            Request::GetFogFen { fen, variant } => Response::Text(self.get_fog_fen(&fen, &name(variant))?),
            Request::Perft { game: g, depth } => {
                Response::Count(self.perft(&name(g.variant), &g.fen, &g.moves, depth, flag(g.chess960))?)
            }
        })
    }
}
