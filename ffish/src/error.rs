//! 查询层错误类型

use rules::{ConfigError, RuleError};
use thiserror::Error;

/// 引擎错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 规则层错误（未知变体、非法走法、FEN 无效）
    #[error(transparent)]
    Rules(#[from] RuleError),

    /// 变体配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 未知选项
    #[error("No such option '{0}'")]
    UnknownOption(String),

    /// 选项值无效
    #[error("Invalid value '{value}' for option {name}")]
    OptionValue { name: String, value: String },

    /// 未知记法代码
    #[error("Unknown notation code {0}")]
    Notation(i32),

    /// 锁被污染
    #[error("Engine state poisoned")]
    Poisoned,
}

/// 查询结果类型
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_errors_pass_through() {
        let err: EngineError = RuleError::UnknownVariant("nosuch".to_string()).into();
        assert_eq!(err.to_string(), "Unknown variant: nosuch");
        let err = EngineError::UnknownOption("Hash".to_string());
        assert_eq!(err.to_string(), "No such option 'Hash'");
    }
}
