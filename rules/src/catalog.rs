//! 变体目录：内置变体加上配置文本中登记的变体

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::builtin;
use crate::config::parse_config;
use crate::error::{ConfigError, Result, RuleError};
use crate::variant::Variant;

/// 变体目录
///
/// 载入后的变体以 `Arc` 共享，查询期间只读。
#[derive(Debug, Clone)]
pub struct VariantCatalog {
    variants: BTreeMap<String, Arc<Variant>>,
}

impl VariantCatalog {
    /// 只含内置变体的目录
    pub fn with_builtins() -> Self {
        let variants: BTreeMap<String, Arc<Variant>> = builtin::NAMES
            .iter()
            .filter_map(|name| builtin::by_name(name).map(|v| (name.to_string(), Arc::new(v))))
            .collect();
        info!(count = variants.len(), "loaded built-in variants");
        Self { variants }
    }

    /// 空目录
    pub fn empty() -> Self {
        Self {
            variants: BTreeMap::new(),
        }
    }

    /// 载入配置文本，返回登记的变体名
    ///
    /// 任一段落出错时目录保持不变。
    pub fn load_config(&mut self, text: &str) -> std::result::Result<Vec<String>, ConfigError> {
        let parsed = parse_config(text, |name| self.variants.get(name).map(|v| v.as_ref().clone()))?;
        let names: Vec<String> = parsed.iter().map(|v| v.name.clone()).collect();
        for v in parsed {
            self.variants.insert(v.name.clone(), Arc::new(v));
        }
        info!(count = names.len(), total = self.variants.len(), "loaded variant config");
        Ok(names)
    }

    /// 按名称查找
    pub fn get(&self, name: &str) -> Result<Arc<Variant>> {
        self.variants
            .get(name)
            .cloned()
            .ok_or_else(|| RuleError::UnknownVariant(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variants.contains_key(name)
    }

    /// 全部变体名（字典序）
    pub fn names(&self) -> Vec<String> {
        self.variants.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl Default for VariantCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}
