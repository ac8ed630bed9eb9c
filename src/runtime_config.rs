//! # Runtime Configuration
//!
//! Process-level settings read from the environment at startup.
//!
//! ## `SWAGGERIZE_STACK_SIZE`
//!
//! Coroutine stack size in bytes, decimal (`16384`) or hex (`0x4000`).
//! Default `0x4000`. Every in-flight request holds one stack, so memory use is
//! roughly `stack_size × concurrent requests`. Handlers with deep call chains
//! or large locals need more (`0x8000` or `0x10000`).
//!
//! ## `SWAGGERIZE_ADDR`
//!
//! Listen address for `swaggerize serve`. Default `0.0.0.0:8080`.

use std::env;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Coroutine stack size in bytes
    pub stack_size: usize,
    pub addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_values(
            env::var("SWAGGERIZE_STACK_SIZE").ok().as_deref(),
            env::var("SWAGGERIZE_ADDR").ok().as_deref(),
        )
    }

    /// Build from raw values; unparseable or empty values use the defaults.
    pub fn from_values(stack_size: Option<&str>, addr: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            stack_size: stack_size
                .and_then(parse_size)
                .unwrap_or(defaults.stack_size),
            addr: addr
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.addr),
        }
    }

    /// Apply the stack size to the `may` scheduler. Call before serving.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
