//! 通用模块，包含错误处理、配置、随机源与共享的工具函数

pub mod config;
pub mod errors;
pub mod random;
pub mod selftest;
pub mod utils;

pub use self::config::{CryptoConfig, ParallelismConfig};
pub use self::errors::{Error, Result, strerror};
pub use self::random::RandomSource;
pub use self::selftest::SelfTestReport;
pub use self::utils::{ZeroizingVec, constant_time_eq};
