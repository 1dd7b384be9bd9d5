//!
//! # 通用配置模块
//!
//! RSA 密钥生成参数、素性检测轮数以及并行分组处理的配置。
//! 配置可以来自默认值、JSON 文件或环境变量。
//!
use crate::common::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Miller-Rabin 轮数的下限，保证误判概率低于 2^-40
pub const MIN_PRIME_TEST_ROUNDS: usize = 20;

/// 环境变量前缀
const ENV_PREFIX: &str = "SEAL_PRIMS_";

/// 并行处理配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParallelismConfig {
    /// 线程数，0 表示交给 rayon 自行决定
    #[serde(default)]
    pub parallelism: usize,
    /// 输入少于这么多分组时直接走串行路径
    #[serde(default = "default_min_parallel_blocks")]
    pub min_parallel_blocks: usize,
}

fn default_min_parallel_blocks() -> usize {
    1024
}

impl Default for ParallelismConfig {
    fn default() -> Self {
        Self {
            parallelism: 0,
            min_parallel_blocks: default_min_parallel_blocks(),
        }
    }
}

/// 加密配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CryptoConfig {
    /// RSA 模数位数
    pub rsa_key_bits: usize,
    /// RSA 公钥指数
    pub rsa_public_exponent: u64,
    /// Miller-Rabin 轮数（低于 [`MIN_PRIME_TEST_ROUNDS`] 时按下限处理）
    pub prime_test_rounds: usize,
    /// 密钥对生成的最大尝试次数
    pub keygen_max_attempts: usize,
    /// 单个素数搜索时每一位允许的候选数
    pub prime_candidates_per_bit: usize,
    /// 允许的最大模数位数
    pub max_modulus_bits: usize,
    /// 并行处理配置
    pub parallelism: ParallelismConfig,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            rsa_key_bits: 2048,
            rsa_public_exponent: 65537,
            prime_test_rounds: MIN_PRIME_TEST_ROUNDS,
            keygen_max_attempts: 64,
            prime_candidates_per_bit: 40,
            max_modulus_bits: 8192,
            parallelism: ParallelismConfig::default(),
        }
    }
}

impl CryptoConfig {
    /// 从 JSON 文件加载配置，缺失的字段取默认值
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: CryptoConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// 从环境变量加载配置
    ///
    /// 无法解析的值会被忽略并保留默认值。
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(bits) = env_parse::<usize>("RSA_BITS") {
            config.rsa_key_bits = bits;
        }
        if let Some(exponent) = env_parse::<u64>("RSA_EXPONENT") {
            config.rsa_public_exponent = exponent;
        }
        if let Some(rounds) = env_parse::<usize>("PRIME_TEST_ROUNDS") {
            config.prime_test_rounds = rounds;
        }
        if let Some(attempts) = env_parse::<usize>("KEYGEN_MAX_ATTEMPTS") {
            config.keygen_max_attempts = attempts;
        }
        if let Some(threads) = env_parse::<usize>("PARALLELISM") {
            config.parallelism.parallelism = threads;
        }
        if let Some(blocks) = env_parse::<usize>("MIN_PARALLEL_BLOCKS") {
            config.parallelism.min_parallel_blocks = blocks;
        }

        config
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<()> {
        if self.rsa_key_bits < 128 || self.rsa_key_bits > self.max_modulus_bits {
            return Err(Error::Config(format!(
                "rsa_key_bits must be within 128..={}, got {}",
                self.max_modulus_bits, self.rsa_key_bits
            )));
        }
        if self.rsa_public_exponent < 3 || self.rsa_public_exponent % 2 == 0 {
            return Err(Error::Config(format!(
                "rsa_public_exponent must be odd and at least 3, got {}",
                self.rsa_public_exponent
            )));
        }
        if self.keygen_max_attempts == 0 || self.prime_candidates_per_bit == 0 {
            return Err(Error::Config(
                "key generation retry bounds must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// 实际使用的 Miller-Rabin 轮数
    pub fn effective_prime_rounds(&self) -> usize {
        self.prime_test_rounds.max(MIN_PRIME_TEST_ROUNDS)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(format!("{}{}", ENV_PREFIX, name))
        .ok()
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_crypto_config_default() {
        let config = CryptoConfig::default();

        assert_eq!(config.rsa_key_bits, 2048);
        assert_eq!(config.rsa_public_exponent, 65537);
        assert_eq!(config.effective_prime_rounds(), 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rounds_never_drop_below_minimum() {
        let config = CryptoConfig {
            prime_test_rounds: 3,
            ..Default::default()
        };
        assert_eq!(config.effective_prime_rounds(), MIN_PRIME_TEST_ROUNDS);

        let config = CryptoConfig {
            prime_test_rounds: 48,
            ..Default::default()
        };
        assert_eq!(config.effective_prime_rounds(), 48);
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "rsa_key_bits": 1024, "parallelism": {{ "parallelism": 2 }} }}"#)
            .unwrap();

        let config = CryptoConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rsa_key_bits, 1024);
        assert_eq!(config.rsa_public_exponent, 65537);
        assert_eq!(config.parallelism.parallelism, 2);
        assert_eq!(config.parallelism.min_parallel_blocks, 1024);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "rsa_public_exponent": 4 }}"#).unwrap();

        let err = CryptoConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = CryptoConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
