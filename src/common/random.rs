//! 可注入的随机源。
//!
//! RSA 密钥生成、PKCS#1 填充和盲化都只依赖 [`RandomSource`]。任何实现了
//! `rand_core::TryCryptoRng` 的生成器（包括 `OsRng`）都自动满足该 trait，
//! 同步问题由随机源自己负责。

use crate::common::errors::{Error, Result};
use rand_core::TryCryptoRng;

/// 随机字节来源
pub trait RandomSource {
    /// 用随机字节填满 `dst`
    fn fill(&mut self, dst: &mut [u8]) -> Result<()>;
}

impl<R: TryCryptoRng + ?Sized> RandomSource for R {
    fn fill(&mut self, dst: &mut [u8]) -> Result<()> {
        self.try_fill_bytes(dst)
            .map_err(|e| Error::Random(e.to_string()))
    }
}

/// 操作系统提供的 CSPRNG
#[cfg(feature = "os-rng")]
pub fn os_rng() -> rand_core::OsRng {
    rand_core::OsRng
}

/// 填充不含 0x00 的随机字节（PKCS#1 v1.5 类型 2 填充使用）。
///
/// 每个字节最多重试 `MAX_ZERO_RETRIES` 次，随机源一直给出 0 时报告失败。
pub(crate) fn fill_nonzero<R: RandomSource + ?Sized>(rng: &mut R, dst: &mut [u8]) -> Result<()> {
    const MAX_ZERO_RETRIES: usize = 100;

    rng.fill(dst)?;
    let mut byte = [0u8; 1];
    for slot in dst.iter_mut() {
        let mut retries = 0;
        while *slot == 0 {
            if retries == MAX_ZERO_RETRIES {
                return Err(Error::Random(
                    "random source kept producing zero bytes".to_string(),
                ));
            }
            rng.fill(&mut byte)?;
            *slot = byte[0];
            retries += 1;
        }
    }
    Ok(())
}
