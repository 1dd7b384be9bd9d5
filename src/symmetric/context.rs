//! 分组密码上下文。
//!
//! [`CipherContext`] 是一个独占所有权的句柄：创建时不含密钥，`setkey` 之后可以反复
//! 加解密，离开作用域时密钥调度随 `Drop` 被清零。它没有实现 `Clone`，
//! 释放只能发生一次。

use crate::common::config::ParallelismConfig;
use crate::common::errors::{Error, Result};
use crate::common::random::RandomSource;
use crate::common::selftest::SelfTestReport;
use crate::symmetric::modes;
use crate::symmetric::systems::{Aes, Blowfish, Camellia, Xtea, aes, blowfish, camellia, xtea};
use crate::symmetric::traits::{BlockCipher, CipherKind, Mode};

/// 四种分组密码的密钥调度，封闭的标签联合
#[derive(Clone, Debug)]
pub enum Schedule {
    Aes(Aes),
    Blowfish(Blowfish),
    Camellia(Camellia),
    Xtea(Xtea),
}

macro_rules! dispatch {
    ($schedule:expr, $cipher:ident => $body:expr) => {
        match $schedule {
            Schedule::Aes($cipher) => $body,
            Schedule::Blowfish($cipher) => $body,
            Schedule::Camellia($cipher) => $body,
            Schedule::Xtea($cipher) => $body,
        }
    };
}

impl Schedule {
    /// 按算法派生密钥调度
    pub fn new(kind: CipherKind, key: &[u8], bits: usize) -> Result<Self> {
        Ok(match kind {
            CipherKind::Aes => Schedule::Aes(Aes::with_key(key, bits)?),
            CipherKind::Blowfish => Schedule::Blowfish(Blowfish::with_key(key, bits)?),
            CipherKind::Camellia => Schedule::Camellia(Camellia::with_key(key, bits)?),
            CipherKind::Xtea => Schedule::Xtea(Xtea::with_key(key, bits)?),
        })
    }

    pub fn kind(&self) -> CipherKind {
        match self {
            Schedule::Aes(_) => CipherKind::Aes,
            Schedule::Blowfish(_) => CipherKind::Blowfish,
            Schedule::Camellia(_) => CipherKind::Camellia,
            Schedule::Xtea(_) => CipherKind::Xtea,
        }
    }
}

/// 分组密码上下文
#[derive(Debug)]
pub struct CipherContext {
    kind: CipherKind,
    schedule: Option<Schedule>,
}

impl CipherContext {
    /// 创建一个尚未设置密钥的上下文
    pub fn new(kind: CipherKind) -> Self {
        Self {
            kind,
            schedule: None,
        }
    }

    pub fn kind(&self) -> CipherKind {
        self.kind
    }

    pub fn block_size(&self) -> usize {
        self.kind.block_size()
    }

    pub fn has_key(&self) -> bool {
        self.schedule.is_some()
    }

    /// 设置密钥（长度以位计），同时派生加解密两个方向的调度。
    ///
    /// 失败时原有的调度保持不变。
    pub fn setkey(&mut self, key: &[u8], bits: usize) -> Result<()> {
        match Schedule::new(self.kind, key, bits) {
            Ok(schedule) => {
                self.schedule = Some(schedule);
                Ok(())
            }
            Err(e) => {
                log::debug!("{} setkey rejected: {}", self.kind, e);
                Err(e)
            }
        }
    }

    fn schedule(&self) -> Result<&Schedule> {
        self.schedule.as_ref().ok_or(Error::KeyNotSet(self.kind))
    }

    /// 加密恰好一个分组
    pub fn encrypt_block(&self, input: &[u8]) -> Result<Vec<u8>> {
        dispatch!(self.schedule()?, c => c.encrypt_block(input))
    }

    /// 解密恰好一个分组
    pub fn decrypt_block(&self, input: &[u8]) -> Result<Vec<u8>> {
        dispatch!(self.schedule()?, c => c.decrypt_block(input))
    }

    /// ECB 模式，输入可以包含多个分组
    pub fn crypt_ecb(&self, mode: Mode, input: &[u8]) -> Result<Vec<u8>> {
        dispatch!(self.schedule()?, c => modes::ecb(c, mode, input))
    }

    /// 从随机源取一个分组长度的 IV，调用方没有现成 IV 时用于开始新的 CBC 链
    pub fn generate_iv<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<Vec<u8>> {
        let mut iv = vec![0u8; self.block_size()];
        rng.fill(&mut iv)?;
        Ok(iv)
    }

    /// CBC 模式，`iv` 会被改写为最后一个密文分组
    pub fn crypt_cbc(&self, mode: Mode, iv: &mut [u8], input: &[u8]) -> Result<Vec<u8>> {
        dispatch!(self.schedule()?, c => modes::cbc(c, mode, iv, input))
    }

    /// [并行] ECB 模式
    #[cfg(feature = "parallel")]
    pub fn par_crypt_ecb(
        &self,
        mode: Mode,
        input: &[u8],
        config: &ParallelismConfig,
    ) -> Result<Vec<u8>> {
        dispatch!(self.schedule()?, c => modes::par_ecb(c, mode, input, config))
    }

    /// [并行] CBC 模式，只有解密方向真正并行
    #[cfg(feature = "parallel")]
    pub fn par_crypt_cbc(
        &self,
        mode: Mode,
        iv: &mut [u8],
        input: &[u8],
        config: &ParallelismConfig,
    ) -> Result<Vec<u8>> {
        dispatch!(self.schedule()?, c => modes::par_cbc(c, mode, iv, input, config))
    }

    /// 按配置选择并行或顺序的 CBC
    pub fn crypt_cbc_with(
        &self,
        mode: Mode,
        iv: &mut [u8],
        input: &[u8],
        config: &ParallelismConfig,
    ) -> Result<Vec<u8>> {
        #[cfg(feature = "parallel")]
        {
            self.par_crypt_cbc(mode, iv, input, config)
        }
        #[cfg(not(feature = "parallel"))]
        {
            let _ = config;
            self.crypt_cbc(mode, iv, input)
        }
    }
}

/// 运行指定算法的已知答案自检
pub fn self_test(kind: CipherKind, verbose: bool) -> Result<SelfTestReport> {
    match kind {
        CipherKind::Aes => aes::self_test(verbose),
        CipherKind::Blowfish => blowfish::self_test(verbose),
        CipherKind::Camellia => camellia::self_test(verbose),
        CipherKind::Xtea => xtea::self_test(verbose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_before_setkey() {
        let ctx = CipherContext::new(CipherKind::Camellia);
        assert!(!ctx.has_key());
        let err = ctx.encrypt_block(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, Error::KeyNotSet(CipherKind::Camellia)));
    }

    #[test]
    fn test_failed_setkey_keeps_previous_schedule() {
        let mut ctx = CipherContext::new(CipherKind::Aes);
        ctx.setkey(&[0u8; 16], 128).unwrap();
        let before = ctx.encrypt_block(&[0u8; 16]).unwrap();

        let err = ctx.setkey(&[1u8; 16], 100).unwrap_err();
        assert_eq!(err.code(), -0x0020);
        assert_eq!(ctx.encrypt_block(&[0u8; 16]).unwrap(), before);
    }

    #[test]
    fn test_every_kind_roundtrips_cbc() {
        for kind in CipherKind::ALL {
            let mut ctx = CipherContext::new(kind);
            let bits = if kind == CipherKind::Blowfish { 448 } else { 128 };
            ctx.setkey(&[0xA5u8; 56], bits).unwrap();

            let bs = ctx.block_size();
            let plain: Vec<u8> = (0..bs * 5).map(|i| i as u8).collect();
            let iv = vec![0x3Cu8; bs];

            let mut enc_iv = iv.clone();
            let ct = ctx.crypt_cbc(Mode::Encrypt, &mut enc_iv, &plain).unwrap();
            let mut dec_iv = iv.clone();
            let pt = ctx.crypt_cbc(Mode::Decrypt, &mut dec_iv, &ct).unwrap();
            assert_eq!(pt, plain, "{}", kind);
            assert_eq!(enc_iv, dec_iv);
        }
    }

    #[test]
    fn test_generated_iv_roundtrips_cbc() {
        use rand_core::OsRng;

        for kind in CipherKind::ALL {
            let mut ctx = CipherContext::new(kind);
            ctx.setkey(&[0x5Au8; 16], 128).unwrap();
            let iv = ctx.generate_iv(&mut OsRng).unwrap();
            assert_eq!(iv.len(), ctx.block_size(), "{}", kind);

            let plain = vec![0x17u8; ctx.block_size() * 3];
            let mut enc_iv = iv.clone();
            let ct = ctx.crypt_cbc(Mode::Encrypt, &mut enc_iv, &plain).unwrap();
            let mut dec_iv = iv;
            assert_eq!(ctx.crypt_cbc(Mode::Decrypt, &mut dec_iv, &ct).unwrap(), plain);
        }
    }

    #[test]
    fn test_generate_iv_reports_rng_failure() {
        struct Broken;
        impl RandomSource for Broken {
            fn fill(&mut self, _dst: &mut [u8]) -> Result<()> {
                Err(Error::Random("unavailable".to_string()))
            }
        }

        let ctx = CipherContext::new(CipherKind::Xtea);
        assert!(matches!(ctx.generate_iv(&mut Broken), Err(Error::Random(_))));
    }

    #[test]
    fn test_ecb_multi_block() {
        let mut ctx = CipherContext::new(CipherKind::Xtea);
        ctx.setkey(&[0u8; 16], 128).unwrap();
        let ct = ctx.crypt_ecb(Mode::Encrypt, &[0x41u8; 24]).unwrap();
        assert_eq!(ct.len(), 24);
        assert_eq!(ctx.crypt_ecb(Mode::Decrypt, &ct).unwrap(), vec![0x41u8; 24]);
    }

    #[test]
    fn test_all_self_tests() {
        for kind in CipherKind::ALL {
            let report = self_test(kind, false).unwrap();
            assert_eq!(report.algorithm, kind.name());
        }
    }

    #[test]
    fn test_schedule_kind() {
        let s = Schedule::new(CipherKind::Blowfish, b"abcd", 32).unwrap();
        assert_eq!(s.kind(), CipherKind::Blowfish);
    }
}
