//! RSA 上下文：PKCS#1 v1.5 / v2.1 的加解密与签名验签。
//!
//! [`RsaContext`] 持有一组密钥分量与填充方式。密钥可以随机生成，也可以逐项导入；
//! 导入时立即做结构检查，之后每个操作再按方向确认所需的分量已经就绪：
//!
//! ```text
//! Empty --import_public--> Public --import_private / gen_key--> Private
//! ```
//!
//! 私钥方向的模幂总是先盲化、再用 CRT 计算。上下文离开作用域时所有分量被清零。

mod key;
mod padding;
mod selftest;

pub use self::key::MIN_MODULUS_BITS;
pub use self::selftest::self_test;

use self::key::RsaKey;
use self::padding::BlockType;
use crate::bignum::BigUint;
use crate::common::config::CryptoConfig;
use crate::common::errors::{Error, Result};
use crate::common::random::RandomSource;
use crate::common::utils::{ZeroizingVec, constant_time_eq};
use crate::hash::MdType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 填充方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Padding {
    /// PKCS#1 v1.5
    #[default]
    Pkcs1V15,
    /// PKCS#1 v2.1：加密用 OAEP，签名用 PSS
    Pkcs1V21,
}

impl Padding {
    /// PolarSSL 的数值编号（0 / 1）
    pub fn id(self) -> u8 {
        match self {
            Padding::Pkcs1V15 => 0,
            Padding::Pkcs1V21 => 1,
        }
    }
}

impl TryFrom<u8> for Padding {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Padding::Pkcs1V15),
            1 => Ok(Padding::Pkcs1V21),
            _ => Err(Error::RsaBadInput("unknown padding identifier")),
        }
    }
}

/// 选择使用哪个指数
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RsaMode {
    /// 公钥指数 E
    Public,
    /// 私钥指数 D（CRT）
    Private,
}

/// 上下文中已就绪的密钥分量
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyState {
    Empty,
    Public,
    Private,
}

/// RSA 上下文
pub struct RsaContext {
    key: RsaKey,
    state: KeyState,
    padding: Padding,
    hash_id: MdType,
    config: CryptoConfig,
}

impl fmt::Debug for RsaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaContext")
            .field("state", &self.state)
            .field("bits", &self.bits())
            .field("padding", &self.padding)
            .field("hash_id", &self.hash_id)
            .finish_non_exhaustive()
    }
}

impl RsaContext {
    /// 创建空上下文；`hash_id` 只在 v2.1 填充下使用
    pub fn new(padding: Padding, hash_id: MdType) -> Self {
        Self::with_config(padding, hash_id, CryptoConfig::default())
    }

    /// 使用给定配置（素数检测轮数、重试上限、模数上限）创建上下文
    pub fn with_config(padding: Padding, hash_id: MdType, config: CryptoConfig) -> Self {
        Self {
            key: RsaKey::default(),
            state: KeyState::Empty,
            padding,
            hash_id,
            config,
        }
    }

    pub fn set_padding(&mut self, padding: Padding, hash_id: MdType) {
        self.padding = padding;
        self.hash_id = hash_id;
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn hash_id(&self) -> MdType {
        self.hash_id
    }

    pub fn key_state(&self) -> KeyState {
        self.state
    }

    pub fn config(&self) -> &CryptoConfig {
        &self.config
    }

    /// 模数字节数，空上下文为 0
    pub fn len(&self) -> usize {
        self.key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state == KeyState::Empty
    }

    /// 模数位数
    pub fn bits(&self) -> usize {
        self.key.n.bits()
    }

    /// 生成新的密钥对并替换当前密钥。失败时上下文保持原状。
    pub fn gen_key<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
        bits: usize,
        exponent: u64,
    ) -> Result<()> {
        self.key = RsaKey::generate(rng, bits, exponent, &self.config)?;
        self.state = KeyState::Private;
        Ok(())
    }

    /// 按配置中的 `rsa_key_bits` 与 `rsa_public_exponent` 生成密钥对
    pub fn gen_key_from_config<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let (bits, exponent) = (self.config.rsa_key_bits, self.config.rsa_public_exponent);
        self.gen_key(rng, bits, exponent)
    }

    /// 导入公钥（大端序的 N 与 E），通过 [`RsaContext::check_pubkey`] 后才生效
    pub fn import_public(&mut self, n: &[u8], e: &[u8]) -> Result<()> {
        let key = RsaKey::public(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e));
        key.check_public(self.config.max_modulus_bits)?;
        self.key = key;
        self.state = KeyState::Public;
        Ok(())
    }

    /// 导入完整私钥，自动派生 DP、DQ、QP，通过私钥检查后才生效
    pub fn import_private(&mut self, n: &[u8], e: &[u8], d: &[u8], p: &[u8], q: &[u8]) -> Result<()> {
        let key = RsaKey::from_parts(
            BigUint::from_bytes_be(n),
            BigUint::from_bytes_be(e),
            BigUint::from_bytes_be(d),
            BigUint::from_bytes_be(p),
            BigUint::from_bytes_be(q),
        )?;
        key.check_private(self.config.max_modulus_bits)?;
        self.key = key;
        self.state = KeyState::Private;
        Ok(())
    }

    /// 公钥结构检查
    pub fn check_pubkey(&self) -> Result<()> {
        self.key.check_public(self.config.max_modulus_bits)
    }

    /// 私钥一致性检查（包含公钥检查）
    pub fn check_privkey(&self) -> Result<()> {
        self.key.check_private(self.config.max_modulus_bits)
    }

    pub fn n(&self) -> Vec<u8> {
        self.key.n.to_bytes_be()
    }

    pub fn e(&self) -> Vec<u8> {
        self.key.e.to_bytes_be()
    }

    pub fn d(&self) -> ZeroizingVec {
        self.key.d.to_bytes_be().into()
    }

    pub fn p(&self) -> ZeroizingVec {
        self.key.p.to_bytes_be().into()
    }

    pub fn q(&self) -> ZeroizingVec {
        self.key.q.to_bytes_be().into()
    }

    fn require(&self, mode: RsaMode) -> Result<()> {
        match (mode, self.state) {
            (_, KeyState::Empty) => Err(Error::InvalidKey("no key material has been set")),
            (RsaMode::Private, KeyState::Public) => {
                Err(Error::InvalidKey("operation needs the private key"))
            }
            _ => Ok(()),
        }
    }

    /// 原始公钥运算 `input^E mod N`。输入长度必须等于模数长度且小于 N。
    pub fn public(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.require(RsaMode::Public)?;
        self.key.public_op(input)
    }

    /// 原始私钥运算 `input^D mod N`，随机源用于盲化
    pub fn private<R: RandomSource + ?Sized>(&self, rng: &mut R, input: &[u8]) -> Result<Vec<u8>> {
        self.require(RsaMode::Private)?;
        self.key.private_op(rng, input)
    }

    fn apply<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        mode: RsaMode,
        input: &[u8],
    ) -> Result<Vec<u8>> {
        match mode {
            RsaMode::Public => self.public(input),
            RsaMode::Private => self.private(rng, input),
        }
    }

    /// v2.1 使用的摘要：优先取上下文的 `hash_id`
    fn v21_digest(&self, fallback: MdType) -> Result<MdType> {
        match (self.hash_id, fallback) {
            (MdType::None, MdType::None) => {
                Err(Error::RsaBadInput("PKCS#1 v2.1 padding needs a digest"))
            }
            (MdType::None, md) => Ok(md),
            (md, _) => Ok(md),
        }
    }

    /// 填充后加密。
    ///
    /// v1.5 下公钥方向使用类型 2 填充，私钥方向使用类型 1 填充；
    /// 消息最长为模数字节数减 11。v2.1 下使用 OAEP。
    pub fn pkcs1_encrypt<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        mode: RsaMode,
        input: &[u8],
    ) -> Result<Vec<u8>> {
        self.require(mode)?;
        let k = self.len();
        let em = match self.padding {
            Padding::Pkcs1V15 => {
                let block_type = match mode {
                    RsaMode::Public => BlockType::Encrypt,
                    RsaMode::Private => BlockType::Sign,
                };
                padding::pad_v15(rng, block_type, input, k)?
            }
            Padding::Pkcs1V21 => {
                padding::encode_oaep(rng, self.v21_digest(MdType::None)?, input, k)?
            }
        };
        let em = ZeroizingVec::from(em);
        self.apply(rng, mode, &em)
    }

    /// 解密并去掉填充。填充不合法时只返回 [`Error::InvalidPadding`]。
    pub fn pkcs1_decrypt<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        mode: RsaMode,
        input: &[u8],
    ) -> Result<ZeroizingVec> {
        self.require(mode)?;
        if input.len() != self.len() {
            return Err(Error::RsaBadInput("ciphertext length must equal the modulus length"));
        }
        let em = ZeroizingVec::from(self.apply(rng, mode, input)?);
        let plain = match self.padding {
            Padding::Pkcs1V15 => {
                let block_type = match mode {
                    RsaMode::Private => BlockType::Encrypt,
                    RsaMode::Public => BlockType::Sign,
                };
                padding::unpad_v15(&em, block_type)?
            }
            Padding::Pkcs1V21 => padding::decode_oaep(self.v21_digest(MdType::None)?, &em)?,
        };
        Ok(plain.into())
    }

    /// 解密到调用方提供的缓冲区，返回写入的字节数
    pub fn pkcs1_decrypt_into<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        mode: RsaMode,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        let plain = self.pkcs1_decrypt(rng, mode, input)?;
        if plain.len() > output.len() {
            return Err(Error::OutputTooLarge {
                max: output.len(),
                actual: plain.len(),
            });
        }
        output[..plain.len()].copy_from_slice(&plain);
        Ok(plain.len())
    }

    /// 对摘要签名。
    ///
    /// `md` 决定 DigestInfo 中的 OID，`hash` 的长度必须与之相符；`MdType::None`
    /// 表示 `hash` 已经是编码好的数据。v2.1 下使用 PSS，盐长等于摘要长度。
    pub fn pkcs1_sign<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        mode: RsaMode,
        md: MdType,
        hash: &[u8],
    ) -> Result<Vec<u8>> {
        self.require(mode)?;
        let em = match self.padding {
            Padding::Pkcs1V15 => padding::encode_sign_v15(md, hash, self.len())?,
            Padding::Pkcs1V21 => {
                check_hash_len(md, hash)?;
                padding::encode_pss(rng, self.v21_digest(md)?, hash, self.bits())?
            }
        };
        self.apply(rng, mode, &em)
    }

    /// 验证签名。除密钥不可用以外，任何不匹配都返回 [`Error::VerifyFailed`]。
    pub fn pkcs1_verify<R: RandomSource + ?Sized>(
        &self,
        rng: &mut R,
        mode: RsaMode,
        md: MdType,
        hash: &[u8],
        sig: &[u8],
    ) -> Result<()> {
        self.require(mode)?;
        if sig.len() != self.len() {
            return Err(Error::VerifyFailed);
        }
        let em = match self.apply(rng, mode, sig) {
            Ok(em) => em,
            Err(Error::RsaBadInput(_)) => return Err(Error::VerifyFailed),
            Err(e) => return Err(e),
        };

        match self.padding {
            Padding::Pkcs1V15 => {
                let expected = padding::encode_sign_v15(md, hash, self.len())
                    .map_err(mismatch_as_verify_failure)?;
                if constant_time_eq(&em, &expected) {
                    Ok(())
                } else {
                    Err(Error::VerifyFailed)
                }
            }
            Padding::Pkcs1V21 => {
                let pss_md = self.v21_digest(md)?;
                check_hash_len(md, hash).map_err(mismatch_as_verify_failure)?;
                padding::verify_pss(pss_md, hash, &em, self.bits())
            }
        }
    }
}

/// 验签时摘要与算法或模长不匹配，一律视为验证失败
fn mismatch_as_verify_failure(err: Error) -> Error {
    match err {
        Error::RsaBadInput(_) => Error::VerifyFailed,
        other => other,
    }
}

fn check_hash_len(md: MdType, hash: &[u8]) -> Result<()> {
    if md != MdType::None && hash.len() != md.size() {
        return Err(Error::RsaBadInput("digest length does not match the algorithm"));
    }
    Ok(())
}
