//! # Seal-Prims: Self-Contained Cryptographic Primitives
//!
//! `seal-prims` implements the primitive layer underneath a managed binding: block
//! ciphers with their key schedules, ECB/CBC chaining, an arbitrary-precision integer
//! engine, and RSA with PKCS#1 v1.5 / v2.1 encodings. Hash functions and Base64 are
//! provided as supporting primitives.
//!
//! ## Core Concepts
//!
//! - **`CipherContext`**: an owned handle for AES, Blowfish, Camellia or XTEA. Create it,
//!   `setkey` once, then run ECB/CBC any number of times. The key schedule is wiped on drop.
//! - **`RsaContext`**: an owned RSA key plus its padding mode. Keys are generated or
//!   imported field by field; every operation checks the key state first.
//! - **`BigUint`**: the integer engine behind RSA, with Montgomery exponentiation and
//!   Miller-Rabin primality testing.
//! - **`RandomSource`**: the injected randomness capability. Any `rand_core::TryCryptoRng`
//!   qualifies.
//! - **`Error::code`**: every failure maps to a stable negative status code, and
//!   `strerror` turns a code back into a message.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use seal_prims::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut aes = CipherContext::new(CipherKind::Aes);
//!     aes.setkey(&[0u8; 32], 256)?;
//!     let mut iv = [0u8; 16];
//!     let ct = aes.crypt_cbc(Mode::Encrypt, &mut iv, &[0x42u8; 64])?;
//!
//!     let mut rng = seal_prims::common::random::os_rng();
//!     let mut rsa = RsaContext::new(Padding::Pkcs1V15, MdType::None);
//!     rsa.gen_key(&mut rng, 2048, 65537)?;
//!     let hash = seal_prims::hash::digest(MdType::Sha256, &ct)?;
//!     let sig = rsa.pkcs1_sign(&mut rng, RsaMode::Private, MdType::Sha256, &hash)?;
//!     rsa.pkcs1_verify(&mut rng, RsaMode::Public, MdType::Sha256, &hash, &sig)?;
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! # Seal-Prims：自包含的密码学原语库
//!
//! 分组密码与密钥调度、ECB/CBC 链接模式、任意精度整数引擎，以及基于它的 RSA
//! PKCS#1 v1.5 / v2.1。哈希与 Base64 作为辅助原语提供。所有上下文都是独占所有权的
//! 句柄，释放时清零密钥材料。

pub mod asymmetric;
pub mod bignum;
pub mod common;
pub mod encoding;
pub mod hash;
pub mod symmetric;

pub use crate::asymmetric::{KeyState, Padding, RsaContext, RsaMode};
pub use crate::bignum::BigUint;
pub use crate::common::{
    CryptoConfig, Error, ParallelismConfig, RandomSource, Result, SelfTestReport, ZeroizingVec,
    strerror,
};
pub use crate::hash::{HashState, MdType};
pub use crate::symmetric::systems::Arc4;
pub use crate::symmetric::{BlockCipher, CipherContext, CipherKind, Mode};

/// 最常用的类型与 trait
pub mod prelude {
    pub use crate::asymmetric::{Padding, RsaContext, RsaMode};
    pub use crate::common::{CryptoConfig, Error, RandomSource, Result};
    pub use crate::hash::MdType;
    pub use crate::symmetric::{BlockCipher, CipherContext, CipherKind, Mode};
}

/// The version of the `seal-prims` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 依次运行全部算法的已知答案自检，遇到第一个失败即返回错误
pub fn self_test_all(verbose: bool) -> Result<Vec<SelfTestReport>> {
    let mut reports = Vec::new();
    for kind in CipherKind::ALL {
        reports.push(symmetric::context::self_test(kind, verbose)?);
    }
    reports.push(symmetric::systems::arc4::self_test(verbose)?);
    for md in MdType::ALL {
        reports.push(hash::self_test(md, verbose)?);
    }
    reports.push(encoding::self_test(verbose)?);
    reports.push(asymmetric::systems::rsa::self_test(verbose)?);
    log::debug!("{} self tests passed", reports.len());
    Ok(reports)
}
