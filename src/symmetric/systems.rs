//! # Block Cipher Systems
//!
//! This module gathers the cipher algorithms supported by the crate. Every block
//! cipher implements the `BlockCipher` trait and can be driven by the ECB/CBC
//! modes in `symmetric::modes`; ARC4 is a stream cipher with its own context.
//!
//! ---
//!
//! # 分组密码系统模块
//!
//! 本模块汇集了库支持的全部密码算法。每个分组密码都实现 `BlockCipher` 特征，
//! 可以交给 `symmetric::modes` 中的 ECB/CBC 模式驱动；ARC4 是流密码，自带上下文。

pub mod aes;
pub mod arc4;
pub mod blowfish;
pub mod camellia;
pub mod xtea;

pub use self::aes::Aes;
pub use self::arc4::Arc4;
pub use self::blowfish::Blowfish;
pub use self::camellia::Camellia;
pub use self::xtea::Xtea;
