use crate::common::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 支持的分组密码算法
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherKind {
    Aes,
    Blowfish,
    Camellia,
    Xtea,
}

impl CipherKind {
    /// 全部算法，按固定顺序
    pub const ALL: [CipherKind; 4] = [
        CipherKind::Aes,
        CipherKind::Blowfish,
        CipherKind::Camellia,
        CipherKind::Xtea,
    ];

    /// 分组长度（字节）
    pub fn block_size(self) -> usize {
        match self {
            CipherKind::Aes | CipherKind::Camellia => 16,
            CipherKind::Blowfish | CipherKind::Xtea => 8,
        }
    }

    /// 算法名称（大写）
    pub fn name(self) -> &'static str {
        match self {
            CipherKind::Aes => "AES",
            CipherKind::Blowfish => "BLOWFISH",
            CipherKind::Camellia => "CAMELLIA",
            CipherKind::Xtea => "XTEA",
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 运算方向
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

/// 分组密码的公共特征。
///
/// 实现者在 [`BlockCipher::with_key`] 中一次性派生加解密两个方向的轮密钥，
/// 之后的分组变换都是只读的，因此同一个调度可以被多个线程同时使用。
pub trait BlockCipher: Sized + Send + Sync {
    /// 算法标识
    const KIND: CipherKind;

    /// 分组长度（字节）
    const BLOCK_SIZE: usize;

    /// 校验密钥长度（位）并派生密钥调度。
    ///
    /// `key` 至少要有 `bits / 8` 字节，多余的字节被忽略。
    fn with_key(key: &[u8], bits: usize) -> Result<Self>;

    /// 就地加密恰好一个分组
    fn encrypt_in_place(&self, block: &mut [u8]);

    /// 就地解密恰好一个分组
    fn decrypt_in_place(&self, block: &mut [u8]);

    /// 按方向就地变换一个分组，长度不等于分组长度时报错
    fn crypt_in_place(&self, mode: Mode, block: &mut [u8]) -> Result<()> {
        if block.len() != Self::BLOCK_SIZE {
            return Err(Error::InvalidInputLength {
                cipher: Self::KIND,
                len: block.len(),
            });
        }
        match mode {
            Mode::Encrypt => self.encrypt_in_place(block),
            Mode::Decrypt => self.decrypt_in_place(block),
        }
        Ok(())
    }

    /// 加密一个分组
    fn encrypt_block(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = input.to_vec();
        self.crypt_in_place(Mode::Encrypt, &mut out)?;
        Ok(out)
    }

    /// 解密一个分组
    fn decrypt_block(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = input.to_vec();
        self.crypt_in_place(Mode::Decrypt, &mut out)?;
        Ok(out)
    }
}

/// 取出密钥的前 `bits / 8` 字节；位数不是 8 的倍数或缓冲区不够长时报错
pub(crate) fn key_bytes(cipher: CipherKind, key: &[u8], bits: usize) -> Result<&[u8]> {
    if bits % 8 != 0 || key.len() < bits / 8 {
        return Err(Error::InvalidKeyLength { cipher, bits });
    }
    Ok(&key[..bits / 8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_and_sizes() {
        assert_eq!(CipherKind::Aes.to_string(), "AES");
        assert_eq!(CipherKind::Blowfish.block_size(), 8);
        assert_eq!(CipherKind::Camellia.block_size(), 16);
    }

    #[test]
    fn test_key_bytes_rejects_partial_bytes() {
        let key = [0u8; 32];
        assert_eq!(key_bytes(CipherKind::Aes, &key, 128).unwrap().len(), 16);
        assert!(key_bytes(CipherKind::Aes, &key, 127).is_err());
        assert!(key_bytes(CipherKind::Aes, &key[..8], 128).is_err());
    }
}
