//! XTEA 分组密码：64 位分组，固定 128 位密钥，32 个循环（64 轮 Feistel）

use crate::common::errors::{Error, Result};
use crate::common::selftest::{SelfTest, SelfTestReport};
use crate::symmetric::modes;
use crate::symmetric::traits::{BlockCipher, CipherKind, Mode, key_bytes};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const BLOCK: usize = 8;
const KEY_BITS: usize = 128;
const CYCLES: u32 = 32;
const DELTA: u32 = 0x9E37_79B9;

/// XTEA 密钥：四个大端序 32 位字
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Xtea {
    k: [u32; 4],
}

impl fmt::Debug for Xtea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Xtea").finish_non_exhaustive()
    }
}

#[inline]
fn mix(v: u32) -> u32 {
    ((v << 4) ^ (v >> 5)).wrapping_add(v)
}

impl BlockCipher for Xtea {
    const KIND: CipherKind = CipherKind::Xtea;
    const BLOCK_SIZE: usize = BLOCK;

    fn with_key(key: &[u8], bits: usize) -> Result<Self> {
        if bits != KEY_BITS {
            return Err(Error::InvalidKeyLength {
                cipher: CipherKind::Xtea,
                bits,
            });
        }
        let key = key_bytes(CipherKind::Xtea, key, bits)?;
        let mut k = [0u32; 4];
        for (word, chunk) in k.iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        log::trace!("XTEA key set");
        Ok(Self { k })
    }

    fn encrypt_in_place(&self, block: &mut [u8]) {
        let mut v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let mut v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let mut sum: u32 = 0;
        for _ in 0..CYCLES {
            v0 = v0.wrapping_add(mix(v1) ^ sum.wrapping_add(self.k[(sum & 3) as usize]));
            sum = sum.wrapping_add(DELTA);
            v1 = v1.wrapping_add(mix(v0) ^ sum.wrapping_add(self.k[((sum >> 11) & 3) as usize]));
        }
        block[..4].copy_from_slice(&v0.to_be_bytes());
        block[4..].copy_from_slice(&v1.to_be_bytes());
    }

    fn decrypt_in_place(&self, block: &mut [u8]) {
        let mut v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let mut v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let mut sum: u32 = DELTA.wrapping_mul(CYCLES);
        for _ in 0..CYCLES {
            v1 = v1.wrapping_sub(mix(v0) ^ sum.wrapping_add(self.k[((sum >> 11) & 3) as usize]));
            sum = sum.wrapping_sub(DELTA);
            v0 = v0.wrapping_sub(mix(v1) ^ sum.wrapping_add(self.k[(sum & 3) as usize]));
        }
        block[..4].copy_from_slice(&v0.to_be_bytes());
        block[4..].copy_from_slice(&v1.to_be_bytes());
    }
}

const ECB_VECTORS: [(&str, &str, &str); 6] = [
    ("000102030405060708090a0b0c0d0e0f", "4142434445464748", "497df3d072612cb5"),
    ("000102030405060708090a0b0c0d0e0f", "4141414141414141", "e78f2d13744341d8"),
    ("000102030405060708090a0b0c0d0e0f", "5a5b6e278948d77f", "4141414141414141"),
    ("00000000000000000000000000000000", "4142434445464748", "a0390589f8b8efa5"),
    ("00000000000000000000000000000000", "4141414141414141", "ed23375a821a8c2d"),
    ("00000000000000000000000000000000", "70e1225d6e4e7655", "4141414141414141"),
];

const CBC_KEY: &str = "000102030405060708090a0b0c0d0e0f";
const CBC_IV: &str = "0001020304050607";
const CBC_PLAIN: &str = "4142434445464748494a4b4c4d4e4f50";
const CBC_CIPHER: &str = "c0b12fdc02abfbf73bef2ad00d060164";

/// 运行 XTEA 的已知答案自检
pub fn self_test(verbose: bool) -> Result<SelfTestReport> {
    let mut st = SelfTest::new("XTEA", verbose);
    for (i, (key, plain, cipher)) in ECB_VECTORS.into_iter().enumerate() {
        let xtea = Xtea::with_key(&hex::decode(key)?, KEY_BITS)?;
        let plain = hex::decode(plain)?;
        let ct = xtea.encrypt_block(&plain)?;
        st.check(&format!("ECB vector {} enc", i + 1), ct == hex::decode(cipher)?)?;
        st.check(
            &format!("ECB vector {} dec", i + 1),
            xtea.decrypt_block(&ct)? == plain,
        )?;
    }

    let xtea = Xtea::with_key(&hex::decode(CBC_KEY)?, KEY_BITS)?;
    let plain = hex::decode(CBC_PLAIN)?;
    let mut iv = hex::decode(CBC_IV)?;
    let ct = modes::cbc(&xtea, Mode::Encrypt, &mut iv, &plain)?;
    st.check("CBC enc", ct == hex::decode(CBC_CIPHER)?)?;
    let mut iv = hex::decode(CBC_IV)?;
    st.check("CBC dec", modes::cbc(&xtea, Mode::Decrypt, &mut iv, &ct)? == plain)?;

    Ok(st.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_128_bit_keys() {
        let key = [0u8; 32];
        assert!(Xtea::with_key(&key, 128).is_ok());
        for bits in [64, 192, 256, 120] {
            assert!(matches!(
                Xtea::with_key(&key, bits),
                Err(Error::InvalidKeyLength { bits: b, .. }) if b == bits
            ));
        }
    }

    #[test]
    fn test_known_vector() {
        let key: Vec<u8> = (0..16).collect();
        let xtea = Xtea::with_key(&key, 128).unwrap();
        let ct = xtea.encrypt_block(b"ABCDEFGH").unwrap();
        assert_eq!(hex::encode(ct), "497df3d072612cb5");
    }

    #[test]
    fn test_decrypt_sum_starts_at_full_schedule() {
        assert_eq!(DELTA.wrapping_mul(CYCLES), 0xC6EF_3720);
    }

    #[test]
    fn test_block_length_error_code() {
        let xtea = Xtea::with_key(&[0u8; 16], 128).unwrap();
        assert_eq!(xtea.decrypt_block(&[0u8; 9]).unwrap_err().code(), -0x0028);
    }

    #[test]
    fn test_self_test_passes() {
        let report = self_test(true).unwrap();
        assert_eq!(report.cases, 14);
        assert!(report.log[0].contains("XTEA test #1"));
    }
}
