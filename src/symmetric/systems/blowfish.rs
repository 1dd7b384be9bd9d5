//! Blowfish 分组密码（64 位分组，32~448 位密钥）

mod tables;

use self::tables::{P_INIT, S_INIT};
use crate::common::errors::{Error, Result};
use crate::common::selftest::{SelfTest, SelfTestReport};
use crate::symmetric::modes;
use crate::symmetric::traits::{BlockCipher, CipherKind, Mode, key_bytes};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const BLOCK: usize = 8;
const ROUNDS: usize = 16;
pub const MIN_KEY_BITS: usize = 32;
pub const MAX_KEY_BITS: usize = 448;

/// Blowfish 密钥调度：子密钥数组与密钥相关的 S 盒
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Blowfish {
    p: [u32; ROUNDS + 2],
    s: [[u32; 256]; 4],
}

impl fmt::Debug for Blowfish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blowfish").finish_non_exhaustive()
    }
}

impl Blowfish {
    #[inline]
    fn f(&self, x: u32) -> u32 {
        let [a, b, c, d] = x.to_be_bytes();
        (self.s[0][a as usize].wrapping_add(self.s[1][b as usize]) ^ self.s[2][c as usize])
            .wrapping_add(self.s[3][d as usize])
    }

    fn encrypt_words(&self, mut xl: u32, mut xr: u32) -> (u32, u32) {
        for i in 0..ROUNDS {
            xl ^= self.p[i];
            xr ^= self.f(xl);
            std::mem::swap(&mut xl, &mut xr);
        }
        std::mem::swap(&mut xl, &mut xr);
        xr ^= self.p[ROUNDS];
        xl ^= self.p[ROUNDS + 1];
        (xl, xr)
    }

    fn decrypt_words(&self, mut xl: u32, mut xr: u32) -> (u32, u32) {
        for i in (2..ROUNDS + 2).rev() {
            xl ^= self.p[i];
            xr ^= self.f(xl);
            std::mem::swap(&mut xl, &mut xr);
        }
        std::mem::swap(&mut xl, &mut xr);
        xr ^= self.p[1];
        xl ^= self.p[0];
        (xl, xr)
    }

    /// 以 π 的展开为初值，用不断演化的调度加密零分组来填充 P 数组和 S 盒
    fn expand(key: &[u8]) -> Self {
        let mut bf = Self {
            p: P_INIT,
            s: S_INIT,
        };

        let mut pos = 0;
        for p in bf.p.iter_mut() {
            let mut word = 0u32;
            for _ in 0..4 {
                word = (word << 8) | u32::from(key[pos]);
                pos = (pos + 1) % key.len();
            }
            *p ^= word;
        }

        let (mut l, mut r) = (0u32, 0u32);
        for i in (0..ROUNDS + 2).step_by(2) {
            (l, r) = bf.encrypt_words(l, r);
            bf.p[i] = l;
            bf.p[i + 1] = r;
        }
        for box_idx in 0..4 {
            for j in (0..256).step_by(2) {
                (l, r) = bf.encrypt_words(l, r);
                bf.s[box_idx][j] = l;
                bf.s[box_idx][j + 1] = r;
            }
        }
        bf
    }
}

fn load(block: &[u8]) -> (u32, u32) {
    (
        u32::from_be_bytes([block[0], block[1], block[2], block[3]]),
        u32::from_be_bytes([block[4], block[5], block[6], block[7]]),
    )
}

fn store(block: &mut [u8], l: u32, r: u32) {
    block[..4].copy_from_slice(&l.to_be_bytes());
    block[4..].copy_from_slice(&r.to_be_bytes());
}

impl BlockCipher for Blowfish {
    const KIND: CipherKind = CipherKind::Blowfish;
    const BLOCK_SIZE: usize = BLOCK;

    fn with_key(key: &[u8], bits: usize) -> Result<Self> {
        if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
            return Err(Error::InvalidKeyLength {
                cipher: CipherKind::Blowfish,
                bits,
            });
        }
        let key = key_bytes(CipherKind::Blowfish, key, bits)?;
        log::trace!("BLOWFISH key schedule set up for {} bits", bits);
        Ok(Self::expand(key))
    }

    fn encrypt_in_place(&self, block: &mut [u8]) {
        let (l, r) = load(block);
        let (l, r) = self.encrypt_words(l, r);
        store(block, l, r);
    }

    fn decrypt_in_place(&self, block: &mut [u8]) {
        let (l, r) = load(block);
        let (l, r) = self.decrypt_words(l, r);
        store(block, l, r);
    }
}

/// Eric Young 整理的 Blowfish 测试向量（节选）
const ECB_VECTORS: [(&str, &str, &str); 5] = [
    ("0000000000000000", "0000000000000000", "4ef997456198dd78"),
    ("ffffffffffffffff", "ffffffffffffffff", "51866fd5b85ecb8a"),
    ("3000000000000000", "1000000000000001", "7d856f9a613063f2"),
    ("0123456789abcdef", "1111111111111111", "61f9c3802281b096"),
    ("fedcba9876543210", "0123456789abcdef", "0aceab0fc6a0a28d"),
];

const CBC_KEY: &str = "0123456789abcdeff0e1d2c3b4a59687";
const CBC_IV: &str = "fedcba9876543210";
const CBC_PLAIN: &str = "37363534333231204e6f77206973207468652074696d6520666f722000000000";
const CBC_CIPHER: &str = "6b77b4d63006dee605b156e27403979358deb9e7154616d959f1652bd5ff92cc";

/// 运行 Blowfish 的已知答案自检
pub fn self_test(verbose: bool) -> Result<SelfTestReport> {
    let mut st = SelfTest::new("BLOWFISH", verbose);
    for (i, (key, plain, cipher)) in ECB_VECTORS.into_iter().enumerate() {
        let key = hex::decode(key)?;
        let plain = hex::decode(plain)?;
        let expected = hex::decode(cipher)?;
        let bf = Blowfish::with_key(&key, key.len() * 8)?;

        let ct = bf.encrypt_block(&plain)?;
        st.check(&format!("ECB vector {} enc", i + 1), ct == expected)?;
        let pt = bf.decrypt_block(&ct)?;
        st.check(&format!("ECB vector {} dec", i + 1), pt == plain)?;
    }

    let key = hex::decode(CBC_KEY)?;
    let bf = Blowfish::with_key(&key, key.len() * 8)?;
    let plain = hex::decode(CBC_PLAIN)?;
    let mut iv = hex::decode(CBC_IV)?;
    let ct = modes::cbc(&bf, Mode::Encrypt, &mut iv, &plain)?;
    st.check("CBC enc", ct == hex::decode(CBC_CIPHER)?)?;
    let mut iv = hex::decode(CBC_IV)?;
    let pt = modes::cbc(&bf, Mode::Decrypt, &mut iv, &ct)?;
    st.check("CBC dec", pt == plain)?;

    Ok(st.finish())
}
