//! Camellia 分组密码（RFC 3713），128 位分组，128/192/256 位密钥。
//!
//! 两个 64 位半块组成 Feistel 网络，每 6 轮之间插入密钥相关的 FL/FL⁻¹ 线性层。
//! 解密使用同一网络、逆序的子密钥。

use crate::common::errors::{Error, Result};
use crate::common::selftest::{SelfTest, SelfTestReport};
use crate::symmetric::modes;
use crate::symmetric::traits::{BlockCipher, CipherKind, Mode, key_bytes};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const BLOCK: usize = 16;
const MASK64: u128 = u64::MAX as u128;

const SIGMA: [u64; 6] = [
    0xA09E667F3BCC908B,
    0xB67AE8584CAA73B2,
    0xC6EF372FE94F82BE,
    0x54FF53A5F1D36F1C,
    0x10E527FADE682D1D,
    0xB05688C2B3E6C1FD,
];

const SBOX1: [u8; 256] = [
    0x70, 0x82, 0x2C, 0xEC, 0xB3, 0x27, 0xC0, 0xE5, 0xE4, 0x85, 0x57, 0x35, 0xEA, 0x0C, 0xAE, 0x41,
    0x23, 0xEF, 0x6B, 0x93, 0x45, 0x19, 0xA5, 0x21, 0xED, 0x0E, 0x4F, 0x4E, 0x1D, 0x65, 0x92, 0xBD,
    0x86, 0xB8, 0xAF, 0x8F, 0x7C, 0xEB, 0x1F, 0xCE, 0x3E, 0x30, 0xDC, 0x5F, 0x5E, 0xC5, 0x0B, 0x1A,
    0xA6, 0xE1, 0x39, 0xCA, 0xD5, 0x47, 0x5D, 0x3D, 0xD9, 0x01, 0x5A, 0xD6, 0x51, 0x56, 0x6C, 0x4D,
    0x8B, 0x0D, 0x9A, 0x66, 0xFB, 0xCC, 0xB0, 0x2D, 0x74, 0x12, 0x2B, 0x20, 0xF0, 0xB1, 0x84, 0x99,
    0xDF, 0x4C, 0xCB, 0xC2, 0x34, 0x7E, 0x76, 0x05, 0x6D, 0xB7, 0xA9, 0x31, 0xD1, 0x17, 0x04, 0xD7,
    0x14, 0x58, 0x3A, 0x61, 0xDE, 0x1B, 0x11, 0x1C, 0x32, 0x0F, 0x9C, 0x16, 0x53, 0x18, 0xF2, 0x22,
    0xFE, 0x44, 0xCF, 0xB2, 0xC3, 0xB5, 0x7A, 0x91, 0x24, 0x08, 0xE8, 0xA8, 0x60, 0xFC, 0x69, 0x50,
    0xAA, 0xD0, 0xA0, 0x7D, 0xA1, 0x89, 0x62, 0x97, 0x54, 0x5B, 0x1E, 0x95, 0xE0, 0xFF, 0x64, 0xD2,
    0x10, 0xC4, 0x00, 0x48, 0xA3, 0xF7, 0x75, 0xDB, 0x8A, 0x03, 0xE6, 0xDA, 0x09, 0x3F, 0xDD, 0x94,
    0x87, 0x5C, 0x83, 0x02, 0xCD, 0x4A, 0x90, 0x33, 0x73, 0x67, 0xF6, 0xF3, 0x9D, 0x7F, 0xBF, 0xE2,
    0x52, 0x9B, 0xD8, 0x26, 0xC8, 0x37, 0xC6, 0x3B, 0x81, 0x96, 0x6F, 0x4B, 0x13, 0xBE, 0x63, 0x2E,
    0xE9, 0x79, 0xA7, 0x8C, 0x9F, 0x6E, 0xBC, 0x8E, 0x29, 0xF5, 0xF9, 0xB6, 0x2F, 0xFD, 0xB4, 0x59,
    0x78, 0x98, 0x06, 0x6A, 0xE7, 0x46, 0x71, 0xBA, 0xD4, 0x25, 0xAB, 0x42, 0x88, 0xA2, 0x8D, 0xFA,
    0x72, 0x07, 0xB9, 0x55, 0xF8, 0xEE, 0xAC, 0x0A, 0x36, 0x49, 0x2A, 0x68, 0x3C, 0x38, 0xF1, 0xA4,
    0x40, 0x28, 0xD3, 0x7B, 0xBB, 0xC9, 0x43, 0xC1, 0x15, 0xE3, 0xAD, 0xF4, 0x77, 0xC7, 0x80, 0x9E,
];
const SBOX2: [u8; 256] = derive_sbox(1);
const SBOX3: [u8; 256] = derive_sbox(7);
const SBOX4: [u8; 256] = derive_sbox4();

/// SBOX2 / SBOX3 是 SBOX1 输出的循环左移
const fn derive_sbox(rotate: u32) -> [u8; 256] {
    let mut out = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        out[i] = SBOX1[i].rotate_left(rotate);
        i += 1;
    }
    out
}

/// SBOX4 先把输入循环左移一位再查 SBOX1
const fn derive_sbox4() -> [u8; 256] {
    let mut out = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        out[i] = SBOX1[(i as u8).rotate_left(1) as usize];
        i += 1;
    }
    out
}

fn f(input: u64, key: u64) -> u64 {
    let x = (input ^ key).to_be_bytes();
    let t = [
        SBOX1[x[0] as usize],
        SBOX2[x[1] as usize],
        SBOX3[x[2] as usize],
        SBOX4[x[3] as usize],
        SBOX2[x[4] as usize],
        SBOX3[x[5] as usize],
        SBOX4[x[6] as usize],
        SBOX1[x[7] as usize],
    ];
    u64::from_be_bytes([
        t[0] ^ t[2] ^ t[3] ^ t[5] ^ t[6] ^ t[7],
        t[0] ^ t[1] ^ t[3] ^ t[4] ^ t[6] ^ t[7],
        t[0] ^ t[1] ^ t[2] ^ t[4] ^ t[5] ^ t[7],
        t[1] ^ t[2] ^ t[3] ^ t[4] ^ t[5] ^ t[6],
        t[0] ^ t[1] ^ t[5] ^ t[6] ^ t[7],
        t[1] ^ t[2] ^ t[4] ^ t[6] ^ t[7],
        t[2] ^ t[3] ^ t[4] ^ t[5] ^ t[7],
        t[0] ^ t[3] ^ t[4] ^ t[5] ^ t[6],
    ])
}

fn fl(x: u64, k: u64) -> u64 {
    let (mut x1, mut x2) = ((x >> 32) as u32, x as u32);
    let (k1, k2) = ((k >> 32) as u32, k as u32);
    x2 ^= (x1 & k1).rotate_left(1);
    x1 ^= x2 | k2;
    (u64::from(x1) << 32) | u64::from(x2)
}

fn fl_inv(y: u64, k: u64) -> u64 {
    let (mut y1, mut y2) = ((y >> 32) as u32, y as u32);
    let (k1, k2) = ((k >> 32) as u32, k as u32);
    y1 ^= y2 | k2;
    y2 ^= (y1 & k1).rotate_left(1);
    (u64::from(y1) << 32) | u64::from(y2)
}

fn halves(x: u128) -> [u64; 2] {
    [(x >> 64) as u64, (x & MASK64) as u64]
}

/// 一个方向的子密钥：白化密钥 kw、轮密钥 k、FL 层密钥 ke
#[derive(Clone, Default, Zeroize)]
struct Subkeys {
    kw: [u64; 4],
    k: [u64; 24],
    ke: [u64; 6],
}

/// Camellia 密钥调度，同时保存加密与解密两套子密钥
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Camellia {
    enc: Subkeys,
    dec: Subkeys,
    rounds: usize,
}

impl fmt::Debug for Camellia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camellia")
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}

impl Camellia {
    /// Feistel 轮数（18 或 24）
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    fn expand(key: &[u8]) -> Self {
        let kl = read_u128(&key[..16]);
        let kr = match key.len() {
            16 => 0,
            24 => {
                let right = u64::from_be_bytes([
                    key[16], key[17], key[18], key[19], key[20], key[21], key[22], key[23],
                ]);
                (u128::from(right) << 64) | u128::from(!right)
            }
            _ => read_u128(&key[16..32]),
        };

        let [mut d1, mut d2] = halves(kl ^ kr);
        d2 ^= f(d1, SIGMA[0]);
        d1 ^= f(d2, SIGMA[1]);
        d1 ^= (kl >> 64) as u64;
        d2 ^= (kl & MASK64) as u64;
        d2 ^= f(d1, SIGMA[2]);
        d1 ^= f(d2, SIGMA[3]);
        let ka = (u128::from(d1) << 64) | u128::from(d2);

        let mut sk = Subkeys::default();
        let rounds;
        if key.len() == 16 {
            rounds = 18;
            let rot = |x: u128, n: u32| halves(x.rotate_left(n));
            sk.kw[..2].copy_from_slice(&rot(kl, 0));
            sk.kw[2..].copy_from_slice(&rot(ka, 111));
            let ka45 = rot(ka, 45);
            let kl60 = rot(kl, 60);
            let parts = [
                rot(ka, 0),
                rot(kl, 15),
                rot(ka, 15),
                rot(kl, 45),
                [ka45[0], kl60[1]],
                rot(ka, 60),
                rot(kl, 94),
                rot(ka, 94),
                rot(kl, 111),
            ];
            for (i, pair) in parts.iter().enumerate() {
                sk.k[2 * i..2 * i + 2].copy_from_slice(pair);
            }
            sk.ke[..2].copy_from_slice(&rot(ka, 30));
            sk.ke[2..4].copy_from_slice(&rot(kl, 77));
        } else {
            rounds = 24;
            let [mut d1, mut d2] = halves(ka ^ kr);
            d2 ^= f(d1, SIGMA[4]);
            d1 ^= f(d2, SIGMA[5]);
            let kb = (u128::from(d1) << 64) | u128::from(d2);

            let rot = |x: u128, n: u32| halves(x.rotate_left(n));
            sk.kw[..2].copy_from_slice(&rot(kl, 0));
            sk.kw[2..].copy_from_slice(&rot(kb, 111));
            let parts = [
                rot(kb, 0),
                rot(kr, 15),
                rot(ka, 15),
                rot(kb, 30),
                rot(kl, 45),
                rot(ka, 45),
                rot(kr, 60),
                rot(kb, 60),
                rot(kl, 77),
                rot(kr, 94),
                rot(ka, 94),
                rot(kl, 111),
            ];
            for (i, pair) in parts.iter().enumerate() {
                sk.k[2 * i..2 * i + 2].copy_from_slice(pair);
            }
            sk.ke[..2].copy_from_slice(&rot(kr, 30));
            sk.ke[2..4].copy_from_slice(&rot(kl, 60));
            sk.ke[4..].copy_from_slice(&rot(ka, 77));
        }

        // 解密：白化密钥两两对调，轮密钥与 FL 密钥整体逆序
        let fl_keys = fl_key_count(rounds);
        let mut dec = Subkeys::default();
        dec.kw = [sk.kw[2], sk.kw[3], sk.kw[0], sk.kw[1]];
        for i in 0..rounds {
            dec.k[i] = sk.k[rounds - 1 - i];
        }
        for i in 0..fl_keys {
            dec.ke[i] = sk.ke[fl_keys - 1 - i];
        }

        Self {
            enc: sk,
            dec,
            rounds,
        }
    }

    fn crypt(&self, keys: &Subkeys, block: &mut [u8]) {
        let [mut d1, mut d2] = halves(read_u128(block));
        d1 ^= keys.kw[0];
        d2 ^= keys.kw[1];
        for i in (0..self.rounds).step_by(2) {
            if i > 0 && i % 6 == 0 {
                let j = (i / 6 - 1) * 2;
                d1 = fl(d1, keys.ke[j]);
                d2 = fl_inv(d2, keys.ke[j + 1]);
            }
            d2 ^= f(d1, keys.k[i]);
            d1 ^= f(d2, keys.k[i + 1]);
        }
        d2 ^= keys.kw[2];
        d1 ^= keys.kw[3];
        block[..8].copy_from_slice(&d2.to_be_bytes());
        block[8..].copy_from_slice(&d1.to_be_bytes());
    }
}

fn fl_key_count(rounds: usize) -> usize {
    (rounds / 6 - 1) * 2
}

fn read_u128(bytes: &[u8]) -> u128 {
    bytes[..16]
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | u128::from(b))
}

impl BlockCipher for Camellia {
    const KIND: CipherKind = CipherKind::Camellia;
    const BLOCK_SIZE: usize = BLOCK;

    fn with_key(key: &[u8], bits: usize) -> Result<Self> {
        if !matches!(bits, 128 | 192 | 256) {
            return Err(Error::InvalidKeyLength {
                cipher: CipherKind::Camellia,
                bits,
            });
        }
        let key = key_bytes(CipherKind::Camellia, key, bits)?;
        log::trace!("CAMELLIA key schedule set up for {} bits", bits);
        Ok(Self::expand(key))
    }

    fn encrypt_in_place(&self, block: &mut [u8]) {
        self.crypt(&self.enc, block);
    }

    fn decrypt_in_place(&self, block: &mut [u8]) {
        self.crypt(&self.dec, block);
    }
}

/// RFC 3713 附录 A 的测试向量
const ECB_VECTORS: [(&str, &str); 3] = [
    (
        "0123456789abcdeffedcba9876543210",
        "67673138549669730857065648eabe43",
    ),
    (
        "0123456789abcdeffedcba98765432100011223344556677",
        "b4993401b3e996f84ee5cee7d79b09b9",
    ),
    (
        "0123456789abcdeffedcba987654321000112233445566778899aabbccddeeff",
        "9acc237dff16d76c20ef7c919e3a7509",
    ),
];
const ECB_PLAIN: &str = "0123456789abcdeffedcba9876543210";

const CBC_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
const CBC_IV: &str = "000102030405060708090a0b0c0d0e0f";
const CBC_PLAIN: &str = "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51";
const CBC_CIPHER: &str = "1607cf494b36bbf00daeb0b503c831aba2f2cf671629ef7840c5a5dfb5074887";

/// 运行 Camellia 的已知答案自检
pub fn self_test(verbose: bool) -> Result<SelfTestReport> {
    let mut st = SelfTest::new("CAMELLIA", verbose);
    let plain = hex::decode(ECB_PLAIN)?;
    for (key, cipher) in ECB_VECTORS {
        let key = hex::decode(key)?;
        let cam = Camellia::with_key(&key, key.len() * 8)?;
        let label = format!("ECB-{}", key.len() * 8);

        let ct = cam.encrypt_block(&plain)?;
        st.check(&format!("{} enc", label), ct == hex::decode(cipher)?)?;
        let pt = cam.decrypt_block(&ct)?;
        st.check(&format!("{} dec", label), pt == plain)?;
    }

    let cam = Camellia::with_key(&hex::decode(CBC_KEY)?, 128)?;
    let plain = hex::decode(CBC_PLAIN)?;
    let mut iv = hex::decode(CBC_IV)?;
    let ct = modes::cbc(&cam, Mode::Encrypt, &mut iv, &plain)?;
    st.check("CBC-128 enc", ct == hex::decode(CBC_CIPHER)?)?;
    let mut iv = hex::decode(CBC_IV)?;
    let pt = modes::cbc(&cam, Mode::Decrypt, &mut iv, &ct)?;
    st.check("CBC-128 dec", pt == plain)?;

    Ok(st.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_sboxes() {
        assert_eq!(SBOX2[0], 0xE0);
        assert_eq!(SBOX3[0], 0x38);
        assert_eq!(SBOX4[0], 0x70);
        assert_eq!(SBOX1[255], 0x9E);
    }

    #[test]
    fn test_fl_layers_are_inverse() {
        let k = 0x0123_4567_89AB_CDEF;
        let x = 0xDEAD_BEEF_CAFE_BABE;
        assert_eq!(fl_inv(fl(x, k), k), x);
    }

    #[test]
    fn test_rounds_follow_key_size() {
        let key = [0x11u8; 32];
        assert_eq!(Camellia::with_key(&key, 128).unwrap().rounds(), 18);
        assert_eq!(Camellia::with_key(&key, 192).unwrap().rounds(), 24);
        assert_eq!(Camellia::with_key(&key, 256).unwrap().rounds(), 24);
    }

    #[test]
    fn test_invalid_key_length() {
        let err = Camellia::with_key(&[0u8; 32], 100).unwrap_err();
        assert_eq!(err.code(), -0x0024);
    }

    #[test]
    fn test_rfc3713_128() {
        let key = hex::decode("0123456789abcdeffedcba9876543210").unwrap();
        let cam = Camellia::with_key(&key, 128).unwrap();
        let ct = cam.encrypt_block(&key).unwrap();
        assert_eq!(hex::encode(&ct), "67673138549669730857065648eabe43");
        assert_eq!(cam.decrypt_block(&ct).unwrap(), key);
    }

    #[test]
    fn test_self_test_passes() {
        assert_eq!(self_test(false).unwrap().cases, 8);
    }
}
