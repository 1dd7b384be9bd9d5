//! AES（Rijndael，FIPS-197）分组密码
//!
//! 字节序实现：状态按列存放，S 盒与逆 S 盒在编译期由 GF(2^8) 运算生成。

use crate::common::errors::{Error, Result};
use crate::common::selftest::{SelfTest, SelfTestReport};
use crate::symmetric::modes;
use crate::symmetric::traits::{BlockCipher, CipherKind, Mode, key_bytes};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const BLOCK: usize = 16;
const MAX_ROUNDS: usize = 14;

const SBOX: [u8; 256] = build_sbox();
const INV_SBOX: [u8; 256] = invert(&SBOX);

/// 用生成元 3 同时遍历乘法群及其逆元，再做仿射变换
const fn build_sbox() -> [u8; 256] {
    let mut sbox = [0u8; 256];
    let mut p: u8 = 1;
    let mut q: u8 = 1;
    loop {
        // p *= 3
        p = p ^ (p << 1) ^ if p & 0x80 != 0 { 0x1B } else { 0 };
        // q /= 3
        q ^= q << 1;
        q ^= q << 2;
        q ^= q << 4;
        if q & 0x80 != 0 {
            q ^= 0x09;
        }
        let x = q ^ q.rotate_left(1) ^ q.rotate_left(2) ^ q.rotate_left(3) ^ q.rotate_left(4);
        sbox[p as usize] = x ^ 0x63;
        if p == 1 {
            break;
        }
    }
    sbox[0] = 0x63;
    sbox
}

const fn invert(sbox: &[u8; 256]) -> [u8; 256] {
    let mut inv = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        inv[sbox[i] as usize] = i as u8;
        i += 1;
    }
    inv
}

#[inline]
fn xtime(x: u8) -> u8 {
    (x << 1) ^ (((x >> 7) & 1) * 0x1B)
}

fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0;
    while b != 0 {
        if b & 1 != 0 {
            p ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    p
}

/// AES 密钥调度，加解密共用同一组轮密钥
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Aes {
    round_keys: [u8; BLOCK * (MAX_ROUNDS + 1)],
    rounds: usize,
}

impl fmt::Debug for Aes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aes")
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}

impl Aes {
    /// 轮数（10/12/14）
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    fn expand(key: &[u8]) -> Self {
        let nk = key.len() / 4;
        let rounds = nk + 6;
        let total = 4 * (rounds + 1);
        let mut w = [0u8; BLOCK * (MAX_ROUNDS + 1)];
        w[..key.len()].copy_from_slice(key);

        let mut rcon: u8 = 1;
        for i in nk..total {
            let mut t = [w[4 * i - 4], w[4 * i - 3], w[4 * i - 2], w[4 * i - 1]];
            if i % nk == 0 {
                t.rotate_left(1);
                for b in t.iter_mut() {
                    *b = SBOX[*b as usize];
                }
                t[0] ^= rcon;
                rcon = xtime(rcon);
            } else if nk > 6 && i % nk == 4 {
                for b in t.iter_mut() {
                    *b = SBOX[*b as usize];
                }
            }
            for j in 0..4 {
                w[4 * i + j] = w[4 * (i - nk) + j] ^ t[j];
            }
        }
        Self {
            round_keys: w,
            rounds,
        }
    }

    fn add_round_key(&self, state: &mut [u8], round: usize) {
        let rk = &self.round_keys[BLOCK * round..BLOCK * (round + 1)];
        for (s, k) in state.iter_mut().zip(rk) {
            *s ^= k;
        }
    }
}

fn sub_bytes(state: &mut [u8], table: &[u8; 256]) {
    for b in state.iter_mut() {
        *b = table[*b as usize];
    }
}

fn shift_rows(state: &mut [u8]) {
    let old: [u8; BLOCK] = copy_block(state);
    for c in 0..4 {
        for r in 1..4 {
            state[4 * c + r] = old[4 * ((c + r) % 4) + r];
        }
    }
}

fn inv_shift_rows(state: &mut [u8]) {
    let old: [u8; BLOCK] = copy_block(state);
    for c in 0..4 {
        for r in 1..4 {
            state[4 * ((c + r) % 4) + r] = old[4 * c + r];
        }
    }
}

fn mix_columns(state: &mut [u8]) {
    for col in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [col[0], col[1], col[2], col[3]];
        let all = a0 ^ a1 ^ a2 ^ a3;
        col[0] ^= all ^ xtime(a0 ^ a1);
        col[1] ^= all ^ xtime(a1 ^ a2);
        col[2] ^= all ^ xtime(a2 ^ a3);
        col[3] ^= all ^ xtime(a3 ^ a0);
    }
}

fn inv_mix_columns(state: &mut [u8]) {
    for col in state.chunks_exact_mut(4) {
        let [a0, a1, a2, a3] = [col[0], col[1], col[2], col[3]];
        col[0] = gf_mul(a0, 14) ^ gf_mul(a1, 11) ^ gf_mul(a2, 13) ^ gf_mul(a3, 9);
        col[1] = gf_mul(a0, 9) ^ gf_mul(a1, 14) ^ gf_mul(a2, 11) ^ gf_mul(a3, 13);
        col[2] = gf_mul(a0, 13) ^ gf_mul(a1, 9) ^ gf_mul(a2, 14) ^ gf_mul(a3, 11);
        col[3] = gf_mul(a0, 11) ^ gf_mul(a1, 13) ^ gf_mul(a2, 9) ^ gf_mul(a3, 14);
    }
}

fn copy_block(state: &[u8]) -> [u8; BLOCK] {
    let mut out = [0u8; BLOCK];
    out.copy_from_slice(state);
    out
}

impl BlockCipher for Aes {
    const KIND: CipherKind = CipherKind::Aes;
    const BLOCK_SIZE: usize = BLOCK;

    fn with_key(key: &[u8], bits: usize) -> Result<Self> {
        if !matches!(bits, 128 | 192 | 256) {
            return Err(Error::InvalidKeyLength {
                cipher: CipherKind::Aes,
                bits,
            });
        }
        let key = key_bytes(CipherKind::Aes, key, bits)?;
        log::trace!("AES key schedule set up for {} bits", bits);
        Ok(Self::expand(key))
    }

    fn encrypt_in_place(&self, block: &mut [u8]) {
        debug_assert_eq!(block.len(), BLOCK);
        self.add_round_key(block, 0);
        for round in 1..self.rounds {
            sub_bytes(block, &SBOX);
            shift_rows(block);
            mix_columns(block);
            self.add_round_key(block, round);
        }
        sub_bytes(block, &SBOX);
        shift_rows(block);
        self.add_round_key(block, self.rounds);
    }

    fn decrypt_in_place(&self, block: &mut [u8]) {
        debug_assert_eq!(block.len(), BLOCK);
        self.add_round_key(block, self.rounds);
        for round in (1..self.rounds).rev() {
            inv_shift_rows(block);
            sub_bytes(block, &INV_SBOX);
            self.add_round_key(block, round);
            inv_mix_columns(block);
        }
        inv_shift_rows(block);
        sub_bytes(block, &INV_SBOX);
        self.add_round_key(block, 0);
    }
}

/// FIPS-197 附录 C 与 SP 800-38A F.2 的已知答案
const ECB_VECTORS: [(&str, &str, &str); 4] = [
    (
        "00000000000000000000000000000000",
        "00000000000000000000000000000000",
        "66e94bd4ef8a2c3b884cfa59ca342b2e",
    ),
    (
        "000102030405060708090a0b0c0d0e0f",
        "00112233445566778899aabbccddeeff",
        "69c4e0d86a7b0430d8cdb78070b4c55a",
    ),
    (
        "000102030405060708090a0b0c0d0e0f1011121314151617",
        "00112233445566778899aabbccddeeff",
        "dda97ca4864cdfe06eaf70a0ec0d7191",
    ),
    (
        "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
        "00112233445566778899aabbccddeeff",
        "8ea2b7ca516745bfeafc49904b496089",
    ),
];

const CBC_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
const CBC_IV: &str = "000102030405060708090a0b0c0d0e0f";
const CBC_PLAIN: &str = "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51";
const CBC_CIPHER: &str = "7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2";

/// 运行 AES 的已知答案自检
pub fn self_test(verbose: bool) -> Result<SelfTestReport> {
    let mut st = SelfTest::new("AES", verbose);
    for (key, plain, cipher) in ECB_VECTORS {
        let key = hex::decode(key)?;
        let plain = hex::decode(plain)?;
        let expected = hex::decode(cipher)?;
        let aes = Aes::with_key(&key, key.len() * 8)?;

        let label = format!("ECB-{}", key.len() * 8);
        let ct = aes.encrypt_block(&plain)?;
        st.check(&format!("{} enc", label), ct == expected)?;
        let pt = aes.decrypt_block(&ct)?;
        st.check(&format!("{} dec", label), pt == plain)?;
    }

    let aes = Aes::with_key(&hex::decode(CBC_KEY)?, 128)?;
    let plain = hex::decode(CBC_PLAIN)?;
    let expected = hex::decode(CBC_CIPHER)?;
    let mut iv = hex::decode(CBC_IV)?;
    let ct = modes::cbc(&aes, Mode::Encrypt, &mut iv, &plain)?;
    st.check("CBC-128 enc", ct == expected)?;
    let mut iv = hex::decode(CBC_IV)?;
    let pt = modes::cbc(&aes, Mode::Decrypt, &mut iv, &ct)?;
    st.check("CBC-128 dec", pt == plain)?;

    Ok(st.finish())
}
