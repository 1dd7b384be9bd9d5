//! 任意精度无符号整数。
//!
//! [`BigUint`] 以小端序的 64 位 limb 序列保存数值，规范形式不含高位的 0 limb，
//! 零就是空序列。算术运算都返回新值；模幂运算在内部使用 Montgomery 累加器。
//!
//! - `arith`：加减乘除与移位
//! - `modular`：gcd、模逆、模幂
//! - `montgomery`：Montgomery 乘法与定长窗口模幂
//! - `prime`：小素数筛、Miller-Rabin 与素数生成

mod arith;
mod modular;
mod montgomery;
mod prime;

pub use self::prime::{gen_prime, is_probable_prime};
pub(crate) use self::montgomery::MontgomeryContext;

use crate::common::errors::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 一个机器字
pub type Limb = u64;
pub(crate) type WideLimb = u128;
pub(crate) const LIMB_BITS: usize = 64;
const LIMB_BYTES: usize = 8;

/// 任意精度无符号整数
///
/// 离开作用域时 limb 会被清零，私钥运算中的临时值因此不会残留在内存里。
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct BigUint {
    limbs: Vec<Limb>,
}

impl BigUint {
    /// 零
    pub fn zero() -> Self {
        Self { limbs: Vec::new() }
    }

    /// 一
    pub fn one() -> Self {
        Self::from_u64(1)
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_limbs(vec![value])
    }

    /// 由小端序 limb 构造，自动去掉高位的 0 limb
    pub fn from_limbs(limbs: Vec<Limb>) -> Self {
        let mut n = Self { limbs };
        n.normalize();
        n
    }

    /// 由大端序字节构造（相当于 `mpi_read_binary`）
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        let mut limbs = Vec::with_capacity(bytes.len().div_ceil(LIMB_BYTES));
        for chunk in bytes.rchunks(LIMB_BYTES) {
            let mut limb: Limb = 0;
            for &byte in chunk {
                limb = (limb << 8) | Limb::from(byte);
            }
            limbs.push(limb);
        }
        Self::from_limbs(limbs)
    }

    /// 输出最短的大端序字节串；零输出空串
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let len = self.byte_len();
        let mut out = vec![0u8; len];
        self.write_be(&mut out);
        out
    }

    /// 输出恰好 `len` 字节的大端序字节串，高位补零（相当于 `mpi_write_binary`）
    pub fn to_bytes_be_padded(&self, len: usize) -> Result<Vec<u8>> {
        if self.byte_len() > len {
            return Err(Error::BadMpiInput("value does not fit into the output buffer"));
        }
        let mut out = vec![0u8; len];
        self.write_be(&mut out);
        Ok(out)
    }

    fn write_be(&self, out: &mut [u8]) {
        let len = out.len();
        for i in 0..self.byte_len().min(len) {
            let limb = self.limbs[i / LIMB_BYTES];
            out[len - 1 - i] = (limb >> (8 * (i % LIMB_BYTES))) as u8;
        }
    }

    /// 解析十六进制字符串（可带 `0x` 前缀，忽略下划线）
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches("0x");
        let mut nibbles = Vec::with_capacity(digits.len());
        for c in digits.chars().filter(|&c| c != '_') {
            let v = c
                .to_digit(16)
                .ok_or(Error::BadMpiInput("invalid hexadecimal character"))?;
            nibbles.push(v as u8);
        }
        let mut limbs = Vec::with_capacity(nibbles.len().div_ceil(16));
        for chunk in nibbles.rchunks(16) {
            let limb = chunk.iter().fold(0 as Limb, |acc, &n| (acc << 4) | Limb::from(n));
            limbs.push(limb);
        }
        Ok(Self::from_limbs(limbs))
    }

    /// 大写十六进制表示，零为 `"0"`
    pub fn to_hex(&self) -> String {
        match self.limbs.split_last() {
            None => "0".to_string(),
            Some((top, rest)) => {
                let mut s = format!("{:X}", top);
                for limb in rest.iter().rev() {
                    s.push_str(&format!("{:016X}", limb));
                }
                s
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.limbs.len() == 1 && self.limbs[0] == 1
    }

    pub fn is_odd(&self) -> bool {
        self.limbs.first().is_some_and(|l| l & 1 == 1)
    }

    pub fn is_even(&self) -> bool {
        !self.is_odd()
    }

    /// 有效位数（零为 0）
    pub fn bits(&self) -> usize {
        match self.limbs.last() {
            None => 0,
            Some(top) => (self.limbs.len() - 1) * LIMB_BITS + (LIMB_BITS - top.leading_zeros() as usize),
        }
    }

    /// 有效字节数（相当于 `mpi_size`）
    pub fn byte_len(&self) -> usize {
        self.bits().div_ceil(8)
    }

    /// 第 `i` 位（从最低位 0 开始）
    pub fn bit(&self, i: usize) -> bool {
        self.limbs
            .get(i / LIMB_BITS)
            .is_some_and(|l| (l >> (i % LIMB_BITS)) & 1 == 1)
    }

    pub fn set_bit(&mut self, i: usize, value: bool) {
        let idx = i / LIMB_BITS;
        if idx >= self.limbs.len() {
            if !value {
                return;
            }
            self.limbs.resize(idx + 1, 0);
        }
        let mask = 1 << (i % LIMB_BITS);
        if value {
            self.limbs[idx] |= mask;
        } else {
            self.limbs[idx] &= !mask;
        }
        self.normalize();
    }

    /// 末尾连续 0 位的个数（零返回 0）
    pub fn trailing_zeros(&self) -> usize {
        for (i, &limb) in self.limbs.iter().enumerate() {
            if limb != 0 {
                return i * LIMB_BITS + limb.trailing_zeros() as usize;
            }
        }
        0
    }

    /// 转成 u64，超出范围时返回 None
    pub fn to_u64(&self) -> Option<u64> {
        match self.limbs.len() {
            0 => Some(0),
            1 => Some(self.limbs[0]),
            _ => None,
        }
    }

    pub(crate) fn limbs(&self) -> &[Limb] {
        &self.limbs
    }

    fn normalize(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }
}

impl Ord for BigUint {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_limbs(&self.limbs, &other.limbs)
    }
}

impl PartialOrd for BigUint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 比较两个规范化的 limb 序列
pub(crate) fn cmp_limbs(a: &[Limb], b: &[Limb]) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.iter().rev().cmp(b.iter().rev()))
}

impl From<u64> for BigUint {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Debug for BigUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigUint(0x{})", self.to_hex())
    }
}

impl fmt::Display for BigUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}
