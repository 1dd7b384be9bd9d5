//! 加减乘除与移位

use super::{BigUint, LIMB_BITS, Limb, WideLimb, cmp_limbs};
use crate::common::errors::{Error, Result};
use std::cmp::Ordering;
use std::ops::{Add, Mul, Shl, Shr};

impl BigUint {
    /// `self + other`
    pub fn add(&self, other: &BigUint) -> BigUint {
        let (long, short) = if self.limbs.len() >= other.limbs.len() {
            (&self.limbs, &other.limbs)
        } else {
            (&other.limbs, &self.limbs)
        };
        let mut out = Vec::with_capacity(long.len() + 1);
        let mut carry = false;
        for (i, &a) in long.iter().enumerate() {
            let b = short.get(i).copied().unwrap_or(0);
            let (s, c1) = a.overflowing_add(b);
            let (s, c2) = s.overflowing_add(carry as Limb);
            out.push(s);
            carry = c1 || c2;
        }
        if carry {
            out.push(1);
        }
        BigUint::from_limbs(out)
    }

    /// `self - other`，结果为负时返回 [`Error::NegativeValue`]
    pub fn checked_sub(&self, other: &BigUint) -> Result<BigUint> {
        if cmp_limbs(&self.limbs, &other.limbs) == Ordering::Less {
            return Err(Error::NegativeValue);
        }
        let mut out = self.limbs.clone();
        sub_in_place(&mut out, &other.limbs);
        Ok(BigUint::from_limbs(out))
    }

    pub fn add_u64(&self, v: u64) -> BigUint {
        self.add(&BigUint::from_u64(v))
    }

    pub fn checked_sub_u64(&self, v: u64) -> Result<BigUint> {
        self.checked_sub(&BigUint::from_u64(v))
    }

    /// 教科书乘法
    pub fn mul(&self, other: &BigUint) -> BigUint {
        if self.is_zero() || other.is_zero() {
            return BigUint::zero();
        }
        let a = &self.limbs;
        let b = &other.limbs;
        let mut out = vec![0 as Limb; a.len() + b.len()];
        for (i, &ai) in a.iter().enumerate() {
            let mut carry: WideLimb = 0;
            for (j, &bj) in b.iter().enumerate() {
                let t = WideLimb::from(ai) * WideLimb::from(bj) + WideLimb::from(out[i + j]) + carry;
                out[i + j] = t as Limb;
                carry = t >> LIMB_BITS;
            }
            out[i + b.len()] = carry as Limb;
        }
        BigUint::from_limbs(out)
    }

    /// 带余除法，返回 `(商, 余数)`
    pub fn div_rem(&self, divisor: &BigUint) -> Result<(BigUint, BigUint)> {
        if divisor.is_zero() {
            return Err(Error::DivisionByZero);
        }
        if cmp_limbs(&self.limbs, &divisor.limbs) == Ordering::Less {
            return Ok((BigUint::zero(), self.clone()));
        }
        if divisor.limbs.len() == 1 {
            let (q, r) = div_rem_limb(&self.limbs, divisor.limbs[0]);
            return Ok((BigUint::from_limbs(q), BigUint::from_u64(r)));
        }
        let (q, r) = div_rem_knuth(&self.limbs, &divisor.limbs);
        Ok((BigUint::from_limbs(q), BigUint::from_limbs(r)))
    }

    /// `self mod m`
    pub fn rem(&self, modulus: &BigUint) -> Result<BigUint> {
        Ok(self.div_rem(modulus)?.1)
    }

    /// 对单个 limb 取余，素数试除时使用
    pub fn rem_u64(&self, m: u64) -> Result<u64> {
        if m == 0 {
            return Err(Error::DivisionByZero);
        }
        Ok(div_rem_limb(&self.limbs, m).1)
    }

    /// 左移 `shift` 位
    pub fn shl_bits(&self, shift: usize) -> BigUint {
        if self.is_zero() {
            return BigUint::zero();
        }
        let limb_shift = shift / LIMB_BITS;
        let bit_shift = shift % LIMB_BITS;
        let mut out = vec![0 as Limb; limb_shift];
        if bit_shift == 0 {
            out.extend_from_slice(&self.limbs);
        } else {
            let mut carry: Limb = 0;
            for &limb in &self.limbs {
                out.push((limb << bit_shift) | carry);
                carry = limb >> (LIMB_BITS - bit_shift);
            }
            out.push(carry);
        }
        BigUint::from_limbs(out)
    }

    /// 右移 `shift` 位
    pub fn shr_bits(&self, shift: usize) -> BigUint {
        let limb_shift = shift / LIMB_BITS;
        if limb_shift >= self.limbs.len() {
            return BigUint::zero();
        }
        let bit_shift = shift % LIMB_BITS;
        let src = &self.limbs[limb_shift..];
        let mut out = Vec::with_capacity(src.len());
        for i in 0..src.len() {
            let mut limb = src[i] >> bit_shift;
            if bit_shift != 0 && i + 1 < src.len() {
                limb |= src[i + 1] << (LIMB_BITS - bit_shift);
            }
            out.push(limb);
        }
        BigUint::from_limbs(out)
    }
}

/// `a -= b`，调用方保证 `a >= b`
fn sub_in_place(a: &mut [Limb], b: &[Limb]) {
    let mut borrow = false;
    for (i, limb) in a.iter_mut().enumerate() {
        let rhs = b.get(i).copied().unwrap_or(0);
        if rhs == 0 && !borrow && i >= b.len() {
            break;
        }
        let (d, b1) = limb.overflowing_sub(rhs);
        let (d, b2) = d.overflowing_sub(borrow as Limb);
        *limb = d;
        borrow = b1 || b2;
    }
    debug_assert!(!borrow);
}

/// 除数只有一个 limb 时的快速路径
fn div_rem_limb(a: &[Limb], d: Limb) -> (Vec<Limb>, Limb) {
    let mut q = vec![0 as Limb; a.len()];
    let mut rem: WideLimb = 0;
    let d = WideLimb::from(d);
    for i in (0..a.len()).rev() {
        let cur = (rem << LIMB_BITS) | WideLimb::from(a[i]);
        q[i] = (cur / d) as Limb;
        rem = cur % d;
    }
    (q, rem as Limb)
}

/// Knuth 算法 D（TAOCP 4.3.1），要求 `v.len() >= 2` 且 `u >= v`
fn div_rem_knuth(u: &[Limb], v: &[Limb]) -> (Vec<Limb>, Vec<Limb>) {
    let n = v.len();
    let m = u.len() - n;
    let base: WideLimb = 1 << LIMB_BITS;

    // D1：规范化，使除数最高位为 1
    let shift = v[n - 1].leading_zeros() as usize;
    let vn = shl_limbs(v, shift, n);
    let mut un = shl_limbs(u, shift, u.len() + 1);

    let v_top = WideLimb::from(vn[n - 1]);
    let v_next = WideLimb::from(vn[n - 2]);
    let mut q = vec![0 as Limb; m + 1];

    for j in (0..=m).rev() {
        // D3：估计商
        let num = (WideLimb::from(un[j + n]) << LIMB_BITS) | WideLimb::from(un[j + n - 1]);
        let mut qhat = num / v_top;
        let mut rhat = num % v_top;
        while qhat >= base || qhat * v_next > ((rhat << LIMB_BITS) | WideLimb::from(un[j + n - 2])) {
            qhat -= 1;
            rhat += v_top;
            if rhat >= base {
                break;
            }
        }

        // D4：乘减
        let mut borrow: WideLimb = 0;
        let mut carry: WideLimb = 0;
        for i in 0..n {
            let p = qhat * WideLimb::from(vn[i]) + carry;
            carry = p >> LIMB_BITS;
            let sub = (p & (base - 1)) + borrow;
            let cur = WideLimb::from(un[i + j]);
            if cur >= sub {
                un[i + j] = (cur - sub) as Limb;
                borrow = 0;
            } else {
                un[i + j] = (cur + base - sub) as Limb;
                borrow = 1;
            }
        }
        let sub = carry + borrow;
        let cur = WideLimb::from(un[j + n]);
        let negative = cur < sub;
        un[j + n] = cur.wrapping_sub(sub) as Limb;

        // D6：估计值大了 1，加回
        if negative {
            qhat -= 1;
            let mut c: WideLimb = 0;
            for i in 0..n {
                let s = WideLimb::from(un[i + j]) + WideLimb::from(vn[i]) + c;
                un[i + j] = s as Limb;
                c = s >> LIMB_BITS;
            }
            un[j + n] = un[j + n].wrapping_add(c as Limb);
        }
        q[j] = qhat as Limb;
    }

    // D8：反规范化余数
    let mut r = vec![0 as Limb; n];
    for i in 0..n {
        r[i] = un[i] >> shift;
        if shift != 0 {
            r[i] |= un[i + 1] << (LIMB_BITS - shift);
        }
    }
    (q, r)
}

/// 左移 `shift`（< 64）位，输出长度为 `len`
fn shl_limbs(a: &[Limb], shift: usize, len: usize) -> Vec<Limb> {
    let mut out = vec![0 as Limb; len];
    let mut carry: Limb = 0;
    for (i, &limb) in a.iter().enumerate() {
        if shift == 0 {
            out[i] = limb;
        } else {
            out[i] = (limb << shift) | carry;
            carry = limb >> (LIMB_BITS - shift);
        }
    }
    if a.len() < len {
        out[a.len()] = carry;
    }
    out
}

impl Add<&BigUint> for &BigUint {
    type Output = BigUint;
    fn add(self, rhs: &BigUint) -> BigUint {
        BigUint::add(self, rhs)
    }
}

impl Mul<&BigUint> for &BigUint {
    type Output = BigUint;
    fn mul(self, rhs: &BigUint) -> BigUint {
        BigUint::mul(self, rhs)
    }
}

impl Shl<usize> for &BigUint {
    type Output = BigUint;
    fn shl(self, rhs: usize) -> BigUint {
        self.shl_bits(rhs)
    }
}

impl Shr<usize> for &BigUint {
    type Output = BigUint;
    fn shr(self, rhs: usize) -> BigUint {
        self.shr_bits(rhs)
    }
}
