//! 模运算：gcd、模逆与模幂

use super::{BigUint, MontgomeryContext};
use crate::common::errors::{Error, Result};

impl BigUint {
    /// `(self * other) mod modulus`
    pub fn mul_mod(&self, other: &BigUint, modulus: &BigUint) -> Result<BigUint> {
        (self * other).rem(modulus)
    }

    /// `self^exp mod modulus`。
    ///
    /// 奇数模数走 Montgomery 定长窗口路径；偶数模数只会出现在公开数据上，
    /// 使用从高位到低位的二进制平方-乘法。
    pub fn exp_mod(&self, exp: &BigUint, modulus: &BigUint) -> Result<BigUint> {
        if modulus.is_zero() {
            return Err(Error::DivisionByZero);
        }
        if modulus.is_odd() {
            return MontgomeryContext::new(modulus)?.exp_mod(self, exp);
        }
        self.exp_mod_binary(exp, modulus)
    }

    fn exp_mod_binary(&self, exp: &BigUint, modulus: &BigUint) -> Result<BigUint> {
        let base = self.rem(modulus)?;
        let mut acc = BigUint::one().rem(modulus)?;
        for i in (0..exp.bits()).rev() {
            acc = acc.mul_mod(&acc, modulus)?;
            if exp.bit(i) {
                acc = acc.mul_mod(&base, modulus)?;
            }
        }
        Ok(acc)
    }

    /// 最大公约数，`gcd(0, 0) = 0`
    pub fn gcd(&self, other: &BigUint) -> BigUint {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            // b 非零，取余不会失败
            let r = match a.rem(&b) {
                Ok(r) => r,
                Err(_) => break,
            };
            a = b;
            b = r;
        }
        a
    }

    /// 最小公倍数
    pub fn lcm(&self, other: &BigUint) -> Result<BigUint> {
        if self.is_zero() || other.is_zero() {
            return Ok(BigUint::zero());
        }
        let g = self.gcd(other);
        let (q, _) = self.div_rem(&g)?;
        Ok(&q * other)
    }

    /// 模逆：返回 `x` 使得 `self * x ≡ 1 (mod modulus)`。
    ///
    /// 扩展欧几里得算法；系数始终以 `modulus` 的剩余类保存，因此全程无需负数。
    /// `gcd(self, modulus) != 1` 时返回 [`Error::NotInvertible`]。
    pub fn mod_inverse(&self, modulus: &BigUint) -> Result<BigUint> {
        if modulus.is_zero() {
            return Err(Error::DivisionByZero);
        }
        if modulus.is_one() {
            return Err(Error::NotInvertible);
        }

        let mut r0 = modulus.clone();
        let mut r1 = self.rem(modulus)?;
        let mut t0 = BigUint::zero();
        let mut t1 = BigUint::one();

        while !r1.is_zero() {
            let (q, r2) = r0.div_rem(&r1)?;
            // t2 = t0 - q * t1 (mod modulus)
            let qt = q.mul_mod(&t1, modulus)?;
            let t2 = t0.add(modulus).checked_sub(&qt)?.rem(modulus)?;
            r0 = r1;
            r1 = r2;
            t0 = t1;
            t1 = t2;
        }

        if !r0.is_one() {
            return Err(Error::NotInvertible);
        }
        Ok(t0)
    }
}
