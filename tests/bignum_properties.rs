//!
//! 大整数与分组密码的性质测试
//!
//! 用 `proptest` 随机抽样：与 `u128` 原生运算对照、模幂与朴素算法对照、
//! 模逆与除法的代数恒等式，以及各分组密码在 ECB/CBC 下的往返。
//!

use proptest::collection::vec;
use proptest::prelude::*;
use seal_prims::{BigUint, CipherContext, CipherKind, Mode};

fn big(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

fn from_u128(v: u128) -> BigUint {
    big(&v.to_be_bytes())
}

/// 逐位平方-乘法，只用乘法与取余
fn slow_exp_mod(base: &BigUint, exp: &BigUint, m: &BigUint) -> BigUint {
    let mut acc = BigUint::one().rem(m).unwrap();
    let base = base.rem(m).unwrap();
    for i in (0..exp.bits()).rev() {
        acc = (&acc * &acc).rem(m).unwrap();
        if exp.bit(i) {
            acc = (&acc * &base).rem(m).unwrap();
        }
    }
    acc
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_small_values_match_u128(a in any::<u64>(), b in any::<u64>(), c in 1u64..) {
        let (a, b, c) = (a as u128, b as u128, c as u128);
        let product = a * b;
        prop_assert_eq!(&from_u128(a) * &from_u128(b), from_u128(product));
        prop_assert_eq!(from_u128(a).add(&from_u128(b)), from_u128(a + b));

        let (q, r) = from_u128(product).div_rem(&from_u128(c)).unwrap();
        prop_assert_eq!(q, from_u128(product / c));
        prop_assert_eq!(r, from_u128(product % c));
    }

    #[test]
    fn prop_div_rem_identity(a in vec(any::<u8>(), 0..96), d in vec(any::<u8>(), 1..48)) {
        let a = big(&a);
        let d = big(&d);
        prop_assume!(!d.is_zero());
        let (q, r) = a.div_rem(&d).unwrap();
        prop_assert!(r < d);
        prop_assert_eq!((&q * &d).add(&r), a);
    }

    #[test]
    fn prop_sub_undoes_add(a in vec(any::<u8>(), 0..80), b in vec(any::<u8>(), 0..80)) {
        let a = big(&a);
        let b = big(&b);
        prop_assert_eq!(a.add(&b).checked_sub(&b).unwrap(), a);
    }

    #[test]
    fn prop_shift_roundtrip(a in vec(any::<u8>(), 0..40), shift in 0usize..300) {
        let a = big(&a);
        prop_assert_eq!(a.shl_bits(shift).shr_bits(shift), a);
    }

    #[test]
    fn prop_exp_mod_matches_slow_path(
        base in vec(any::<u8>(), 1..48),
        exp in vec(any::<u8>(), 1..24),
        modulus in vec(any::<u8>(), 1..48),
    ) {
        let m = big(&modulus);
        prop_assume!(!m.is_zero());
        let base = big(&base);
        let exp = big(&exp);
        prop_assert_eq!(base.exp_mod(&exp, &m).unwrap(), slow_exp_mod(&base, &exp, &m));
    }

    #[test]
    fn prop_mod_inverse(a in vec(any::<u8>(), 1..40), modulus in vec(any::<u8>(), 1..40)) {
        let a = big(&a);
        let m = big(&modulus);
        prop_assume!(m.bits() >= 2);
        match a.mod_inverse(&m) {
            Ok(inv) => {
                prop_assert!(inv < m);
                prop_assert!(a.mul_mod(&inv, &m).unwrap().is_one());
            }
            Err(_) => prop_assert!(!a.gcd(&m).is_one()),
        }
    }

    #[test]
    fn prop_bytes_are_minimal(a in vec(any::<u8>(), 0..64)) {
        let n = big(&a);
        let first = a.iter().position(|&b| b != 0).unwrap_or(a.len());
        prop_assert_eq!(n.to_bytes_be(), a[first..].to_vec());
    }
}

fn key_bits(kind: CipherKind) -> Vec<usize> {
    match kind {
        CipherKind::Aes | CipherKind::Camellia => vec![128, 192, 256],
        CipherKind::Blowfish => vec![32, 128, 448],
        CipherKind::Xtea => vec![128],
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_cipher_roundtrip(
        key in vec(any::<u8>(), 56),
        blocks in 1usize..8,
        seed in any::<u8>(),
    ) {
        for kind in CipherKind::ALL {
            for bits in key_bits(kind) {
                let mut ctx = CipherContext::new(kind);
                ctx.setkey(&key, bits).unwrap();
                let bs = ctx.block_size();
                let plain: Vec<u8> = (0..bs * blocks)
                    .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
                    .collect();

                let ct = ctx.crypt_ecb(Mode::Encrypt, &plain).unwrap();
                prop_assert_eq!(ctx.crypt_ecb(Mode::Decrypt, &ct).unwrap(), plain.clone());

                let iv = vec![seed; bs];
                let mut enc_iv = iv.clone();
                let ct = ctx.crypt_cbc(Mode::Encrypt, &mut enc_iv, &plain).unwrap();
                let mut dec_iv = iv;
                prop_assert_eq!(ctx.crypt_cbc(Mode::Decrypt, &mut dec_iv, &ct).unwrap(), plain);
                prop_assert_eq!(enc_iv, dec_iv);
            }
        }
    }
}
