//! 素性测试与素数生成

use super::{BigUint, MontgomeryContext};
use crate::common::config::MIN_PRIME_TEST_ROUNDS;
use crate::common::errors::{Error, Result};
use crate::common::random::RandomSource;

const SMALL_PRIME_COUNT: usize = 168;

/// 1000 以内的全部素数，用于试除
const SMALL_PRIMES: [u64; SMALL_PRIME_COUNT] = small_primes();

const fn small_primes() -> [u64; SMALL_PRIME_COUNT] {
    let mut out = [0u64; SMALL_PRIME_COUNT];
    let mut count = 0;
    let mut n = 2;
    while count < SMALL_PRIME_COUNT {
        let mut prime = true;
        let mut d = 2;
        while d * d <= n {
            if n % d == 0 {
                prime = false;
                break;
            }
            d += 1;
        }
        if prime {
            out[count] = n;
            count += 1;
        }
        n += 1;
    }
    out
}

/// 试除结果
enum Sieve {
    Prime,
    Composite,
    Unknown,
}

fn trial_division(n: &BigUint) -> Result<Sieve> {
    if let Some(v) = n.to_u64() {
        if v < 2 {
            return Ok(Sieve::Composite);
        }
        if v <= SMALL_PRIMES[SMALL_PRIME_COUNT - 1] {
            return Ok(if SMALL_PRIMES.contains(&v) {
                Sieve::Prime
            } else {
                Sieve::Composite
            });
        }
    }
    for &p in SMALL_PRIMES.iter() {
        if n.rem_u64(p)? == 0 {
            return Ok(Sieve::Composite);
        }
    }
    Ok(Sieve::Unknown)
}

/// Miller-Rabin 概率素性测试。
///
/// `rounds` 低于 20 时按 20 轮执行，误判概率因此不超过 2^-40。
pub fn is_probable_prime<R: RandomSource + ?Sized>(
    n: &BigUint,
    rounds: usize,
    rng: &mut R,
) -> Result<bool> {
    match trial_division(n)? {
        Sieve::Prime => return Ok(true),
        Sieve::Composite => return Ok(false),
        Sieve::Unknown => {}
    }

    let rounds = rounds.max(MIN_PRIME_TEST_ROUNDS);
    let n_minus_1 = n.checked_sub_u64(1)?;
    let s = n_minus_1.trailing_zeros();
    let d = n_minus_1.shr_bits(s);
    let ctx = MontgomeryContext::new(n)?;
    // 见证数取自 [2, n-2]
    let span = n.checked_sub_u64(3)?;
    let mut buf = vec![0u8; n.byte_len()];

    'witness: for _ in 0..rounds {
        rng.fill(&mut buf)?;
        let a = BigUint::from_bytes_be(&buf).rem(&span)?.add_u64(2);

        let mut x = ctx.exp_mod(&a, &d)?;
        if x.is_one() || x == n_minus_1 {
            continue;
        }
        for _ in 1..s {
            x = ctx.mul_mod(&x, &x)?;
            if x == n_minus_1 {
                continue 'witness;
            }
            if x.is_one() {
                return Ok(false);
            }
        }
        return Ok(false);
    }
    Ok(true)
}

/// 生成一个恰好 `bits` 位的随机素数。
///
/// 最高两位总是置 1，两个这样的素数相乘正好是 `2 * bits` 位。从随机起点开始
/// 按 2 递增地搜索，最多检查 `max_candidates` 个候选数，超出后返回
/// [`Error::KeyGenerationFailed`]。
pub fn gen_prime<R: RandomSource + ?Sized>(
    bits: usize,
    rounds: usize,
    max_candidates: usize,
    rng: &mut R,
) -> Result<BigUint> {
    if bits < 3 {
        return Err(Error::BadMpiInput("prime size must be at least 3 bits"));
    }

    let mut candidate = random_candidate(bits, rng)?;
    for attempt in 0..max_candidates {
        if is_probable_prime(&candidate, rounds, rng)? {
            log::debug!("found {}-bit prime after {} candidates", bits, attempt + 1);
            return Ok(candidate);
        }
        candidate = candidate.add_u64(2);
        if candidate.bits() > bits {
            candidate = random_candidate(bits, rng)?;
        }
    }

    log::debug!(
        "no {}-bit prime within {} candidates",
        bits,
        max_candidates
    );
    Err(Error::KeyGenerationFailed {
        attempts: max_candidates,
    })
}

fn random_candidate<R: RandomSource + ?Sized>(bits: usize, rng: &mut R) -> Result<BigUint> {
    let mut buf = vec![0u8; bits.div_ceil(8)];
    rng.fill(&mut buf)?;
    let mut n = BigUint::from_bytes_be(&buf).shr_bits(buf.len() * 8 - bits);
    n.set_bit(bits - 1, true);
    n.set_bit(bits - 2, true);
    n.set_bit(0, true);
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    fn hex(s: &str) -> BigUint {
        BigUint::from_hex(s).unwrap()
    }

    #[test]
    fn test_small_prime_table() {
        assert_eq!(SMALL_PRIMES[0], 2);
        assert_eq!(SMALL_PRIMES[24], 97);
        assert_eq!(SMALL_PRIMES[SMALL_PRIME_COUNT - 1], 997);
    }

    #[test]
    fn test_small_values() {
        let mut rng = OsRng;
        for (v, expected) in [(0, false), (1, false), (2, true), (9, false), (997, true), (1009, true)] {
            assert_eq!(
                is_probable_prime(&BigUint::from_u64(v), 20, &mut rng).unwrap(),
                expected,
                "value {}",
                v
            );
        }
    }

    #[test]
    fn test_mersenne_primes() {
        let mut rng = OsRng;
        assert!(is_probable_prime(&hex("1FFFFFFFFFFFFFFF"), 20, &mut rng).unwrap());
        assert!(is_probable_prime(&hex("7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF"), 20, &mut rng).unwrap());
    }

    #[test]
    fn test_composites_rejected() {
        let mut rng = OsRng;
        // Carmichael 数
        assert!(!is_probable_prime(&BigUint::from_u64(561), 20, &mut rng).unwrap());
        assert!(!is_probable_prime(&BigUint::from_u64(41041), 20, &mut rng).unwrap());
        // 两个梅森素数之积
        let p = hex("1FFFFFFFFFFFFFFF");
        let q = hex("7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF");
        assert!(!is_probable_prime(&(&p * &q), 20, &mut rng).unwrap());
    }

    #[test]
    fn test_gen_prime_has_exact_size() {
        let mut rng = OsRng;
        let p = gen_prime(96, 20, 10_000, &mut rng).unwrap();
        assert_eq!(p.bits(), 96);
        assert!(p.bit(94));
        assert!(p.is_odd());
    }

    #[test]
    fn test_gen_prime_gives_up() {
        let mut rng = OsRng;
        let r = gen_prime(512, 20, 0, &mut rng);
        assert!(matches!(r, Err(Error::KeyGenerationFailed { attempts: 0 })));
        assert!(gen_prime(2, 20, 10, &mut rng).is_err());
    }
}
