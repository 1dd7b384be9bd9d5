use criterion::{Criterion, criterion_group, criterion_main};
use rand_core::OsRng;
use seal_prims::hash::digest;
use seal_prims::{BigUint, CipherContext, CipherKind, MdType, Mode, Padding, RsaContext, RsaMode};
use std::hint::black_box;

fn bench_block_ciphers(c: &mut Criterion) {
    let data = vec![0u8; 64 * 1024];
    for kind in CipherKind::ALL {
        let bits = if kind == CipherKind::Blowfish { 448 } else { 128 };
        let mut ctx = CipherContext::new(kind);
        ctx.setkey(&[0x42u8; 56], bits).unwrap();
        let iv = vec![0u8; ctx.block_size()];

        c.bench_function(&format!("{} CBC encrypt 64KB", kind), |b| {
            b.iter(|| {
                let mut iv = iv.clone();
                ctx.crypt_cbc(Mode::Encrypt, &mut iv, black_box(&data)).unwrap()
            });
        });
        c.bench_function(&format!("{} CBC decrypt 64KB", kind), |b| {
            b.iter(|| {
                let mut iv = iv.clone();
                ctx.crypt_cbc(Mode::Decrypt, &mut iv, black_box(&data)).unwrap()
            });
        });
    }
}

fn bench_rsa(c: &mut Criterion) {
    let mut ctx = RsaContext::new(Padding::Pkcs1V15, MdType::None);
    ctx.gen_key(&mut OsRng, 2048, 65537).unwrap();
    let data = vec![0u8; 245];
    c.bench_function("RSA-2048 PKCS#1 encrypt 245B", |b| {
        b.iter(|| {
            ctx.pkcs1_encrypt(&mut OsRng, RsaMode::Public, black_box(&data))
                .unwrap()
        });
    });

    let ciphertext = ctx.pkcs1_encrypt(&mut OsRng, RsaMode::Public, &data).unwrap();
    c.bench_function("RSA-2048 PKCS#1 decrypt 245B", |b| {
        b.iter(|| {
            ctx.pkcs1_decrypt(&mut OsRng, RsaMode::Private, black_box(&ciphertext))
                .unwrap()
        });
    });

    let hash = digest(MdType::Sha256, b"benchmark").unwrap();
    c.bench_function("RSA-2048 PKCS#1 sign SHA-256", |b| {
        b.iter(|| {
            ctx.pkcs1_sign(&mut OsRng, RsaMode::Private, MdType::Sha256, black_box(&hash))
                .unwrap()
        });
    });
}

fn bench_exp_mod(c: &mut Criterion) {
    let modulus = BigUint::from_bytes_be(&[0xC5u8; 128]);
    let base = BigUint::from_bytes_be(&[0x3Au8; 127]);
    let exp = BigUint::from_bytes_be(&[0x9Du8; 128]);
    c.bench_function("BigUint exp_mod 1024-bit", |b| {
        b.iter(|| black_box(&base).exp_mod(black_box(&exp), &modulus).unwrap());
    });
}

fn bench_digests(c: &mut Criterion) {
    let data = vec![0u8; 64 * 1024];
    for md in [MdType::Md5, MdType::Sha1, MdType::Sha256, MdType::Sha512] {
        c.bench_function(&format!("{} 64KB", md), |b| {
            b.iter(|| digest(md, black_box(&data)).unwrap());
        });
    }
}

criterion_group!(
    benches,
    bench_block_ciphers,
    bench_rsa,
    bench_exp_mod,
    bench_digests
);
criterion_main!(benches);
