// Handshake benchmarks for the JKA protocol.
//
// Covers key generation, the raw combined multiplication of variant D
// against its naive two-multiplication form, and complete hand-driven
// handshakes for every variant.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use jka_protocol::crypto::Keypair;
use jka_protocol::group::{Curve25519, Group, Ristretto255};
use jka_protocol::handshake::{
    jka, joint_tweak, static_only, triple_dh, HandshakeRole, Step, Variant,
};

fn bench_keygen(c: &mut Criterion) {
    c.bench_function("keygen/curve25519", |b| {
        b.iter(|| Keypair::<Curve25519>::generate().unwrap());
    });
    c.bench_function("keygen/ristretto255", |b| {
        b.iter(|| Keypair::<Ristretto255>::generate().unwrap());
    });
}

fn bench_combined_multiplication(c: &mut Criterion) {
    let k: Vec<Keypair<Curve25519>> = (0..4).map(|_| Keypair::generate().unwrap()).collect();
    let scalars = [*k[0].secret().scalar(), *k[1].secret().scalar()];
    let points = [*k[2].public_key().point(), *k[3].public_key().point()];

    let mut group = c.benchmark_group("combine");
    group.bench_function("multiscalar", |b| {
        b.iter(|| Curve25519::multiscalar(&scalars, &points));
    });
    group.bench_function("separate", |b| {
        b.iter(|| {
            Curve25519::add(
                &Curve25519::multiply(&scalars[0], &points[0]),
                &Curve25519::multiply(&scalars[1], &points[1]),
            )
        });
    });
    group.finish();
}

fn drive<I: HandshakeRole, R: HandshakeRole>(mut initiator: I, mut responder: R) {
    initiator.generate_keys().unwrap();
    responder.generate_keys().unwrap();
    loop {
        match (initiator.next_step(), responder.next_step()) {
            (Step::Write, Step::Read) => {
                let m = initiator.write_message().unwrap();
                responder.read_message(&m).unwrap();
            }
            (Step::Read, Step::Write) => {
                let m = responder.write_message().unwrap();
                initiator.read_message(&m).unwrap();
            }
            _ => break,
        }
    }
    initiator.finish().unwrap();
    responder.finish().unwrap();
}

fn bench_full_handshake(c: &mut Criterion) {
    let s1 = Arc::new(Keypair::<Curve25519>::generate().unwrap());
    let s2 = Arc::new(Keypair::<Curve25519>::generate().unwrap());

    let mut group = c.benchmark_group("handshake/curve25519");
    for variant in Variant::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(variant), &variant, |b, v| {
            b.iter(|| match v {
                Variant::StaticOnly => drive(
                    static_only::StaticOnly::initiator(s1.clone(), s2.public_key()),
                    static_only::StaticOnly::responder(s2.clone(), s1.public_key()),
                ),
                Variant::TripleDh => drive(
                    triple_dh::Initiator::new(s1.clone()),
                    triple_dh::Responder::new(s2.clone()),
                ),
                Variant::JointTweak => drive(
                    joint_tweak::Initiator::new(s1.clone(), s2.public_key()),
                    joint_tweak::Responder::new(s2.clone(), s1.public_key()),
                ),
                Variant::Jka => drive(
                    jka::Initiator::new(s1.clone(), s2.public_key()),
                    jka::Responder::new(s2.clone(), s1.public_key()),
                ),
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_keygen,
    bench_combined_multiplication,
    bench_full_handshake
);
criterion_main!(benches);
