// Signing & recovery benchmarks for ethless authorizations.
//
// Covers secp256k1 keypair generation, raw digest signing and recovery,
// canonical message hashing, and recovery across batches of distinct signers
// (the per-block load a busy relayer produces).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ethless_protocol::config::CHAIN_ID_LOCAL;
use ethless_protocol::crypto::{keccak, EthlessKeypair};
use ethless_protocol::message::EthlessMessage;
use ethless_protocol::permit::{Eip712Domain, Permit};
use ethless_protocol::{Address, U256};

fn contract() -> Address {
    Address::repeat_byte(0xC0)
}

fn transfer_for(sender: Address, nonce: u64) -> EthlessMessage {
    EthlessMessage::Transfer {
        sender,
        recipient: Address::repeat_byte(0x22),
        amount: U256::from(500u64),
        fee: U256::from(1u64),
        nonce: U256::from(nonce),
    }
}

fn bench_keypair_generation(c: &mut Criterion) {
    c.bench_function("secp256k1/keypair_generate", |b| {
        b.iter(EthlessKeypair::generate);
    });
}

fn bench_sign_prehash(c: &mut Criterion) {
    let keypair = EthlessKeypair::generate();
    let digest = keccak(b"transfer 500 from alice to bob; nonce=42");

    c.bench_function("secp256k1/sign_prehash", |b| {
        b.iter(|| keypair.sign_prehash(&digest).unwrap());
    });
}

fn bench_recover(c: &mut Criterion) {
    let keypair = EthlessKeypair::generate();
    let digest = keccak(b"transfer 500 from alice to bob; nonce=42");
    let signature = keypair.sign_prehash(&digest).unwrap();

    c.bench_function("secp256k1/recover", |b| {
        b.iter(|| signature.recover(&digest).unwrap());
    });
}

fn bench_message_signing_hash(c: &mut Criterion) {
    let message = EthlessMessage::Reserve {
        sender: Address::repeat_byte(0x11),
        recipient: Address::repeat_byte(0x22),
        executor: Address::repeat_byte(0x33),
        amount: U256::from(500u64),
        fee: U256::from(10u64),
        nonce: U256::from(42u64),
        expiry_block: 1_000,
    };

    c.bench_function("message/reserve_signing_hash", |b| {
        b.iter(|| message.signing_hash(CHAIN_ID_LOCAL, contract()));
    });
}

fn bench_permit_signing_hash(c: &mut Criterion) {
    let domain = Eip712Domain::for_token("mini", CHAIN_ID_LOCAL, contract());
    let permit = Permit {
        owner: Address::repeat_byte(0x11),
        spender: Address::repeat_byte(0x22),
        value: U256::from(500u64),
        nonce: U256::ZERO,
        deadline: U256::from(1_900_000_000u64),
    };

    c.bench_function("permit/signing_hash", |b| {
        b.iter(|| permit.signing_hash(&domain));
    });
}

fn bench_batch_recover(c: &mut Criterion) {
    let mut group = c.benchmark_group("message/batch_recover");

    for size in [10, 50, 100] {
        let items: Vec<_> = (0..size)
            .map(|i| {
                let kp = EthlessKeypair::generate();
                let msg = transfer_for(kp.address(), i as u64);
                let sig = msg.sign(CHAIN_ID_LOCAL, contract(), &kp).unwrap();
                (msg, sig)
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| {
                for (msg, sig) in items {
                    let signer = msg.recover(CHAIN_ID_LOCAL, contract(), sig).unwrap();
                    assert_eq!(signer, msg.signer());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_keypair_generation,
    bench_sign_prehash,
    bench_recover,
    bench_message_signing_hash,
    bench_permit_signing_hash,
    bench_batch_recover,
);
criterion_main!(benches);
