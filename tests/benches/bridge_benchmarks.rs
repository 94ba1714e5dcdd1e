//! # Hyperion Bridge Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Checkpoints | valset and batch digest, signature recovery |
//! | Batching | fee ordered selection over the unbatched pool |
//! | Tally | claim submission up to observation |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hyperion_bridge::algorithms::{
    batch_checkpoint, recover_checkpoint_signer, select_by_fee, sign_checkpoint, valset_checkpoint,
    FeeKey,
};
use hyperion_bridge::{
    BlockContext, BridgeValidator, DepositClaim, EthAddress, HyperionApi, OutgoingTx,
    OutgoingTxBatch, Valset,
};
use hyperion_tests::harness::{contract, eth_key, eth_of, user, Harness, HID};
use primitive_types::U256;
use std::collections::BTreeSet;

fn valset(members: u8) -> Valset {
    let members = (1..=members)
        .map(|n| BridgeValidator {
            eth_address: eth_of(n),
            power: u32::MAX as u64 / members as u64,
        })
        .collect();
    Valset::new(HID, 1, 1, members, U256::zero(), EthAddress::ZERO)
}

fn batch(txs: u64) -> OutgoingTxBatch {
    OutgoingTxBatch {
        hyperion_id: HID,
        batch_nonce: 1,
        batch_timeout: 1_000,
        token_contract: contract(0xd0),
        transactions: (0..txs)
            .map(|id| OutgoingTx {
                id,
                hyperion_id: HID,
                sender: user(1),
                dest_address: contract(0xde),
                token_contract: contract(0xd0),
                amount: U256::from(1_000 + id),
                fee: U256::from(id),
                tx_timeout: 1_000,
            })
            .collect(),
        block: 1,
        executed: false,
    }
}

fn bench_checkpoints(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkpoints");

    for size in [10u8, 100] {
        let vs = valset(size);
        group.bench_with_input(BenchmarkId::new("valset", size), &vs, |b, vs| {
            b.iter(|| black_box(valset_checkpoint(vs, HID)))
        });
    }
    for size in [10u64, 100] {
        let candidate = batch(size);
        group.bench_with_input(BenchmarkId::new("batch", size), &candidate, |b, batch| {
            b.iter(|| black_box(batch_checkpoint(batch, HID)))
        });
    }

    let checkpoint = valset_checkpoint(&valset(10), HID);
    let signature = sign_checkpoint(&eth_key(1), &checkpoint).unwrap();
    group.bench_function("recover_signer", |b| {
        b.iter(|| black_box(recover_checkpoint_signer(&checkpoint, &signature).unwrap()))
    });

    group.finish();
}

fn bench_batch_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch-selection");

    for size in [1_000u64, 10_000] {
        let pool: BTreeSet<FeeKey> = (0..size)
            .map(|id| FeeKey::new(U256::from(id % 97), id))
            .collect();
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &pool, |b, pool| {
            b.iter(|| black_box(select_by_fee(pool.iter(), 100)))
        });
    }

    group.finish();
}

fn bench_tally(c: &mut Criterion) {
    c.bench_function("tally/observe-deposit-4-validators", |b| {
        b.iter_with_setup(
            || {
                let h = Harness::new();
                for n in 1..=4 {
                    h.add_validator(n, 25);
                }
                h
            },
            |h| {
                for n in 1..=3 {
                    h.service
                        .deposit_claim(
                            BlockContext::new(2),
                            h.header(n, 1),
                            DepositClaim {
                                token_contract: contract(0xd0),
                                amount: U256::from(1),
                                ethereum_sender: "0x00000000000000000000000000000000000000e1".into(),
                                cosmos_receiver: user(9).to_string(),
                                token_metadata: None,
                            },
                        )
                        .unwrap();
                }
            },
        )
    });
}

criterion_group!(benches, bench_checkpoints, bench_batch_selection, bench_tally);
criterion_main!(benches);
