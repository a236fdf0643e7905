//! Benchmarks for the proposal lifecycle hot path: granting approvals and
//! executing with the invalidation filter applied.

use consign::approval::{ProposalEngine, ProposalName};
use consign::docgraph::memory::InMemoryDocumentGraph;
use consign::host::mock::MockHost;
use consign::transaction::{Action, Transaction, TransactionHeader};
use consign::types::{AccountName, PermissionLevel, Timestamp};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde_json::json;

const HOUR: u64 = 3_600_000_000;

fn approver(index: usize) -> PermissionLevel {
    PermissionLevel::new(format!("approver{}", index), "active")
}

fn packed_transaction() -> Vec<u8> {
    Transaction {
        header: TransactionHeader {
            expiration: Timestamp::from_micros(HOUR),
        },
        context_free_actions: vec![],
        actions: vec![Action {
            account: AccountName::new("treasury"),
            name: "transfer".to_string(),
            authorization: vec![PermissionLevel::new("treasury", "active")],
            data: vec![0u8; 64],
        }],
    }
    .pack()
    .expect("packing a well-formed transaction")
}

/// Engine with a staged proposal awaiting `approvers` approvals.
fn staged_engine(
    approvers: usize,
) -> (MockHost, ProposalEngine<MockHost, InMemoryDocumentGraph>) {
    let host = MockHost::new();
    host.set_now(Timestamp::from_micros(1));
    host.grant_account_control(&AccountName::new("prop"));
    for index in 0..approvers {
        host.grant_account_control(&approver(index).actor);
    }
    host.require_approvals((0..approvers).map(approver));

    let mut engine = ProposalEngine::new(host.clone(), InMemoryDocumentGraph::new());
    engine
        .propose(
            AccountName::new("prop"),
            ProposalName::from("bench"),
            (0..approvers).map(approver).collect(),
            json!({"title": "bench"}),
            packed_transaction(),
        )
        .expect("propose");

    (host, engine)
}

fn bench_approve(c: &mut Criterion) {
    c.bench_function("approve_16_random_order", |b| {
        b.iter_batched(
            || {
                let (_, engine) = staged_engine(16);
                let mut order: Vec<usize> = (0..16).collect();
                order.shuffle(&mut thread_rng());
                (engine, order)
            },
            |(mut engine, order)| {
                for index in order {
                    engine
                        .approve(
                            AccountName::new("prop"),
                            ProposalName::from("bench"),
                            approver(index),
                            None,
                        )
                        .expect("approve");
                }
                engine
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_execute(c: &mut Criterion) {
    c.bench_function("execute_16_of_16_with_invalidation_filter", |b| {
        b.iter_batched(
            || {
                let (host, mut engine) = staged_engine(16);
                for index in 0..16 {
                    host.advance(1);
                    engine
                        .approve(
                            AccountName::new("prop"),
                            ProposalName::from("bench"),
                            approver(index),
                            None,
                        )
                        .expect("approve");
                }
                // Give every approver a watermark, then re-grant below so
                // the final stamps postdate it and the filter does real
                // comparisons.
                for index in 0..16 {
                    engine
                        .invalidate(approver(index).actor)
                        .expect("invalidate");
                    host.advance(1);
                }
                for index in 0..16 {
                    host.advance(1);
                    engine
                        .unapprove(
                            AccountName::new("prop"),
                            ProposalName::from("bench"),
                            approver(index),
                        )
                        .expect("unapprove");
                    engine
                        .approve(
                            AccountName::new("prop"),
                            ProposalName::from("bench"),
                            approver(index),
                            None,
                        )
                        .expect("re-approve");
                }
                engine
            },
            |mut engine| {
                engine
                    .execute(
                        AccountName::new("prop"),
                        ProposalName::from("bench"),
                        AccountName::new("prop"),
                    )
                    .expect("execute");
                engine
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_approve, bench_execute);
criterion_main!(benches);
