//! Generated operation sequences checked against a simple model of the pool.

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU32, Ordering};

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};
use quickcheck_macros::quickcheck;
use resource_pool::{AcquireError, Resource, ResourcePool, ReusePolicy};

/// Capacities above this are rarely exhausted by short sequences.
const MAX_CAPACITY: usize = 6;

#[derive(Debug)]
struct Item {
    id: u32,
    dirty: bool,
}

impl Resource for Item {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn reset(&mut self) {
        self.dirty = false;
    }
}

#[derive(Clone, Debug)]
enum PoolOp {
    Acquire,
    // Index into the held items, wrapped around their count.
    ReleaseHeld(usize),
    ReleaseForged,
}

impl Arbitrary for PoolOp {
    fn arbitrary(g: &mut Gen) -> Self {
        match usize::arbitrary(g) % 10 {
            0..5 => PoolOp::Acquire,
            5..9 => PoolOp::ReleaseHeld(usize::arbitrary(g)),
            9..10 => PoolOp::ReleaseForged,
            _ => unreachable!(),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            PoolOp::ReleaseHeld(index) => Box::new(index.shrink().map(PoolOp::ReleaseHeld)),
            _ => Box::new(std::iter::empty()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Capacity(usize);

impl Arbitrary for Capacity {
    fn arbitrary(g: &mut Gen) -> Self {
        Capacity(usize::arbitrary(g) % MAX_CAPACITY)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Capacity))
    }
}

#[derive(Clone, Copy, Debug)]
struct Policy(ReusePolicy);

impl Arbitrary for Policy {
    fn arbitrary(g: &mut Gen) -> Self {
        if bool::arbitrary(g) {
            Policy(ReusePolicy::MostRecentlyReleased)
        } else {
            Policy(ReusePolicy::LeastRecentlyReleased)
        }
    }
}

/// What the pool should look like, tracked independently of the implementation.
#[derive(Debug)]
struct Model {
    available: Vec<u32>,
    in_use: HashSet<u32>,
    next_id: u32,
}

impl Model {
    fn new() -> Self {
        Self {
            available: Vec::new(),
            in_use: HashSet::new(),
            next_id: 1,
        }
    }

    fn expected_acquire(&self, max_size: usize, policy: ReusePolicy) -> Option<u32> {
        if self.available.is_empty() {
            return (self.in_use.len() < max_size).then_some(self.next_id);
        }

        match policy {
            ReusePolicy::LeastRecentlyReleased => self.available.first().copied(),
            _ => self.available.last().copied(),
        }
    }
}

fn item_pool(max_size: usize, policy: ReusePolicy) -> ResourcePool<Item> {
    let next_id = AtomicU32::new(1);

    ResourcePool::builder()
        .max_size(max_size)
        .reuse_policy(policy)
        .factory(move || {
            Ok::<_, Infallible>(Item {
                id: next_id.fetch_add(1, Ordering::Relaxed),
                dirty: false,
            })
        })
        .build()
}

fn apply(
    pool: &ResourcePool<Item>,
    model: &mut Model,
    held: &mut Vec<Item>,
    op: &PoolOp,
    policy: ReusePolicy,
) -> Result<(), String> {
    match op {
        PoolOp::Acquire => match (
            pool.acquire(),
            model.expected_acquire(pool.max_size(), policy),
        ) {
            (Ok(mut item), Some(expected_id)) => {
                if item.id != expected_id {
                    return Err(format!("acquired {}, expected {expected_id}", item.id));
                }

                if item.dirty {
                    return Err(format!("item {} was reused without reset", item.id));
                }

                if held.iter().any(|h| h.id == item.id) {
                    return Err(format!("item {} handed out twice", item.id));
                }

                if let Some(pos) = model.available.iter().position(|&id| id == item.id) {
                    model.available.remove(pos);
                } else {
                    model.next_id += 1;
                }

                model.in_use.insert(item.id);
                item.dirty = true;
                held.push(item);
            }
            (Err(AcquireError::PoolExhausted { .. }), None) => {}
            (result, expected) => {
                return Err(format!("got {result:?}, expected {expected:?}"));
            }
        },
        PoolOp::ReleaseHeld(index) => {
            if held.is_empty() {
                return Ok(());
            }

            let item = held.swap_remove(index % held.len());
            let id = item.id;

            pool.release(item).map_err(|rejected| {
                format!("release of held item {} rejected", rejected.id())
            })?;

            model.in_use.remove(&id);
            model.available.push(id);
        }
        PoolOp::ReleaseForged => {
            let id = model.available.last().copied().unwrap_or(u32::MAX);
            let before = pool.status();

            let Err(rejected) = pool.release(Item { id, dirty: true }) else {
                return Err(format!("release of item {id} that is not checked out succeeded"));
            };

            if *rejected.id() != id || !rejected.into_resource().dirty {
                return Err(format!("rejected item {id} did not come back untouched"));
            }

            if pool.status() != before {
                return Err(format!("rejected release of item {id} changed the pool"));
            }
        }
    }

    let status = pool.status();

    if status.available + status.in_use > pool.max_size() {
        return Err(format!("capacity exceeded: {status:?}"));
    }

    if status.available != model.available.len()
        || status.in_use != model.in_use.len()
        || status.constructing != 0
    {
        return Err(format!("pool {status:?} diverged from model {model:?}"));
    }

    Ok(())
}

fn run(capacity: Capacity, policy: Policy, ops: &[PoolOp]) -> TestResult {
    let pool = item_pool(capacity.0, policy.0);
    let mut model = Model::new();
    let mut held = Vec::new();

    for op in ops {
        if let Err(message) = apply(&pool, &mut model, &mut held, op, policy.0) {
            return TestResult::error(format!("after {op:?}: {message}"));
        }
    }

    TestResult::passed()
}

#[cfg_attr(miri, ignore)]
#[quickcheck]
fn operation_sequences_match_model(
    capacity: Capacity,
    policy: Policy,
    ops: Vec<PoolOp>,
) -> TestResult {
    run(capacity, policy, &ops)
}

#[cfg_attr(miri, ignore)]
#[test]
fn long_operation_sequences_match_model() {
    fn long_sequence(capacity: Capacity, policy: Policy, ops: Vec<PoolOp>) -> TestResult {
        run(capacity, policy, &ops)
    }

    QuickCheck::new()
        .tests(50)
        .r#gen(Gen::new(1000))
        .quickcheck(long_sequence as fn(Capacity, Policy, Vec<PoolOp>) -> TestResult);
}

#[test]
fn exhausting_sequence_matches_model() {
    let ops = [
        PoolOp::Acquire,
        PoolOp::Acquire,
        PoolOp::Acquire,
        PoolOp::ReleaseForged,
        PoolOp::ReleaseHeld(0),
        PoolOp::Acquire,
        PoolOp::ReleaseHeld(1),
        PoolOp::ReleaseForged,
    ];

    for policy in [ReusePolicy::MostRecentlyReleased, ReusePolicy::LeastRecentlyReleased] {
        assert!(!run(Capacity(2), Policy(policy), &ops).is_failure());
    }
}
