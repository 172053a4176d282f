//! In-process process groups.
//!
//! Each rank runs on its own OS thread and owns one [`ThreadedComm`].
//! Ranks are connected by a full mesh of unbounded crossbeam channels,
//! one per ordered pair, so the k-th message from rank `a` to rank `b`
//! always belongs to the k-th collective both entered. Reductions are
//! folded in rank order on every rank, which makes results bit-identical
//! across the group.
//!
//! A rank that returns or panics drops its channel ends; a peer blocked
//! in a collective then observes the disconnect and panics instead of
//! hanging. `abort` likewise panics: tearing down the host process would
//! also tear down every other in-process group.

use std::ops::Add;

use crossbeam_channel::{unbounded, Receiver, Sender};
use quark_core::{Communicator, ReduceOp};

enum Payload {
    I32(Vec<i32>),
    I64(Vec<i64>),
    F64(Vec<f64>),
}

/// One rank's endpoint in a [`ThreadedGroup`].
pub struct ThreadedComm {
    rank: usize,
    size: usize,
    /// `outbox[r]` delivers to rank `r`; `None` at `r == rank`.
    outbox: Vec<Option<Sender<Payload>>>,
    /// `inbox[r]` receives from rank `r`; `None` at `r == rank`.
    inbox: Vec<Option<Receiver<Payload>>>,
}

impl ThreadedComm {
    fn all_reduce<T>(
        &self,
        send: &[T],
        recv: &mut [T],
        op: ReduceOp,
        wrap: fn(Vec<T>) -> Payload,
        unwrap: fn(Payload) -> Option<Vec<T>>,
    ) where
        T: Copy + PartialOrd + Add<Output = T>,
    {
        assert_eq!(
            send.len(),
            recv.len(),
            "all-reduce buffers differ in length"
        );

        for (peer, tx) in self.outbox.iter().enumerate() {
            if let Some(tx) = tx {
                if tx.send(wrap(send.to_vec())).is_err() {
                    self.peer_lost(peer);
                }
            }
        }

        let mut acc: Option<Vec<T>> = None;
        for peer in 0..self.size {
            let contribution = match &self.inbox[peer] {
                None => send.to_vec(),
                Some(rx) => match rx.recv() {
                    Ok(payload) => match unwrap(payload) {
                        Some(values) => values,
                        None => panic!(
                            "rank {}: element type from rank {peer} does not match this collective",
                            self.rank
                        ),
                    },
                    Err(_) => self.peer_lost(peer),
                },
            };
            match acc.as_mut() {
                None => acc = Some(contribution),
                Some(a) => op.combine(a, &contribution),
            }
        }

        if let Some(result) = acc {
            recv.copy_from_slice(&result);
        }
    }

    fn peer_lost(&self, peer: usize) -> ! {
        panic!(
            "rank {}: peer rank {peer} left the group during a collective",
            self.rank
        )
    }
}

impl Communicator for ThreadedComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce_i32(&self, send: &[i32], recv: &mut [i32], op: ReduceOp) {
        self.all_reduce(send, recv, op, Payload::I32, |p| match p {
            Payload::I32(v) => Some(v),
            _ => None,
        });
    }

    fn all_reduce_i64(&self, send: &[i64], recv: &mut [i64], op: ReduceOp) {
        self.all_reduce(send, recv, op, Payload::I64, |p| match p {
            Payload::I64(v) => Some(v),
            _ => None,
        });
    }

    fn all_reduce_f64(&self, send: &[f64], recv: &mut [f64], op: ReduceOp) {
        self.all_reduce(send, recv, op, Payload::F64, |p| match p {
            Payload::F64(v) => Some(v),
            _ => None,
        });
    }

    fn abort(&self, code: i32) -> ! {
        tracing::error!(rank = self.rank, code, "threaded group aborted");
        panic!("rank {} aborted the group with code {code}", self.rank)
    }
}

/// Factory for in-process groups.
pub struct ThreadedGroup;

impl ThreadedGroup {
    /// Create the endpoints of a `size`-rank group, in rank order.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn endpoints(size: usize) -> Vec<ThreadedComm> {
        assert!(size >= 1, "a group needs at least one rank");
        let mut comms: Vec<ThreadedComm> = (0..size)
            .map(|rank| ThreadedComm {
                rank,
                size,
                outbox: (0..size).map(|_| None).collect(),
                inbox: (0..size).map(|_| None).collect(),
            })
            .collect();
        for from in 0..size {
            for to in 0..size {
                if from == to {
                    continue;
                }
                let (tx, rx) = unbounded();
                comms[from].outbox[to] = Some(tx);
                comms[to].inbox[from] = Some(rx);
            }
        }
        comms
    }

    /// Run `body` once per rank on `size` scoped threads and collect the
    /// results in rank order.
    ///
    /// A panic on any rank is re-raised on the calling thread after all
    /// ranks have finished.
    pub fn run<R, F>(size: usize, body: F) -> Vec<R>
    where
        F: Fn(ThreadedComm) -> R + Sync,
        R: Send,
    {
        let comms = Self::endpoints(size);
        std::thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    let body = &body;
                    scope.spawn(move || body(comm))
                })
                .collect();
            let mut results = Vec::with_capacity(size);
            let mut first_panic = None;
            for handle in handles {
                match handle.join() {
                    Ok(r) => results.push(r),
                    Err(payload) => {
                        if first_panic.is_none() {
                            first_panic = Some(payload);
                        }
                    }
                }
            }
            if let Some(payload) = first_panic {
                std::panic::resume_unwind(payload);
            }
            results
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ranks_and_sizes() {
        let seen = ThreadedGroup::run(3, |c| (c.rank(), c.size()));
        assert_eq!(seen, vec![(0, 3), (1, 3), (2, 3)]);
    }

    #[test]
    fn sum_over_ranks() {
        let sums = ThreadedGroup::run(4, |c| c.sum_i64(c.rank() as i64 + 1));
        assert_eq!(sums, vec![10; 4]);
    }

    #[test]
    fn min_max_over_ranks() {
        let out = ThreadedGroup::run(3, |c| {
            let r = c.rank() as i64;
            (c.min_i64(r), c.max_i64(r))
        });
        assert!(out.iter().all(|&(lo, hi)| lo == 0 && hi == 2));
    }

    #[test]
    fn successive_collectives_stay_in_order() {
        let out = ThreadedGroup::run(2, |c| {
            let mut a = [0i32; 2];
            c.all_reduce_i32(&[c.rank() as i32, 1], &mut a, ReduceOp::Sum);
            let mut b = [0.0; 1];
            c.all_reduce_f64(&[0.5], &mut b, ReduceOp::Sum);
            (a, b)
        });
        for (a, b) in out {
            assert_eq!(a, [1, 2]);
            assert_eq!(b, [1.0]);
        }
    }

    #[test]
    #[should_panic]
    fn lost_peer_panics_instead_of_hanging() {
        ThreadedGroup::run(2, |c| {
            if c.rank() == 1 {
                return;
            }
            c.sum_i64(1);
        });
    }

    proptest! {
        #[test]
        fn float_sums_are_identical_on_every_rank(
            values in proptest::collection::vec(-1e3f64..1e3, 1..5),
        ) {
            let size = values.len();
            let out = ThreadedGroup::run(size, |c| c.sum_f64(values[c.rank()]));
            let first = out[0].to_bits();
            prop_assert!(out.iter().all(|v| v.to_bits() == first));
        }
    }
}
