//! The [`Communicator`] trait: the group of cooperating processes an
//! instance is bound to.
//!
//! Every method except [`rank`](Communicator::rank),
//! [`size`](Communicator::size) and [`abort`](Communicator::abort) is a
//! collective: all ranks must call it, in the same order, with
//! matching lengths. Calling a collective on a strict subset of the
//! group blocks forever; implementations make no attempt to detect it.

use std::ops::Add;

/// Element-wise combination applied by an all-reduce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReduceOp {
    /// Element-wise sum.
    Sum,
    /// Element-wise minimum.
    Min,
    /// Element-wise maximum.
    Max,
}

impl ReduceOp {
    /// Fold `incoming` into `acc` element by element.
    ///
    /// # Panics
    ///
    /// Panics if the slices differ in length.
    pub fn combine<T>(self, acc: &mut [T], incoming: &[T])
    where
        T: Copy + PartialOrd + Add<Output = T>,
    {
        assert_eq!(
            acc.len(),
            incoming.len(),
            "all-reduce buffers differ in length"
        );
        for (a, &b) in acc.iter_mut().zip(incoming) {
            *a = match self {
                Self::Sum => *a + b,
                Self::Min => {
                    if b < *a {
                        b
                    } else {
                        *a
                    }
                }
                Self::Max => {
                    if b > *a {
                        b
                    } else {
                        *a
                    }
                }
            };
        }
    }
}

/// A group of cooperating processes.
///
/// # Contract
///
/// - `rank()` is in `0..size()` and never changes.
/// - All-reduce results are identical on every rank, bit for bit.
/// - `send` and `recv` of one call have equal length on every rank.
pub trait Communicator: Send + Sync {
    /// Identity of the calling process within the group.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// Element-wise all-reduce of 32-bit integers.
    fn all_reduce_i32(&self, send: &[i32], recv: &mut [i32], op: ReduceOp);

    /// Element-wise all-reduce of 64-bit integers.
    fn all_reduce_i64(&self, send: &[i64], recv: &mut [i64], op: ReduceOp);

    /// Element-wise all-reduce of doubles.
    fn all_reduce_f64(&self, send: &[f64], recv: &mut [f64], op: ReduceOp);

    /// Terminate the whole group. Never returns.
    fn abort(&self, code: i32) -> !;

    /// Whether this is the coordinating rank.
    fn is_root(&self) -> bool {
        self.rank() == 0
    }

    /// Collective sum of one 64-bit integer.
    fn sum_i64(&self, value: i64) -> i64 {
        let mut out = [0];
        self.all_reduce_i64(&[value], &mut out, ReduceOp::Sum);
        out[0]
    }

    /// Collective maximum of one 64-bit integer.
    fn max_i64(&self, value: i64) -> i64 {
        let mut out = [0];
        self.all_reduce_i64(&[value], &mut out, ReduceOp::Max);
        out[0]
    }

    /// Collective minimum of one 64-bit integer.
    fn min_i64(&self, value: i64) -> i64 {
        let mut out = [0];
        self.all_reduce_i64(&[value], &mut out, ReduceOp::Min);
        out[0]
    }

    /// Collective sum of one double.
    fn sum_f64(&self, value: f64) -> f64 {
        let mut out = [0.0];
        self.all_reduce_f64(&[value], &mut out, ReduceOp::Sum);
        out[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn combine_sum_min_max() {
        let mut acc = [1, 5, -2];
        ReduceOp::Sum.combine(&mut acc, &[2, 2, 2]);
        assert_eq!(acc, [3, 7, 0]);
        ReduceOp::Min.combine(&mut acc, &[4, 4, 4]);
        assert_eq!(acc, [3, 4, 0]);
        ReduceOp::Max.combine(&mut acc, &[1, 9, -1]);
        assert_eq!(acc, [3, 9, 0]);
    }

    #[test]
    #[should_panic(expected = "differ in length")]
    fn combine_rejects_length_mismatch() {
        let mut acc = [0.0; 2];
        ReduceOp::Sum.combine(&mut acc, &[1.0]);
    }

    proptest! {
        #[test]
        fn sum_with_zeros_is_identity(values in proptest::collection::vec(-1e6f64..1e6, 0..32)) {
            let mut acc = values.clone();
            let zeros = vec![0.0; values.len()];
            ReduceOp::Sum.combine(&mut acc, &zeros);
            prop_assert_eq!(acc, values);
        }
    }
}
