//! Missing-value placeholder selection.
//!
//! Fixed-width storage has no null, so missing entries are replaced by an
//! in-band sentinel that is guaranteed not to collide with any present value.
//! The selectors only ever see the *present* values.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Placeholder used for boolean vectors stored as `i8`.
pub const BOOLEAN_PLACEHOLDER: i8 = -1;

/// Fixed-width integer storage types.
pub trait IntStorage: Copy + Ord + Hash + Debug {
    const MIN: Self;
    const MAX: Self;
    const ZERO: Self;
    const NAME: &'static str;

    /// `self + 1`; only called below `MAX`.
    fn successor(self) -> Self;
}

macro_rules! int_storage {
    ($($t:ty),*) => {
        $(impl IntStorage for $t {
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;
            const ZERO: Self = 0;
            const NAME: &'static str = stringify!($t);

            fn successor(self) -> Self {
                self + 1
            }
        })*
    };
}

int_storage!(i8, u8, i16, u16, i32, u32, i64, u64);

/// Choose an integer placeholder absent from `present`.
///
/// Tries the type minimum, then the maximum, then zero, then scans upwards
/// from `MIN + 1`. Returns `None` when every value of the type is taken; the
/// caller must then widen the storage.
pub fn choose_integer_placeholder<T: IntStorage>(present: impl IntoIterator<Item = T>) -> Option<T> {
    let taken: HashSet<T> = present.into_iter().collect();
    for candidate in [T::MIN, T::MAX, T::ZERO] {
        if !taken.contains(&candidate) {
            return Some(candidate);
        }
    }
    let mut candidate = T::MIN.successor();
    while candidate < T::MAX {
        if !taken.contains(&candidate) {
            return Some(candidate);
        }
        candidate = candidate.successor();
    }
    None
}

/// Floating-point storage types.
pub trait FloatStorage: Copy + PartialOrd + Debug {
    const NAN: Self;
    const INFINITY: Self;
    const NEG_INFINITY: Self;
    /// Most negative finite value.
    const LOWEST: Self;
    const MAX: Self;
    const ZERO: Self;
    const NAME: &'static str;

    fn is_nan(self) -> bool;
    fn is_finite(self) -> bool;
    /// A value strictly between `a` and `b` when one is representable.
    fn midpoint(a: Self, b: Self) -> Self;
}

macro_rules! float_storage {
    ($($t:ty),*) => {
        $(impl FloatStorage for $t {
            const NAN: Self = <$t>::NAN;
            const INFINITY: Self = <$t>::INFINITY;
            const NEG_INFINITY: Self = <$t>::NEG_INFINITY;
            const LOWEST: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;
            const ZERO: Self = 0.0;
            const NAME: &'static str = stringify!($t);

            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }

            fn is_finite(self) -> bool {
                <$t>::is_finite(self)
            }

            fn midpoint(a: Self, b: Self) -> Self {
                let m = a + (b - a) / 2.0;
                if m.is_finite() {
                    m
                } else {
                    // b - a overflowed
                    a / 2.0 + b / 2.0
                }
            }
        })*
    };
}

float_storage!(f32, f64);

/// Choose a float placeholder absent from `present`.
///
/// NaN is only used when no present value is NaN. After that the order is
/// `+Inf`, `-Inf`, lowest, max, zero, and finally the midpoint of the first
/// pair of adjacent distinct finite values whose midpoint collides with
/// neither neighbour. `None` is fatal: floats are the widest storage.
pub fn choose_float_placeholder<T: FloatStorage>(present: &[T]) -> Option<T> {
    if !present.iter().any(|x| x.is_nan()) {
        return Some(T::NAN);
    }
    let values: Vec<T> = present.iter().copied().filter(|x| !x.is_nan()).collect();
    for candidate in [T::INFINITY, T::NEG_INFINITY, T::LOWEST, T::MAX, T::ZERO] {
        if !values.iter().any(|&v| v == candidate) {
            return Some(candidate);
        }
    }

    let mut finite: Vec<T> = values.into_iter().filter(|x| x.is_finite()).collect();
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    finite.dedup_by(|a, b| a == b);
    finite.windows(2).find_map(|w| {
        let m = T::midpoint(w[0], w[1]);
        (m != w[0] && m != w[1]).then_some(m)
    })
}

/// Choose a string placeholder absent from `present`: `"NA"`, then `"NA_"`,
/// `"NA__"` and so on.
pub fn choose_string_placeholder<'a>(present: impl IntoIterator<Item = &'a str>) -> String {
    let taken: HashSet<&str> = present.into_iter().collect();
    let mut placeholder = String::from("NA");
    while taken.contains(placeholder.as_str()) {
        placeholder.push('_');
    }
    placeholder
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LIMIT: i32 = i32::MAX;

    #[test]
    fn integer_prefers_min_then_max_then_zero() {
        assert_eq!(choose_integer_placeholder([1i32, 2, 3]), Some(i32::MIN));
        assert_eq!(choose_integer_placeholder([1, 2, i32::MIN]), Some(LIMIT));
        assert_eq!(choose_integer_placeholder([1, 2, LIMIT, i32::MIN]), Some(0));
        assert_eq!(
            choose_integer_placeholder([1, 2, LIMIT, 0, i32::MIN]),
            Some(i32::MIN + 1)
        );
        assert_eq!(
            choose_integer_placeholder([1, 2, LIMIT, 0, i32::MIN, i32::MIN + 1]),
            Some(i32::MIN + 2)
        );
    }

    #[test]
    fn unsigned_storage() {
        assert_eq!(choose_integer_placeholder([1u8, 2]), Some(0));
        assert_eq!(choose_integer_placeholder([1u8, 2, 0]), Some(255));
        assert_eq!(choose_integer_placeholder(0u8..=255), None);
        assert_eq!(choose_integer_placeholder((0u8..=255).filter(|&x| x != 77)), Some(77));
    }

    #[test]
    fn float_escalation_order() {
        let lowest = f64::MIN;
        let max = f64::MAX;
        assert!(choose_float_placeholder(&[1.0, 2.0, 3.0]).unwrap().is_nan());

        let mut xs = vec![1.0, 2.0, 3.0, f64::NAN];
        assert_eq!(choose_float_placeholder(&xs), Some(f64::INFINITY));
        xs.push(f64::INFINITY);
        assert_eq!(choose_float_placeholder(&xs), Some(f64::NEG_INFINITY));
        xs.push(f64::NEG_INFINITY);
        assert_eq!(choose_float_placeholder(&xs), Some(lowest));
        xs.push(lowest);
        assert_eq!(choose_float_placeholder(&xs), Some(max));
        xs.push(max);
        assert_eq!(choose_float_placeholder(&xs), Some(0.0));
        xs.push(0.0);
        assert_eq!(choose_float_placeholder(&xs), Some(lowest / 2.0));
    }

    #[test]
    fn float32_midpoint() {
        let xs = [1.0f32, 2.0, 3.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY, f32::MIN, f32::MAX, 0.0];
        assert_eq!(choose_float_placeholder(&xs), Some(f32::MIN / 2.0));
    }

    #[test]
    fn negative_zero_blocks_zero() {
        let xs = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, f64::MIN, f64::MAX, -0.0];
        let p = choose_float_placeholder(&xs).unwrap();
        assert!(p != 0.0);
    }

    #[test]
    fn adjacent_floats_have_no_midpoint() {
        let a = 1.0f64;
        let b = f64::from_bits(a.to_bits() + 1);
        let xs = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, f64::MIN, f64::MAX, 0.0, a, b];
        let p = choose_float_placeholder(&xs).unwrap();
        assert!(!xs.iter().any(|&x| x == p));
        assert!(p > f64::MIN && p < 0.0);
    }

    #[test]
    fn string_growth() {
        assert_eq!(choose_string_placeholder(["XA"]), "NA");
        assert_eq!(choose_string_placeholder(["NA"]), "NA_");
        assert_eq!(choose_string_placeholder(["NA", "NA_"]), "NA__");
        assert_eq!(choose_string_placeholder(["NA_", "NA"]), "NA__");
    }

    proptest! {
        #[test]
        fn integer_placeholder_never_collides(xs in proptest::collection::vec(any::<i32>(), 0..200)) {
            let p = choose_integer_placeholder(xs.iter().copied()).unwrap();
            prop_assert!(!xs.contains(&p));
        }

        #[test]
        fn i8_placeholder_never_collides(xs in proptest::collection::vec(any::<i8>(), 0..300)) {
            if let Some(p) = choose_integer_placeholder(xs.iter().copied()) {
                prop_assert!(!xs.contains(&p));
            } else {
                let distinct: HashSet<i8> = xs.iter().copied().collect();
                prop_assert_eq!(distinct.len(), 256);
            }
        }

        #[test]
        fn float_placeholder_never_collides(
            xs in proptest::collection::vec(any::<f64>(), 0..100),
            specials in proptest::collection::vec(
                prop_oneof![
                    Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY),
                    Just(f64::MIN), Just(f64::MAX), Just(0.0)
                ],
                0..8
            ),
        ) {
            let mut all = xs;
            all.extend(specials);
            let p = choose_float_placeholder(&all).unwrap();
            if p.is_nan() {
                prop_assert!(!all.iter().any(|x| x.is_nan()));
            } else {
                prop_assert!(!all.iter().any(|&x| x == p));
            }
        }

        #[test]
        fn string_placeholder_never_collides(xs in proptest::collection::vec("(NA)?_{0,4}", 0..20)) {
            let p = choose_string_placeholder(xs.iter().map(String::as_str));
            prop_assert!(!xs.contains(&p));
        }
    }
}
