use std::fmt;
use std::ops::{Add, AddAssign};

/// Generates an opaque index wrapper over `u64` with value semantics and a
/// total order. Indices do not support arithmetic; they only identify.
macro_rules! index_type {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            #[inline(always)]
            pub fn value(self) -> u64 {
                self.0
            }

            /// The index as a container subscript.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Generates a counter wrapper over `u64` with additive arithmetic but no
/// implicit conversion to or from other numeric types.
macro_rules! count_type {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(count: u64) -> Self {
                Self(count)
            }

            #[inline(always)]
            pub fn count(self) -> u64 {
                self.0
            }
        }

        impl Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self(self.0.checked_add(rhs.0).expect("Counter overflow"))
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_type! {
    /// Identifies a vertex. Unique across the whole graph.
    VertexId
}
index_type! {
    /// Identifies an edge within its tile.
    EdgeId
}
index_type! {
    /// Identifies a graph tile, and thereby the worker that owns it.
    TileId
}

count_type! {
    /// Number of gather-scatter iterations.
    IterCount
}
count_type! {
    /// Number of inbound or outbound edges of a vertex.
    DegreeCount
}

/// Reserved sentinel, never a valid vertex.
pub const INVALID_VERTEX_ID: VertexId = VertexId::new(u64::MAX);

/// Effectively unbounded iteration cap.
pub const INF_ITER_COUNT: IterCount = IterCount::new(u64::MAX);

impl IterCount {
    /// The following iteration.
    pub fn next(self) -> Self {
        Self(self.0.checked_add(1).expect("Iteration count overflow"))
    }
}

impl DegreeCount {
    pub(crate) fn inc(&mut self) {
        *self += Self(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_ordering_and_display() {
        let a = VertexId::new(3);
        let b = VertexId::from(7);
        assert!(a < b);
        assert_eq!(a, VertexId::new(3));
        assert_eq!(b.value(), 7);
        assert_eq!(b.index(), 7);
        assert_eq!(format!("{}", b), "7");
        assert!(a < INVALID_VERTEX_ID);
    }

    #[test]
    fn counter_arithmetic() {
        let mut deg = DegreeCount::default();
        assert_eq!(deg.count(), 0);
        deg += DegreeCount::new(2);
        deg.inc();
        assert_eq!(deg, DegreeCount::new(3));

        let iter = IterCount::new(41);
        assert_eq!(iter.next(), IterCount::new(42));
        assert!(iter < INF_ITER_COUNT);
    }
}
