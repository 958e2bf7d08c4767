//! Dense integer ids used across the abstraction arena (refinement-hierarchy nodes,
//! abstract states, operators), following an arena + dense-index design rather than
//! pointer-linked nodes.

use std::ops::{Index, IndexMut};

macro_rules! dense_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                $name(v as u32)
            }
        }
        impl From<$name> for usize {
            fn from(v: $name) -> Self {
                v.0 as usize
            }
        }
        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                $name(v)
            }
        }
        impl From<$name> for u32 {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl<V> Index<$name> for Vec<V> {
            type Output = V;
            fn index(&self, index: $name) -> &V {
                &self[usize::from(index)]
            }
        }
        impl<V> IndexMut<$name> for Vec<V> {
            fn index_mut(&mut self, index: $name) -> &mut V {
                &mut self[usize::from(index)]
            }
        }
    };
}

dense_id!(NodeId);
dense_id!(StateId);
