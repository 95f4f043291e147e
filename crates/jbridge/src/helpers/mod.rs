//! Bulk helpers
//!
//! Pure functions over the adapter interfaces. Nothing here reaches past a
//! view into the foreign runtime, and nothing assumes random access or a
//! known length.

pub mod group;
pub mod iter;
pub mod sets;

pub use group::{distinct, filter, group_by, partition};
pub use iter::{
    all, any, count_remaining, find, fold, for_each_remaining, reduce, skip, take, to_vec,
};
pub use sets::{difference, intersection, is_subset, union};
