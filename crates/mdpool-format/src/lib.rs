//! Wire-level primitives for metadata heap pools.
//!
//! This crate contains:
//! - Handle newtypes ([`Offset`], [`GuidIndex`])
//! - The 16-byte [`Guid`] value type
//! - The variable-length compressed length codec used by blob entries
//! - Alignment arithmetic shared by writer and reader

pub mod align;
pub mod compressed;
pub mod guid;
pub mod ids;

#[cfg(test)]
mod align_tests;
#[cfg(test)]
mod ids_tests;

pub use align::align_up;
pub use compressed::LenError;
pub use guid::Guid;
pub use ids::{GUID_SIZE, GuidIndex, Offset};
