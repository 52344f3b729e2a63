//! Combinators for [`Future`]s resolving to a [`Result`].
//!
//! A failed input is always forwarded untouched: no continuation is invoked and the error is not
//! wrapped. Only [`filter`] and [`join`] create failures of their own, as
//! [`Cancelled`][crate::Cancelled] converted into the caller's error type.
mod bind;
mod ext;
mod filter;
mod group_join;
mod join;
mod map;
mod select_many;
mod unit;

pub use bind::{Bind, bind};
pub use ext::Combinators;
pub use filter::{Filter, KeyEq, Predicate, filter};
pub use group_join::{GroupJoin, Matching, Remaining, group_join};
pub use join::{Join, join};
pub use map::{Map, MapErr, map, map_err};
pub use select_many::{SelectMany, select_many};
pub use unit::{Unit, fail, unit};
