//! View-models: in-memory lists with client-side segments, loaded through the
//! services and refreshed after every mutation.

pub mod dashboard;
pub mod driver_board;
pub mod list;
pub mod route_manager;
pub mod segment;
pub mod summary;

pub use list::{FilteredList, ListSnapshot, ViewState};
pub use segment::{PeriodSegment, Segment, StatusSegment};
