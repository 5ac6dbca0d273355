//! Backend and platform services.
//!
//! Three independent clients, each owning its own error type:
//! - [`search`]: provider search and type listing against the backend
//! - [`feedback`]: feedback submission against the backend
//! - [`geolocate`]: device location acquisition behind a trait seam
//!
//! Every error type carries a `user_message()` that produces the exact banner
//! text the UI shows; the controller never formats service errors itself.

pub mod feedback;
pub mod geolocate;
pub mod search;

pub use feedback::{FeedbackClient, FeedbackError};
pub use geolocate::{GeolocateError, Geolocator, PositionOptions, SystemGeolocator};
pub use search::{SearchClient, SearchError};
