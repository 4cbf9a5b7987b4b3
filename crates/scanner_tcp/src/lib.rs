//! TCP connect primitives
//!
//! `TcpConnector` is the production `Connector`; `BannerGrabber` reads
//! bounded responses from an open stream under a deadline.

mod banner;
mod connector;

pub use banner::BannerGrabber;
pub use connector::{resolve, TcpConnector};
