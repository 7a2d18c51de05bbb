//! Parsers and collectors for `/proc`.

pub mod net_route;
pub mod parser;
pub mod system;

pub use net_route::{ROUTE_TABLES, RouteTable};
pub use parser::ParseError;
pub use system::SystemCollector;
