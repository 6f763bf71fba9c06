//! # Transit Feed
//!
//! Pull-parses Datex II style JSON feeds (car-park occupancy, traffic
//! situations) and extracts a handful of typed fields per situation record
//! without building the document tree. The document is read once as a flat
//! token stream; a schema-specific [`Extractor`] tracks which named objects
//! are open and captures the fields it needs, and [`FeedParser`] emits one
//! record each time a `situationRecord` object closes.
//!
//! ## Example
//!
//! ```no_run
//! use transit_feed::{CarParkExtractor, CarParkRecord, FeedParser, RunState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = tokio::fs::File::open("carParkData.json").await?;
//!
//!     let mut parser = FeedParser::new();
//!     let mut records = Vec::new();
//!     let state = parser
//!         .run(file, &mut records, &CarParkRecord::default, &mut CarParkExtractor::new())
//!         .await;
//!
//!     assert_eq!(state, RunState::Done);
//!     for record in &records {
//!         println!("{}: {}/{}", record.car_park_identity, record.occupied_spaces, record.total_capacity);
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(test)]
mod tests;

pub mod tags;

mod token;
pub use token::*;

mod tokenizer;
pub use tokenizer::*;

pub mod context;

mod extractor;
pub use extractor::*;

mod carpark;
pub use carpark::*;

mod traffic;
pub use traffic::*;

mod parser;
pub use parser::*;

mod reader;
pub use reader::*;

mod stream_adapter;
pub use stream_adapter::*;

pub mod metrics;

mod config;
pub use self::config::*;

#[cfg(feature = "http")]
mod connectors;
#[cfg(feature = "http")]
pub use connectors::*;
