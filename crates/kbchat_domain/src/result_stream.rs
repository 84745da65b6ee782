use std::pin::Pin;

use tokio_stream::Stream;

/// Type alias for Result of a boxed, sendable stream
pub type BoxStream<A, E> = Pin<Box<dyn Stream<Item = std::result::Result<A, E>> + Send>>;

pub type ResultStream<A, E> = std::result::Result<BoxStream<A, E>, E>;
