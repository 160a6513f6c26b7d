//! Pipeline stages.
//!
//! The first three run as HTTP [`Middleware`](crate::Middleware); the rest
//! are plain functions called by [`dispatch`](crate::dispatch) on both
//! transports.

pub mod context;
pub mod correlation;
pub mod envelope;
pub mod identity;
pub mod injection;
pub mod serialization;
pub mod stripping;
pub mod validation;

pub use context::{ContextFactory, ContextMiddleware, DEFAULT_CORRELATION_HEADER};
pub use correlation::CorrelationMiddleware;
pub use envelope::{Outgoing, ResponseEnvelopeStage};
pub use identity::IdentityMiddleware;
pub use injection::ContextInjectionStage;
pub use serialization::{Filtered, SerializationFilter};
pub use stripping::ContextStrippingStage;
pub use validation::ValidationStage;
