//! Message shapes exchanged with the rendering server.

pub mod inbound;
pub mod outbound;
pub mod scope;

pub use inbound::{
    CorrelationId, DiffBatch, DiffEntry, DiffStatus, OpenTarget, RemoteCommand, ScrollBehavior,
    ScrollCommand, ServerMessage,
};
pub use outbound::{EventData, OutboundSnapshot, WindowResponse};
pub use scope::ReferenceScope;
