//! RAG answering on top of the knowledge base client.

pub mod ask;
pub mod decompose;
pub mod types;

pub use ask::{ask, ask_endpoint, build_context, retrieve, EndpointParams};
pub use decompose::{answer_decomposed, decompose_query, parse_sub_questions, DecomposedAnswer};
pub use types::{sources_for, RagSourceRef};
