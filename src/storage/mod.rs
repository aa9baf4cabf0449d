//! Invoice store backends

pub mod in_memory;
pub mod remote;

pub use in_memory::{InMemoryEmailOutbox, InMemoryInvoiceStore};
pub use remote::{RestAuthProvider, RestInvoiceStore};
