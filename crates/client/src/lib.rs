//! Browser client for the txt snippet service.
//!
//! Pages are built from [`dom::Component`]s over a [`dom::Dom`] backend,
//! talk to the server through [`request::ApiClient`] and report progress in
//! [`alerts::Alerts`]. Everything here runs on a single thread; host
//! services such as timers and navigation come in through
//! [`runtime::Runtime`], so the whole crate runs headless against
//! [`dom::MemoryDom`].

pub mod alerts;
pub mod api;
pub mod dom;
pub mod models;
pub mod pages;
pub mod request;
pub mod runtime;
pub mod settings;

#[cfg(test)]
mod test;
