//! Per-route middleware, applied outside-in: token gate, then redirect.

pub mod redirect;
pub mod token_gate;

pub use redirect::{redirect_after, RedirectTarget};
pub use token_gate::{token_gate, TokenGate, TOKEN_HEADER};
