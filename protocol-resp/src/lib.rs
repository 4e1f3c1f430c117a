//! RESP2/RESP3 reply values and request tokens.
//!
//! This crate holds the common currency between a Redis transport and the
//! command layer built on top of it:
//!
//! - **Values**: the decoded reply tree ([`Value`]) for both RESP2 and RESP3
//! - **Tokens**: typed command arguments ([`Token`]) and complete requests ([`Request`])
//! - **Protocol**: the negotiated reply protocol ([`Protocol`])
//!
//! Byte-level framing and parsing belong to the transport; nothing here reads or
//! writes sockets.
//!
//! # Example
//!
//! ```
//! use resp_proto::{Request, Token, Value};
//!
//! let req = Request::cmd("GET").arg("mykey");
//! assert_eq!(req.args(), &[Token::from("mykey")]);
//!
//! let reply = Value::bulk_string(b"myvalue");
//! assert_eq!(reply.as_bytes(), Some(&b"myvalue"[..]));
//! ```

mod request;
mod value;

pub use request::{Request, Token};
pub use value::{Protocol, Value};
