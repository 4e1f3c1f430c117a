//! Typed argument objects.
//!
//! Each type renders itself into wire tokens through [`Render`] and can be
//! recovered from the loosely-typed [`Arg`](crate::Arg) form with `from_arg`,
//! so filters work with one canonical representation no matter how the caller
//! spelled the option.

mod expire;
mod geo;
mod limit;
mod stream;
mod vector;

pub use expire::{ExpireCondition, TtlMode};
pub(crate) use expire::render_ttl;
pub use geo::{GeoBy, GeoFrom, GeoUnit};
pub use limit::Limit;
pub use stream::{Exactness, Idempotency, RefPolicy, StreamTrim, TrimStrategy};
pub use vector::{VectorInput, fp32_blob};

use resp_proto::Token;

/// Serialize a typed argument into wire tokens.
pub trait Render {
    fn render(&self, out: &mut Vec<Token>);

    fn to_tokens(&self) -> Vec<Token> {
        let mut out = Vec::new();
        self.render(&mut out);
        out
    }
}
