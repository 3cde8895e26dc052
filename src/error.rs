use thiserror::Error;

/// The one recoverable allocation failure: the request can never fit in a
/// page, not even a brand new one, because a page has to hold a block
/// header next to the payload.
///
/// Everything else that can go wrong while allocating (the platform
/// refusing to hand out another page, or exhaustion with growth turned
/// off) is treated as fatal by [`crate::PagePool`] and never surfaces as
/// an error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("requested {requested} bytes but a {page_size} byte page cannot hold that much payload")]
pub struct RequestTooLarge {
    /// Size passed to `allocate`, before any internal rounding.
    pub requested: usize,
    /// The pool's configured page size.
    pub page_size: usize,
}
