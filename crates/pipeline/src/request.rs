//! Request marker types.

/// Whether a request mutates state or only reads it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Command,
    Query,
}

/// A dispatchable request: a plain struct carrying the operation's inputs.
///
/// Each request type maps to exactly one handler; the handler produces
/// `Output` or a domain error. `NAME` shows up in log lines and in the
/// "no handler" error, so keep it stable.
pub trait Request: Send + Sync + 'static {
    type Output: Send + 'static;

    const KIND: RequestKind;
    const NAME: &'static str;
}
