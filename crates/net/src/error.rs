use thiserror::Error;

/// Everything that can end a single fetch.
///
/// Cloneable so one failure can be handed to every subscriber of a result
/// stream.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NetError {
    #[error("client build error: {0}")]
    Client(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response body is not valid UTF-8 (valid up to byte {valid_up_to})")]
    Decode { valid_up_to: usize },
    /// The fetch never produced an outcome (worker could not start or panicked).
    #[error("fetch aborted: {0}")]
    Aborted(String),
}

impl NetError {
    pub fn is_transport(&self) -> bool {
        matches!(self, NetError::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, NetError::Decode { .. })
    }

    /// Flatten an error and its `source()` chain into one transport message.
    ///
    /// reqwest's top-level message rarely says *why* ("error sending request"),
    /// the cause (refused, dns, tls) lives further down the chain.
    pub(crate) fn transport(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut msg = err.to_string();
        let mut cur = err.source();
        while let Some(cause) = cur {
            let text = cause.to_string();
            if !msg.contains(&text) {
                msg.push_str(": ");
                msg.push_str(&text);
            }
            cur = cause.source();
        }
        NetError::Transport(msg)
    }
}
