use crate::lifecycle::ComputeState;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] narwhal_graphlib::Error),
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("cannot {operation} while the layout is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: ComputeState,
    },
    #[error("{algorithm} layouts do not take a root node")]
    RootNotSupported { algorithm: &'static str },
    #[error("node not found: {id}")]
    NodeNotFound { id: String },
}

pub type Result<T> = std::result::Result<T, Error>;
