#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("node index {index} is out of range (node count {len})")]
    NodeIndexOutOfRange { index: usize, len: usize },

    #[error("edge index {index} is out of range (edge count {len})")]
    EdgeIndexOutOfRange { index: usize, len: usize },

    #[error("node already exists: {id}")]
    DuplicateNode { id: String },
}

pub type Result<T> = std::result::Result<T, Error>;
