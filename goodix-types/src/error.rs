pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{record} record too short: {actual} bytes (min: {min})")]
    TooShort {
        record: &'static str,
        min: usize,
        actual: usize,
    },
}
