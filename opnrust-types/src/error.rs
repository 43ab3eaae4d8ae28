pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown {kind} parameter: 0x{id:02X}")]
    UnknownParameter { kind: &'static str, id: u8 },

    #[error("Parse error: {0}")]
    Parse(String),
}
