#[derive(Debug)]
pub enum DecodeError {
    Empty,
    InvalidCharacter(char),
    InvalidBase64(base64::DecodeError),
    InvalidLength,
    MissingPrefix,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "Empty identifier"),
            DecodeError::InvalidCharacter(c) => write!(f, "Invalid character {:?}", c),
            DecodeError::InvalidBase64(e) => write!(f, "Invalid Base64: {}", e),
            DecodeError::InvalidLength => write!(f, "Invalid Length"),
            DecodeError::MissingPrefix => write!(f, "Missing Prefix"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<base64::DecodeError> for DecodeError {
    fn from(e: base64::DecodeError) -> Self { DecodeError::InvalidBase64(e) }
}
