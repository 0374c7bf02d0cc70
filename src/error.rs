use std::fmt;

#[derive(Debug)]
pub enum CardstockError {
    InvalidGrid { rows: u32, cols: u32 },
    InvalidGeometry { width_milli: i64, height_milli: i64 },
    ColumnAmbiguous { wanted: String, candidates: Vec<String> },
    Ingest(String),
    Asset(String),
    Io(std::io::Error),
}

impl fmt::Display for CardstockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardstockError::InvalidGrid { rows, cols } => {
                write!(f, "grid must have at least one row and column: {}x{}", rows, cols)
            }
            CardstockError::InvalidGeometry {
                width_milli,
                height_milli,
            } => write!(
                f,
                "card dimensions are not positive ({}x{} millipoints): grid too dense for page",
                width_milli, height_milli
            ),
            CardstockError::ColumnAmbiguous { wanted, candidates } => write!(
                f,
                "column {} matches several headers: {}",
                wanted,
                candidates.join(", ")
            ),
            CardstockError::Ingest(message) => write!(f, "ingest error: {}", message),
            CardstockError::Asset(message) => write!(f, "asset error: {}", message),
            CardstockError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for CardstockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CardstockError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CardstockError {
    fn from(value: std::io::Error) -> Self {
        CardstockError::Io(value)
    }
}
