use derive_new::new;
use gt_kernel_api::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    FileError,
    RangeError,
    KeyInUseError,
    InvalidArgumentError,
    PermissionError,
    IOError,
    LoggerError,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, new)]
pub struct GtError {
    error_type: ErrorType,
    message: String,
}

impl GtError {
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

pub fn file_error(message: String) -> GtError {
    GtError::new(ErrorType::FileError, message)
}

pub fn range_error(message: String) -> GtError {
    GtError::new(ErrorType::RangeError, message)
}

pub fn key_in_use_error(message: String) -> GtError {
    GtError::new(ErrorType::KeyInUseError, message)
}

pub fn invalid_argument_error(message: String) -> GtError {
    GtError::new(ErrorType::InvalidArgumentError, message)
}

pub fn io_error(message: String) -> GtError {
    GtError::new(ErrorType::IOError, message)
}

pub fn logger_error(message: String) -> GtError {
    GtError::new(ErrorType::LoggerError, message)
}

impl From<GraphError> for GtError {
    fn from(e: GraphError) -> Self {
        let error_type = match e {
            GraphError::KeyInUse(_) => ErrorType::KeyInUseError,
            GraphError::VertexNotFound(_) => ErrorType::RangeError,
            GraphError::Permission(_) => ErrorType::PermissionError,
        };
        GtError::new(error_type, e.to_string())
    }
}

impl std::fmt::Display for GtError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "[{}] {}", self.error_type, self.message)
    }
}
