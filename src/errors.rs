//
// Errors
//
use std::io;
use std::result;
use std::error;
use std::num;
use std::fmt;
use ndarray as nd;

/// Type alias for wordbridge errors
pub type Result<X> = result::Result<X, Error>;

/// Wrapper for many kinds of errors occuring as part of an evaluation
#[derive(Debug)]
pub enum Error {
    InvalidDimensions(String),
    ShapeError(nd::ShapeError),
    IOError(io::Error),
    ParseFloatError(String, num::ParseFloatError),
    ParseIntError(String, num::ParseIntError),
    MissingFile(String, Option<io::Error>),
    UnsupportedMethod(String),
    InvalidMethodParameter(String),
    EmptyDictionary { not_found: usize, not_found_src: usize, not_found_tgt: usize },
    NoIdenticalStrings,
    CaseViolation { line: String, index: usize },
    DegenerateEvaluation { k: usize },
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidDimensions(ref info) => write!(f, "Dimension Mismatch: {}", info),
            Error::ShapeError(ref err) => write!(f, "NDArray shape error: {}", err),
            Error::IOError(ref err) => write!(f, "IO error: {}", err),
            Error::ParseFloatError(ref token, ref err) =>
                write!(f, "Error parsing float from {:?}: {}", token, err),
            Error::ParseIntError(ref token, ref err) =>
                write!(f, "Error parsing integer from {:?}: {}", token, err),
            Error::MissingFile(ref info, ref opt_err) => {
                write!(f,
                    "The {} must already exist at this point but there was a problem opening it. \
                    Wrong directory? The OS error was: ",
                    info)?;
                if let Some(ref err) = *opt_err { err.fmt(f) }
                else { write!(f, "Unknown") }
            },
            Error::UnsupportedMethod(ref name) => write!(f, "Unknown method: {:?}", name),
            Error::InvalidMethodParameter(ref info) => write!(f, "Invalid method parameter: {}", info),
            Error::EmptyDictionary { not_found, not_found_src, not_found_tgt } => write!(f,
                "Empty evaluation dictionary: every pair contained an unknown word \
                ({} pairs, {} unknown in lang1, {} unknown in lang2)",
                not_found, not_found_src, not_found_tgt),
            Error::NoIdenticalStrings => write!(f,
                "No identical character strings were found. Please specify a dictionary."),
            Error::CaseViolation { ref line, index } => write!(f,
                "Dictionary line {} is not lowercase: {:?}", index, line),
            Error::DegenerateEvaluation { k } => write!(f,
                "Precision and recall at k = {} are both zero, F1 is undefined", k),
            Error::Other(ref info) => write!(f, "{}", info),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::ShapeError(ref err) => Some(err),
            Error::IOError(ref err) => Some(err),
            Error::ParseFloatError(_, ref err) => Some(err),
            Error::ParseIntError(_, ref err) => Some(err),
            Error::MissingFile(_, Some(ref err)) => Some(err),
            _ => None,
        }
    }
}
//
// Convert everything else into Error
//
impl From<nd::ShapeError> for Error {
    fn from(err: nd::ShapeError) -> Self {
        Error::ShapeError(err)
    }
}
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IOError(err)
    }
}

//
// Convert Error into a general io Error
//
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        io::Error::new(io::ErrorKind::Other, err)
    }
}
