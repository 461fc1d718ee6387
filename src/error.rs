use std::{fmt, path};

/// What went wrong while preprocessing.
#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
	#[error("file not found: {}", path.display())]
	FileNotFound {
		path: path::PathBuf,
		source: ex::io::Error,
	},
	#[error("recursive include of {}", path.display())]
	RecursiveInclude {
		path: path::PathBuf,
		/// Files being processed when the cycle was found, outermost first.
		chain: Vec<path::PathBuf>,
	},
	#[error("unknown directive: #{directive}")]
	UnknownDirective { directive: String },
	#[error("unclosed conditional: {depth} #if block(s) still open at end of input")]
	UnclosedConditional { depth: usize },
	#[error("#{directive} without #if")]
	DanglingElifOrElse { directive: &'static str },
	#[error("malformed expression `{expression}`: {reason}")]
	MalformedExpression { expression: String, reason: String },
	#[error("#{directive} requires an operand")]
	MissingOperand { directive: &'static str },
	#[error("invalid macro name `{name}`")]
	InvalidMacroName { name: String },
}

/// Where an error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
	/// File being processed, [`None`] for in-memory source text.
	pub origin: Option<path::PathBuf>,
	/// 1-based line number.
	pub line: usize,
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.origin {
			Some(origin) => write!(f, "{}:{}", origin.display(), self.line),
			None => write!(f, "<input>:{}", self.line),
		}
	}
}

/// Error returned by every fallible preprocessing operation.
#[derive(Debug)]
pub struct Error {
	kind: ErrorKind,
	location: Option<Location>,
}

impl Error {
	pub(crate) fn at(kind: ErrorKind, origin: Option<&path::Path>, line: usize) -> Self {
		Self {
			kind,
			location: Some(Location {
				origin: origin.map(path::Path::to_path_buf),
				line,
			}),
		}
	}

	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	pub fn location(&self) -> Option<&Location> {
		self.location.as_ref()
	}
}

impl From<ErrorKind> for Error {
	fn from(kind: ErrorKind) -> Self {
		Self {
			kind,
			location: None,
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.location {
			Some(location) => write!(f, "{location}: {}", self.kind),
			None => self.kind.fmt(f),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		std::error::Error::source(&self.kind)
	}
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::{Error, ErrorKind};
	use std::path;

	#[test]
	fn display_with_location() {
		let error = Error::at(
			ErrorKind::UnknownDirective {
				directive: "pragma".to_string(),
			},
			Some(path::Path::new("shaders/main.wgsl")),
			3,
		);
		assert_eq!(
			error.to_string(),
			"shaders/main.wgsl:3: unknown directive: #pragma"
		);
	}

	#[test]
	fn display_in_memory_source() {
		let error = Error::at(
			ErrorKind::DanglingElifOrElse { directive: "endif" },
			None,
			1,
		);
		assert_eq!(error.to_string(), "<input>:1: #endif without #if");
	}

	#[test]
	fn display_without_location() {
		let error = Error::from(ErrorKind::InvalidMacroName {
			name: "1X".to_string(),
		});
		assert!(error.location().is_none());
		assert_eq!(error.to_string(), "invalid macro name `1X`");
	}
}
