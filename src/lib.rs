use std::{borrow, collections::HashMap, ffi, path};

mod conditional;
mod error;
mod expr;
mod include;
mod macros;
mod processor;
mod wgsl_type;

pub use conditional::ConditionalStack;
pub use error::{Error, ErrorKind, Location, Result};
pub use expr::{evaluate, Lexer, Token};
pub use include::IncludeResolver;
pub use macros::{MacroDefinition, MacroTable, Precedence};
pub use processor::{Options, Preprocessor};
pub use wgsl_type::WGSLType;

/// Preprocesses a root WGSL module and builds it into a [`wgpu::ShaderModuleDescriptor`].
pub struct ShaderBuilder {
	source_path: path::PathBuf,
	preprocessor: Preprocessor,
	/// `NAME=VALUE` macros for this shader, above anything the sources `#define`.
	definitions: Vec<String>,
}

impl ShaderBuilder {
	/// Creates a new [`ShaderBuilder`].
	///
	/// # Arguments
	/// - `source_path` - Path to the root WGSL module.
	///		All includes will be relative to the parent directory of the root WGSL module.
	pub fn new(source_path: impl AsRef<path::Path>) -> Self {
		let source_path = source_path.as_ref();
		let include_search_path = source_path.parent().unwrap_or(path::Path::new("./"));
		Self::with_preprocessor(
			source_path,
			Preprocessor::with_include_search_path(include_search_path),
		)
	}

	/// Creates a [`ShaderBuilder`] that processes `source_path` with a configured engine.
	pub fn with_preprocessor(source_path: impl AsRef<path::Path>, preprocessor: Preprocessor) -> Self {
		Self {
			source_path: source_path.as_ref().to_path_buf(),
			preprocessor,
			definitions: Vec::new(),
		}
	}

	/// Defines a constant for this shader, like C's `#define`, with the value written as a WGSL
	/// literal.
	///
	/// # Arguments
	/// - `name` - Name of the constant; the identifier to replace in the code.
	/// - `value` - Value of the constant.
	pub fn put_constant(&mut self, name: &str, value: impl WGSLType) -> &mut Self {
		self.define(format!("{name}={}", value.definition()))
	}

	/// Calls [`ShaderBuilder::put_constant`] for every (key, value) pair in a given [`HashMap`].
	pub fn put_constant_map(
		&mut self,
		constant_map: &HashMap<&str, impl WGSLType + Copy>,
	) -> &mut Self {
		constant_map.iter().for_each(|(name, &value)| {
			self.put_constant(name, value);
		});
		self
	}

	/// Defines a raw `NAME` or `NAME=VALUE` macro for this shader.
	pub fn define(&mut self, definition: impl Into<String>) -> &mut Self {
		self.definitions.push(definition.into());
		self
	}

	/// Returns the fully preprocessed WGSL source.
	pub fn source(&self) -> Result<String> {
		self.preprocessor
			.process_file_with(&self.source_path, &self.definitions)
	}

	/// Builds a [`wgpu::ShaderModuleDescriptor`] from the shader.
	/// The `label` member of the built [`wgpu::ShaderModuleDescriptor`] is the name of the shader file without the postfix.
	pub fn build(&self) -> Result<wgpu::ShaderModuleDescriptor<'_>> {
		Ok(wgpu::ShaderModuleDescriptor {
			label: self.source_path.file_stem().and_then(ffi::OsStr::to_str),
			source: wgpu::ShaderSource::Wgsl(borrow::Cow::Owned(self.source()?)),
		})
	}
}
