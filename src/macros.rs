use std::{collections::HashMap, str};

use crate::error::{ErrorKind, Result};

/// Lexical class shared by macro names, expression identifiers and the identifier runs of code lines.
pub(crate) const IDENTIFIER_PATTERN: &str = "[A-Za-z_][A-Za-z0-9_]*";

lazy_static::lazy_static! {
	static ref IDENTIFIER: regex::Regex =
		regex::Regex::new(const_format::concatcp!("^", IDENTIFIER_PATTERN, "$")).unwrap();
}

pub(crate) fn is_identifier(name: &str) -> bool {
	IDENTIFIER.is_match(name)
}

/// Configuration layer a macro was defined at. Higher layers win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
	/// `#define` inside a processed file.
	FileDefine,
	/// Predefined by the engine's [`Options`](crate::Options).
	GlobalOption,
	/// Supplied for a single `process_with` or `process_file_with` call.
	PerInvocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Macro {
	value: String,
	precedence: Precedence,
}

/// Name to value bindings for one preprocessing run.
///
/// Values are stored verbatim; an empty value is a flag macro.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
	macros: HashMap<String, Macro>,
}

impl MacroTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or updates `name`. The write is dropped, and `false` returned, when the existing
	/// entry was defined at a higher [`Precedence`].
	pub fn define(
		&mut self,
		name: impl Into<String>,
		value: impl Into<String>,
		precedence: Precedence,
	) -> bool {
		let name = name.into();
		if let Some(existing) = self.macros.get(&name) {
			if existing.precedence > precedence {
				log::debug!(
					"#define {name} ignored: locked at {:?} with value `{}`",
					existing.precedence,
					existing.value
				);
				return false;
			}
		}
		self.macros.insert(
			name,
			Macro {
				value: value.into(),
				precedence,
			},
		);
		true
	}

	pub fn lookup(&self, name: &str) -> Option<&str> {
		self.macros.get(name).map(|m| m.value.as_str())
	}

	pub fn defined(&self, name: &str) -> bool {
		self.macros.contains_key(name)
	}

	#[cfg(test)]
	fn precedence(&self, name: &str) -> Option<Precedence> {
		self.macros.get(name).map(|m| m.precedence)
	}
}

/// A `NAME` or `NAME=VALUE` macro definition string, as accepted by
/// [`Options::predefined_macros`](crate::Options::predefined_macros) and `-D`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
	pub name: String,
	pub value: String,
}

impl str::FromStr for MacroDefinition {
	type Err = ErrorKind;

	fn from_str(definition: &str) -> std::result::Result<Self, Self::Err> {
		let (name, value) = definition.split_once('=').unwrap_or((definition, ""));
		let (name, value) = (name.trim(), value.trim());
		if !is_identifier(name) {
			return Err(ErrorKind::InvalidMacroName {
				name: name.to_string(),
			});
		}
		Ok(Self {
			name: name.to_string(),
			value: value.to_string(),
		})
	}
}

pub(crate) fn parse_definitions<S: AsRef<str>>(definitions: &[S]) -> Result<Vec<MacroDefinition>> {
	definitions
		.iter()
		.map(|definition| Ok(definition.as_ref().parse::<MacroDefinition>()?))
		.collect()
}
