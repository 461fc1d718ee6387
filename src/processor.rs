use std::path;

use crate::{
	conditional::ConditionalStack,
	error::{Error, ErrorKind, Result},
	expr,
	include::IncludeResolver,
	macros::{self, MacroDefinition, MacroTable, Precedence},
};

const DIRECTIVE_PREFIX: &str = "#";

lazy_static::lazy_static! {
	/// Keyword and operand of a trimmed directive line.
	static ref DIRECTIVE: regex::Regex =
		regex::Regex::new(const_format::concatcp!("^", DIRECTIVE_PREFIX, r"\s*(\S*)(.*)$")).unwrap();
	/// Words of a code line. Number literals are matched so that their suffixes are never
	/// mistaken for macro names.
	static ref WORD: regex::Regex =
		regex::Regex::new(const_format::concatcp!(macros::IDENTIFIER_PATTERN, "|[0-9][A-Za-z0-9_.]*")).unwrap();
}

/// Configuration of a [`Preprocessor`].
#[derive(Debug, Clone)]
pub struct Options {
	/// Directory `#include` operands are joined with. Empty means the current directory.
	pub include_search_path: path::PathBuf,
	/// `NAME` or `NAME=VALUE` strings, defined before every run. A `#define` of the same name has
	/// no effect.
	pub predefined_macros: Vec<String>,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			include_search_path: path::PathBuf::from("."),
			predefined_macros: Vec::new(),
		}
	}
}

impl Options {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_include_search_path(mut self, include_search_path: impl Into<path::PathBuf>) -> Self {
		self.include_search_path = include_search_path.into();
		self
	}

	pub fn with_macro(mut self, definition: impl Into<String>) -> Self {
		self.predefined_macros.push(definition.into());
		self
	}
}

/// Expands `#include`, `#define` and the `#if` family in WGSL source.
///
/// The engine only keeps its configuration between runs; macros defined by processed files are
/// forgotten once a run returns.
///
/// ```no_run
/// let preprocessor = pre_wgsl::Preprocessor::new(
/// 	pre_wgsl::Options::new()
/// 		.with_include_search_path("shaders")
/// 		.with_macro("USE_SHADOWS"),
/// )?;
/// let source = preprocessor.process_file_with("shaders/main.wgsl", &["MAX_LIGHTS=8"])?;
/// # Ok::<(), pre_wgsl::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Preprocessor {
	include_search_path: path::PathBuf,
	predefined: Vec<MacroDefinition>,
}

impl Default for Preprocessor {
	fn default() -> Self {
		Self::with_include_search_path(Options::default().include_search_path)
	}
}

impl Preprocessor {
	/// Fails with [`ErrorKind::InvalidMacroName`] when a predefined macro is not an identifier.
	pub fn new(options: Options) -> Result<Self> {
		Ok(Self {
			include_search_path: options.include_search_path,
			predefined: macros::parse_definitions(&options.predefined_macros)?,
		})
	}

	/// An engine without predefined macros.
	pub fn with_include_search_path(include_search_path: impl Into<path::PathBuf>) -> Self {
		Self {
			include_search_path: include_search_path.into(),
			predefined: Vec::new(),
		}
	}

	/// Adds a `NAME` or `NAME=VALUE` macro for every following run.
	pub fn define(&mut self, definition: &str) -> Result<&mut Self> {
		let definition = definition.parse::<MacroDefinition>()?;
		self.predefined.retain(|predefined| predefined.name != definition.name);
		self.predefined.push(definition);
		Ok(self)
	}

	/// Processes in-memory source text. `#include` operands are resolved against the search path.
	pub fn process(&self, source: &str) -> Result<String> {
		self.process_with(source, &[] as &[&str])
	}

	/// Like [`Preprocessor::process`], with `macros` defined for this call only. They take
	/// precedence over the predefined macros.
	pub fn process_with<S: AsRef<str>>(&self, source: &str, macros: &[S]) -> Result<String> {
		self.start_run(macros)?.process_text(source, None)
	}

	/// Loads and processes `path`. The root file takes part in include cycle detection.
	pub fn process_file(&self, path: impl AsRef<path::Path>) -> Result<String> {
		self.process_file_with(path, &[] as &[&str])
	}

	pub fn process_file_with<S: AsRef<str>>(
		&self,
		path: impl AsRef<path::Path>,
		macros: &[S],
	) -> Result<String> {
		let path = path.as_ref();
		let mut run = self.start_run(macros)?;
		let source = run.includes.enter(path)?;
		let output = run.process_text(&source, Some(path))?;
		run.includes.leave();
		Ok(output)
	}

	fn start_run<S: AsRef<str>>(&self, per_invocation: &[S]) -> Result<Run> {
		let mut table = MacroTable::new();
		for definition in &self.predefined {
			table.define(&definition.name, &definition.value, Precedence::GlobalOption);
		}
		for definition in macros::parse_definitions(per_invocation)? {
			table.define(definition.name, definition.value, Precedence::PerInvocation);
		}
		Ok(Run {
			macros: table,
			includes: IncludeResolver::new(&self.include_search_path),
		})
	}
}

/// State of one top-level run.
struct Run {
	macros: MacroTable,
	includes: IncludeResolver,
}

impl Run {
	fn process_text(&mut self, source: &str, origin: Option<&path::Path>) -> Result<String> {
		let mut output = String::new();
		let mut conditionals = ConditionalStack::new();
		let mut line_number = 0;
		for line in source.lines() {
			line_number += 1;
			if let Some(directive) = DIRECTIVE.captures(line.trim()) {
				let keyword = directive.get(1).map_or("", |m| m.as_str());
				let operand = directive.get(2).map_or("", |m| m.as_str().trim());
				let at = |kind| Error::at(kind, origin, line_number);
				self.directive(keyword, operand, &mut conditionals, &mut output, at)?;
			} else if conditionals.is_active() {
				output.push_str(&self.expand(line));
				output.push('\n');
			}
		}
		conditionals
			.finish()
			.map_err(|kind| Error::at(kind, origin, line_number))?;
		Ok(output)
	}

	fn directive(
		&mut self,
		keyword: &str,
		operand: &str,
		conditionals: &mut ConditionalStack,
		output: &mut String,
		at: impl Fn(ErrorKind) -> Error,
	) -> Result<()> {
		log::trace!("#{keyword} {operand}");
		match keyword {
			"include" => {
				if !conditionals.is_active() {
					return Ok(());
				}
				let requested = required(operand, "include").map_err(&at)?;
				let path = self.includes.resolve(requested);
				let source = self.includes.enter(&path).map_err(&at)?;
				output.push_str(&self.process_text(&source, Some(path.as_path()))?);
				self.includes.leave();
			}
			"define" => {
				if !conditionals.is_active() {
					return Ok(());
				}
				let definition = required(operand, "define").map_err(&at)?;
				let (name, value) = definition
					.split_once(char::is_whitespace)
					.unwrap_or((definition, ""));
				if !macros::is_identifier(name) {
					return Err(at(ErrorKind::InvalidMacroName {
						name: name.to_string(),
					}));
				}
				self.macros.define(name, value.trim(), Precedence::FileDefine);
			}
			"ifdef" | "ifndef" => {
				let directive = if keyword == "ifdef" { "ifdef" } else { "ifndef" };
				let name = required(operand, directive)
					.map_err(&at)?
					.split_whitespace()
					.next()
					.unwrap_or_default();
				let expected = directive == "ifdef";
				conditionals
					.push(|| Ok(self.macros.defined(name) == expected))
					.map_err(&at)?;
			}
			"if" => conditionals
				.push(|| Ok(expr::evaluate(operand, &self.macros)? != 0))
				.map_err(&at)?,
			"elif" => conditionals
				.elif(|| Ok(expr::evaluate(operand, &self.macros)? != 0))
				.map_err(&at)?,
			"else" => conditionals.else_branch().map_err(&at)?,
			"endif" => conditionals.endif().map_err(&at)?,
			_ => {
				return Err(at(ErrorKind::UnknownDirective {
					directive: keyword.to_string(),
				}))
			}
		}
		Ok(())
	}

	/// Replaces every identifier of `line` naming a macro with the macro's value, in one pass.
	fn expand(&self, line: &str) -> String {
		WORD.replace_all(line, |word: &regex::Captures| {
			let word = &word[0];
			if word.starts_with(|c: char| c.is_ascii_digit()) {
				return word.to_string();
			}
			self.macros.lookup(word).unwrap_or(word).to_string()
		})
		.into_owned()
	}
}

fn required<'a>(operand: &'a str, directive: &'static str) -> std::result::Result<&'a str, ErrorKind> {
	if operand.is_empty() {
		Err(ErrorKind::MissingOperand { directive })
	} else {
		Ok(operand)
	}
}
