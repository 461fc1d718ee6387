use std::path;

use crate::error::ErrorKind;

/// Locates and loads `#include`d files, refusing to re-enter a file that is still being
/// processed.
#[derive(Debug)]
pub struct IncludeResolver {
	search_path: path::PathBuf,
	/// Canonical paths of the files being processed, outermost first.
	in_progress: Vec<path::PathBuf>,
}

impl IncludeResolver {
	pub fn new(search_path: impl Into<path::PathBuf>) -> Self {
		let search_path = search_path.into();
		Self {
			search_path: if search_path.as_os_str().is_empty() {
				path::PathBuf::from(".")
			} else {
				search_path
			},
			in_progress: Vec::new(),
		}
	}

	/// Joins the search path with the file named by the operand of an `#include` line: the text
	/// between double quotes, or the first word when the operand is unquoted. Anything after the
	/// name is ignored.
	pub fn resolve(&self, requested: &str) -> path::PathBuf {
		let name = match requested.strip_prefix('"') {
			Some(quoted) => quoted.split('"').next(),
			None => requested.split_whitespace().next(),
		};
		self.search_path.join(name.unwrap_or_default())
	}

	/// Loads `path` and marks it in progress until the matching [`IncludeResolver::leave`].
	pub fn enter(&mut self, path: &path::Path) -> Result<String, ErrorKind> {
		let file_not_found = |source| ErrorKind::FileNotFound {
			path: path.to_path_buf(),
			source,
		};
		let canonical = ex::fs::canonicalize(path).map_err(file_not_found)?;
		if self.in_progress.contains(&canonical) {
			return Err(ErrorKind::RecursiveInclude {
				path: path.to_path_buf(),
				chain: self.in_progress.clone(),
			});
		}
		let source = ex::fs::read_to_string(&canonical).map_err(file_not_found)?;
		log::debug!("entering {}", path.display());
		self.in_progress.push(canonical);
		Ok(source)
	}

	pub fn leave(&mut self) {
		if let Some(finished) = self.in_progress.pop() {
			log::debug!("leaving {}", finished.display());
		}
	}

	#[cfg(test)]
	fn depth(&self) -> usize {
		self.in_progress.len()
	}
}
