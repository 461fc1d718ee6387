use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
	/// Activity of the enclosing scope when the frame was pushed.
	parent_active: bool,
	/// Whether lines under the current branch are emitted.
	active: bool,
	/// Whether some branch of this chain has been selected already.
	taken: bool,
}

/// Nested `#if`-family blocks of one source text.
#[derive(Debug, Default)]
pub struct ConditionalStack {
	frames: Vec<Frame>,
}

impl ConditionalStack {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_active(&self) -> bool {
		self.frames.last().map_or(true, |frame| frame.active)
	}

	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	/// Opens a block for `#if`, `#ifdef` or `#ifndef`. `condition` only runs when the enclosing
	/// scope is active.
	pub fn push(
		&mut self,
		condition: impl FnOnce() -> Result<bool, ErrorKind>,
	) -> Result<(), ErrorKind> {
		let parent_active = self.is_active();
		let active = parent_active && condition()?;
		self.frames.push(Frame {
			parent_active,
			active,
			taken: active,
		});
		Ok(())
	}

	/// `condition` only runs when no earlier branch of the chain was taken.
	pub fn elif(
		&mut self,
		condition: impl FnOnce() -> Result<bool, ErrorKind>,
	) -> Result<(), ErrorKind> {
		let frame = self.top("elif")?;
		if !frame.parent_active || frame.taken {
			frame.active = false;
			return Ok(());
		}
		frame.active = condition()?;
		frame.taken = frame.active;
		Ok(())
	}

	pub fn else_branch(&mut self) -> Result<(), ErrorKind> {
		let frame = self.top("else")?;
		frame.active = frame.parent_active && !frame.taken;
		frame.taken |= frame.active;
		Ok(())
	}

	pub fn endif(&mut self) -> Result<(), ErrorKind> {
		self.frames
			.pop()
			.map(|_| ())
			.ok_or(ErrorKind::DanglingElifOrElse { directive: "endif" })
	}

	/// Fails when blocks are still open at end of input.
	pub fn finish(&self) -> Result<(), ErrorKind> {
		match self.depth() {
			0 => Ok(()),
			depth => Err(ErrorKind::UnclosedConditional { depth }),
		}
	}

	fn top(&mut self, directive: &'static str) -> Result<&mut Frame, ErrorKind> {
		self.frames
			.last_mut()
			.ok_or(ErrorKind::DanglingElifOrElse { directive })
	}
}
