//! Integer expressions of `#if` and `#elif`.

use crate::{error::ErrorKind, macros::MacroTable};

/// Two-character operators, matched before the single-character ones.
const TWO_CHAR_OPERATORS: [&str; 8] = ["==", "!=", "<=", ">=", "&&", "||", "<<", ">>"];
const ONE_CHAR_OPERATORS: [&str; 8] = ["+", "-", "*", "/", "%", "<", ">", "!"];

/// Binary operators from lowest to highest precedence. All are left-associative.
const BINARY_LEVELS: [&[&str]; 7] = [
	&["||"],
	&["&&"],
	&["==", "!="],
	&["<", ">", "<=", ">="],
	&["<<", ">>"],
	&["+", "-"],
	&["*", "/", "%"],
];

/// Parentheses and unary prefixes allowed around a single operand.
const MAX_NESTING: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
	Number(&'a str),
	Ident(&'a str),
	Op(&'static str),
	LParen,
	RParen,
	/// End of input, or a character the lexer does not recognize.
	End,
}

/// Splits one expression into [`Token`]s.
pub struct Lexer<'a> {
	source: &'a str,
	position: usize,
}

impl<'a> Lexer<'a> {
	pub fn new(source: &'a str) -> Self {
		Self {
			source,
			position: 0,
		}
	}

	pub fn next_token(&mut self) -> Token<'a> {
		let bytes = self.source.as_bytes();
		while self.position < bytes.len() && bytes[self.position].is_ascii_whitespace() {
			self.position += 1;
		}
		let Some(&first) = bytes.get(self.position) else {
			return Token::End;
		};

		if first.is_ascii_digit() {
			return Token::Number(self.take_while(|b| b.is_ascii_digit()));
		}
		if first.is_ascii_alphabetic() || first == b'_' {
			return Token::Ident(self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_'));
		}
		match first {
			b'(' => {
				self.position += 1;
				return Token::LParen;
			}
			b')' => {
				self.position += 1;
				return Token::RParen;
			}
			_ => {}
		}

		let rest = &self.source[self.position..];
		let operator = TWO_CHAR_OPERATORS
			.iter()
			.chain(ONE_CHAR_OPERATORS.iter())
			.find(|operator| rest.starts_with(**operator));
		match operator {
			Some(operator) => {
				self.position += operator.len();
				Token::Op(*operator)
			}
			None => {
				// Unrecognized input ends the stream.
				self.position = bytes.len();
				Token::End
			}
		}
	}

	fn take_while(&mut self, predicate: impl Fn(u8) -> bool) -> &'a str {
		let start = self.position;
		let bytes = self.source.as_bytes();
		while self.position < bytes.len() && predicate(bytes[self.position]) {
			self.position += 1;
		}
		&self.source[start..self.position]
	}
}

/// Evaluates `expression` against `macros`. Comparisons and logical operators yield 0 or 1.
///
/// Both operands of `&&` and `||` are always evaluated. Division and modulo by zero yield 0.
/// An identifier that is not defined evaluates to 0, a flag macro to 1, and any other macro to
/// the integer its value starts with (`64u` reads as 64).
pub fn evaluate(expression: &str, macros: &MacroTable) -> Result<i64, ErrorKind> {
	let mut evaluator = Evaluator::new(expression, macros);
	let value = evaluator.binary(0)?;
	if evaluator.token == Token::RParen {
		return Err(evaluator.malformed("unmatched `)`"));
	}
	Ok(value)
}

struct Evaluator<'a> {
	expression: &'a str,
	lexer: Lexer<'a>,
	token: Token<'a>,
	macros: &'a MacroTable,
	nesting: usize,
}

impl<'a> Evaluator<'a> {
	fn new(expression: &'a str, macros: &'a MacroTable) -> Self {
		let mut lexer = Lexer::new(expression);
		let token = lexer.next_token();
		Self {
			expression,
			lexer,
			token,
			macros,
			nesting: 0,
		}
	}

	fn advance(&mut self) {
		self.token = self.lexer.next_token();
	}

	fn accept_operator(&mut self, operators: &[&str]) -> Option<&'static str> {
		match self.token {
			Token::Op(operator) if operators.contains(&operator) => {
				self.advance();
				Some(operator)
			}
			_ => None,
		}
	}

	fn malformed(&self, reason: impl Into<String>) -> ErrorKind {
		ErrorKind::MalformedExpression {
			expression: self.expression.to_string(),
			reason: reason.into(),
		}
	}

	fn nested(
		&mut self,
		parse: impl FnOnce(&mut Self) -> Result<i64, ErrorKind>,
	) -> Result<i64, ErrorKind> {
		if self.nesting == MAX_NESTING {
			return Err(self.malformed("expression nested too deeply"));
		}
		self.nesting += 1;
		let value = parse(self);
		self.nesting -= 1;
		value
	}

	fn binary(&mut self, level: usize) -> Result<i64, ErrorKind> {
		let Some(operators) = BINARY_LEVELS.get(level) else {
			return self.unary();
		};
		let mut value = self.binary(level + 1)?;
		while let Some(operator) = self.accept_operator(operators) {
			let rhs = self.binary(level + 1)?;
			value = apply_binary(operator, value, rhs);
		}
		Ok(value)
	}

	fn unary(&mut self) -> Result<i64, ErrorKind> {
		match self.accept_operator(&["!", "-", "+"]) {
			Some("!") => Ok((self.nested(Self::unary)? == 0) as i64),
			Some("-") => Ok(self.nested(Self::unary)?.wrapping_neg()),
			Some(_) => self.nested(Self::unary),
			None => self.primary(),
		}
	}

	fn primary(&mut self) -> Result<i64, ErrorKind> {
		match self.token {
			Token::LParen => {
				self.advance();
				let value = self.nested(|evaluator| evaluator.binary(0))?;
				if self.token != Token::RParen {
					return Err(self.malformed("missing `)`"));
				}
				self.advance();
				Ok(value)
			}
			Token::Number(literal) => {
				let value = literal
					.parse::<i64>()
					.map_err(|_| self.malformed(format!("integer literal `{literal}` is out of range")))?;
				self.advance();
				Ok(value)
			}
			Token::Ident("defined") => {
				self.advance();
				let name = if self.token == Token::LParen {
					self.advance();
					let Token::Ident(name) = self.token else {
						return Err(self.malformed("expected identifier in `defined(...)`"));
					};
					self.advance();
					if self.token != Token::RParen {
						return Err(self.malformed("missing `)` in `defined(...)`"));
					}
					name
				} else {
					let Token::Ident(name) = self.token else {
						return Err(self.malformed("expected identifier after `defined`"));
					};
					name
				};
				self.advance();
				Ok(self.macros.defined(name) as i64)
			}
			Token::Ident(name) => {
				self.advance();
				match self.macros.lookup(name) {
					None => Ok(0),
					Some("") => Ok(1),
					Some(value) => match integer_prefix(value) {
						"" => Err(self.malformed(format!(
							"macro `{name}` has non-integer value `{value}`"
						))),
						digits => digits.parse::<i64>().map_err(|_| {
							self.malformed(format!("macro `{name}` value `{value}` is out of range"))
						}),
					},
				}
			}
			// A missing operand reads as 0.
			Token::Op(_) | Token::RParen | Token::End => Ok(0),
		}
	}
}

/// The optionally signed run of digits `value` starts with, after leading whitespace. Empty when
/// there are no digits.
fn integer_prefix(value: &str) -> &str {
	let value = value.trim_start();
	let sign = value.starts_with(['+', '-']) as usize;
	match value[sign..].bytes().take_while(u8::is_ascii_digit).count() {
		0 => "",
		digits => &value[..sign + digits],
	}
}

fn apply_binary(operator: &str, lhs: i64, rhs: i64) -> i64 {
	match operator {
		"||" => (lhs != 0 || rhs != 0) as i64,
		"&&" => (lhs != 0 && rhs != 0) as i64,
		"==" => (lhs == rhs) as i64,
		"!=" => (lhs != rhs) as i64,
		"<" => (lhs < rhs) as i64,
		">" => (lhs > rhs) as i64,
		"<=" => (lhs <= rhs) as i64,
		">=" => (lhs >= rhs) as i64,
		"<<" => shift(lhs, rhs, i64::checked_shl),
		">>" => shift(lhs, rhs, i64::checked_shr),
		"+" => lhs.wrapping_add(rhs),
		"-" => lhs.wrapping_sub(rhs),
		"*" => lhs.wrapping_mul(rhs),
		"/" if rhs == 0 => 0,
		"/" => lhs.wrapping_div(rhs),
		"%" if rhs == 0 => 0,
		"%" => lhs.wrapping_rem(rhs),
		_ => unreachable!("`{operator}` is not a binary operator"),
	}
}

/// Shifts by a negative amount or by the bit width or more yield 0.
fn shift(lhs: i64, rhs: i64, op: fn(i64, u32) -> Option<i64>) -> i64 {
	u32::try_from(rhs)
		.ok()
		.and_then(|amount| op(lhs, amount))
		.unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::{evaluate, Lexer, Token};
	use crate::{
		macros::{MacroTable, Precedence},
		ErrorKind,
	};

	fn tokens(source: &str) -> Vec<Token<'_>> {
		let mut lexer = Lexer::new(source);
		let mut tokens = Vec::new();
		loop {
			let token = lexer.next_token();
			tokens.push(token);
			if token == Token::End {
				return tokens;
			}
		}
	}

	fn eval(expression: &str) -> i64 {
		evaluate(expression, &MacroTable::new()).unwrap()
	}

	fn eval_with(expression: &str, definitions: &[(&str, &str)]) -> Result<i64, ErrorKind> {
		let mut macros = MacroTable::new();
		for (name, value) in definitions {
			macros.define(*name, *value, Precedence::FileDefine);
		}
		evaluate(expression, &macros)
	}

	#[test]
	fn lex_operators_greedily() {
		assert_eq!(
			tokens("a<=b<<2 != !c"),
			vec![
				Token::Ident("a"),
				Token::Op("<="),
				Token::Ident("b"),
				Token::Op("<<"),
				Token::Number("2"),
				Token::Op("!="),
				Token::Op("!"),
				Token::Ident("c"),
				Token::End
			]
		);
	}

	#[test]
	fn lex_stops_at_unrecognized_character() {
		assert_eq!(
			tokens(" (12) @ 3"),
			vec![Token::LParen, Token::Number("12"), Token::RParen, Token::End]
		);
		assert_eq!(tokens("   "), vec![Token::End]);
	}

	#[test]
	fn precedence_and_associativity() {
		assert_eq!(eval("1 + 2 * 3"), 7);
		assert_eq!(eval("(1 + 2) * 3"), 9);
		assert_eq!(eval("10 - 4 - 3"), 3);
		assert_eq!(eval("1 << 2 + 1"), 8);
		assert_eq!(eval("1 || 0 && 0"), 1);
		assert_eq!(eval("2 < 3 == 1"), 1);
		assert_eq!(eval("-3 * -2"), 6);
		assert_eq!(eval("!0 + +4"), 5);
		assert_eq!(eval("!!7"), 1);
	}

	#[test]
	fn division_by_zero_is_zero() {
		assert_eq!(eval("1/0"), 0);
		assert_eq!(eval("1%0"), 0);
		assert_eq!(eval("7 % 4 + 9 / 2"), 7);
	}

	#[test]
	fn out_of_range_shifts_are_zero() {
		assert_eq!(eval("1 << 64"), 0);
		assert_eq!(eval("8 >> -1"), 0);
		assert_eq!(eval("-8 >> 1"), -4);
	}

	#[test]
	fn identifiers() {
		assert_eq!(eval("UNSET"), 0);
		assert_eq!(eval("UNSET == 0"), 1);
		assert_eq!(eval_with("FLAG", &[("FLAG", "")]).unwrap(), 1);
		assert_eq!(eval_with("N * 2 == 8", &[("N", "4")]).unwrap(), 1);
		assert_eq!(eval_with("N + 1", &[("N", " -3 ")]).unwrap(), -2);
	}

	#[test]
	fn macro_values_read_their_leading_integer() {
		assert_eq!(eval_with("SIZE > 32", &[("SIZE", "64u")]).unwrap(), 1);
		assert_eq!(eval_with("SIZE", &[("SIZE", "+7i // seven")]).unwrap(), 7);
		assert_eq!(eval_with("SIZE", &[("SIZE", "-2.5")]).unwrap(), -2);
		for value in ["vec4<u32>", "u64", "-", "- 3", "99999999999999999999u"] {
			assert!(
				matches!(
					eval_with("SIZE", &[("SIZE", value)]),
					Err(ErrorKind::MalformedExpression { .. })
				),
				"{value}"
			);
		}
	}

	#[test]
	fn defined_forms() {
		let defs = [("HAS_ALPHA", "1")];
		assert_eq!(eval_with("defined(HAS_ALPHA)", &defs).unwrap(), 1);
		assert_eq!(eval_with("defined ( HAS_ALPHA )", &defs).unwrap(), 1);
		assert_eq!(eval_with("defined HAS_ALPHA", &defs).unwrap(), 1);
		assert_eq!(eval_with("defined(UNSET)", &defs).unwrap(), 0);
		assert_eq!(eval_with("!defined UNSET && defined(HAS_ALPHA)", &defs).unwrap(), 1);
	}

	#[test]
	fn logical_operators_evaluate_both_sides() {
		assert!(matches!(
			eval_with("1 || BAD", &[("BAD", "vec4<u32>")]),
			Err(ErrorKind::MalformedExpression { .. })
		));
		assert!(matches!(
			eval_with("0 && BAD", &[("BAD", "vec4<u32>")]),
			Err(ErrorKind::MalformedExpression { .. })
		));
	}

	#[test]
	fn malformed_expressions() {
		let table = MacroTable::new();
		for expression in ["(1 + 2", "1)", "defined(", "defined 3", "defined(X", "99999999999999999999"] {
			assert!(
				matches!(
					evaluate(expression, &table),
					Err(ErrorKind::MalformedExpression { .. })
				),
				"{expression}"
			);
		}
	}

	#[test]
	fn nesting_limit() {
		let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
		assert_eq!(eval(&nested(100)), 1);
		assert_eq!(eval(&format!("{}1", "!".repeat(100))), 1);
		assert_eq!(eval(&format!("{}5", "- ".repeat(101))), -5);

		let table = MacroTable::new();
		for expression in [
			nested(5000),
			format!("{}1", "!".repeat(100_000)),
			format!("{}1", "-(".repeat(1000)),
		] {
			match evaluate(&expression, &table) {
				Err(ErrorKind::MalformedExpression { reason, .. }) => {
					assert_eq!(reason, "expression nested too deeply")
				}
				other => panic!("expected MalformedExpression, got {other:?}"),
			}
		}
	}

	#[test]
	fn missing_operands_read_as_zero() {
		assert_eq!(eval(""), 0);
		assert_eq!(eval("1 +"), 1);
		assert_eq!(eval("3 @ 4"), 3);
	}
}
