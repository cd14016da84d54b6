//! Content-stream parsing: bytes to tokens to instructions.

pub mod instruction;
pub mod lexer;
pub mod operators;

pub use instruction::{Instruction, TextItem, build_instructions};
pub use lexer::{ContentLexer, Token};
pub use operators::{Arity, Opcode};

use crate::error::{RenderError, Result};
use crate::model::objects::{Object, Resolver};
use std::collections::HashMap;

/// Maximum nesting depth for arrays and dictionaries in operands.
const MAX_OPERAND_DEPTH: usize = 64;

/// Parses one decoded content stream into instructions.
///
/// Operands accumulate until a bare operator token arrives, then the
/// instruction builder validates and emits one or more instructions.
/// `BI` switches into the inline-image sub-mode.
pub struct ContentParser<'a> {
    lexer: ContentLexer<'a>,
    resolver: Option<&'a dyn Resolver>,
}

impl<'a> ContentParser<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: ContentLexer::new(data),
            resolver: None,
        }
    }

    pub const fn with_resolver(data: &'a [u8], resolver: &'a dyn Resolver) -> Self {
        Self {
            lexer: ContentLexer::new(data),
            resolver: Some(resolver),
        }
    }

    /// Parse the whole stream.
    ///
    /// Operands left without a trailing operator are a
    /// `DanglingOperands` error.
    pub fn parse_all(&mut self) -> Result<Vec<Instruction>> {
        let mut out = Vec::new();
        let mut operands: Vec<Object> = Vec::new();

        while let Some((pos, token)) = self.lexer.next_token()? {
            match token {
                Token::ArrayStart => operands.push(self.parse_array(1)?),
                Token::DictStart => operands.push(self.parse_dict(1)?),
                Token::ArrayEnd | Token::DictEnd => {
                    return Err(RenderError::Syntax {
                        pos,
                        msg: "unmatched collection terminator".into(),
                    });
                }
                Token::Operator(tok) => {
                    match operators::segment(&tok) {
                        Some(ops) if ops[0] == Opcode::BI => {
                            // Operands before BI belong to nothing; the
                            // image carries key/value attributes instead.
                            operands.clear();
                            out.push(self.parse_inline_image()?);
                            // Glued operators after BI still execute, in
                            // order, as nullary instructions.
                            for op in &ops[1..] {
                                out.push(Instruction::from_operands(*op, Vec::new())?);
                            }
                        }
                        _ => {
                            let args = std::mem::take(&mut operands);
                            out.extend(build_instructions(&tok, args, self.resolver)?);
                        }
                    }
                }
                other => operands.push(scalar_to_object(other)),
            }
        }

        if !operands.is_empty() {
            return Err(RenderError::DanglingOperands(operands.len()));
        }
        Ok(out)
    }

    fn parse_array(&mut self, depth: usize) -> Result<Object> {
        if depth > MAX_OPERAND_DEPTH {
            return Err(RenderError::Syntax {
                pos: self.lexer.pos(),
                msg: "operand nesting too deep".into(),
            });
        }
        let mut items = Vec::new();
        loop {
            match self.lexer.next_token()? {
                None => {
                    return Err(RenderError::Syntax {
                        pos: self.lexer.pos(),
                        msg: "unterminated array".into(),
                    });
                }
                Some((_, Token::ArrayEnd)) => return Ok(Object::Array(items)),
                Some((_, Token::ArrayStart)) => items.push(self.parse_array(depth + 1)?),
                Some((_, Token::DictStart)) => items.push(self.parse_dict(depth + 1)?),
                Some((pos, Token::DictEnd | Token::Operator(_))) => {
                    return Err(RenderError::Syntax {
                        pos,
                        msg: "unexpected token in array".into(),
                    });
                }
                Some((_, tok)) => items.push(scalar_to_object(tok)),
            }
        }
    }

    fn parse_dict(&mut self, depth: usize) -> Result<Object> {
        if depth > MAX_OPERAND_DEPTH {
            return Err(RenderError::Syntax {
                pos: self.lexer.pos(),
                msg: "operand nesting too deep".into(),
            });
        }
        let mut entries = HashMap::new();
        loop {
            let key = match self.lexer.next_token()? {
                None => {
                    return Err(RenderError::Syntax {
                        pos: self.lexer.pos(),
                        msg: "unterminated dictionary".into(),
                    });
                }
                Some((_, Token::DictEnd)) => return Ok(Object::Dict(entries)),
                Some((_, Token::Name(name))) => name,
                Some((pos, _)) => {
                    return Err(RenderError::Syntax {
                        pos,
                        msg: "dictionary key must be a name".into(),
                    });
                }
            };
            let value = match self.lexer.next_token()? {
                None => {
                    return Err(RenderError::Syntax {
                        pos: self.lexer.pos(),
                        msg: "unterminated dictionary".into(),
                    });
                }
                Some((_, Token::ArrayStart)) => self.parse_array(depth + 1)?,
                Some((_, Token::DictStart)) => self.parse_dict(depth + 1)?,
                Some((pos, Token::ArrayEnd | Token::DictEnd | Token::Operator(_))) => {
                    return Err(RenderError::Syntax {
                        pos,
                        msg: "invalid dictionary value".into(),
                    });
                }
                Some((_, tok)) => scalar_to_object(tok),
            };
            entries.insert(key, value);
        }
    }

    /// Parse the inline-image sub-mode after a `BI` token.
    ///
    /// Key/value pairs are read until a whitespace-delimited `ID`, then
    /// raw bytes are captured up to the first delimited `EI`.
    fn parse_inline_image(&mut self) -> Result<Instruction> {
        let mut attributes = HashMap::new();
        loop {
            let key = match self.lexer.next_token()? {
                None => {
                    return Err(RenderError::Syntax {
                        pos: self.lexer.pos(),
                        msg: "unterminated inline image dictionary".into(),
                    });
                }
                Some((_, Token::Operator(tok))) if tok == b"ID" => break,
                Some((_, Token::Name(name))) => name,
                Some((pos, _)) => {
                    return Err(RenderError::Syntax {
                        pos,
                        msg: "inline image key must be a name".into(),
                    });
                }
            };
            let value = match self.lexer.next_token()? {
                None => {
                    return Err(RenderError::Syntax {
                        pos: self.lexer.pos(),
                        msg: "unterminated inline image dictionary".into(),
                    });
                }
                Some((_, Token::ArrayStart)) => self.parse_array(1)?,
                Some((_, Token::DictStart)) => self.parse_dict(1)?,
                Some((pos, Token::ArrayEnd | Token::DictEnd | Token::Operator(_))) => {
                    return Err(RenderError::Syntax {
                        pos,
                        msg: "invalid inline image value".into(),
                    });
                }
                Some((_, tok)) => scalar_to_object(tok),
            };
            attributes.insert(key, value);
        }

        let data = self.lexer.read_raw_until(b"EI");
        Ok(Instruction::InlineImage { attributes, data })
    }
}

fn scalar_to_object(token: Token) -> Object {
    match token {
        Token::Int(n) => Object::Int(n),
        Token::Real(n) => Object::Real(n),
        Token::Bool(b) => Object::Bool(b),
        Token::Null => Object::Null,
        Token::Name(name) => Object::Name(name),
        Token::String(s) => Object::String(s),
        // Collection and operator tokens are handled by the callers.
        Token::ArrayStart
        | Token::ArrayEnd
        | Token::DictStart
        | Token::DictEnd
        | Token::Operator(_) => Object::Null,
    }
}

/// Parse a full content stream into instructions.
pub fn parse_instructions(data: &[u8], resolver: Option<&dyn Resolver>) -> Result<Vec<Instruction>> {
    match resolver {
        Some(r) => ContentParser::with_resolver(data, r).parse_all(),
        None => ContentParser::new(data).parse_all(),
    }
}
