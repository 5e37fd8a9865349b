//! Type annotation parsing.

use cairn_ast::{Authorization, Purity, TypeAnnotation, TypeSyntax};
use cairn_common::numeric::IntegerValue;
use cairn_common::span::Span;

use crate::error::ParseError;
use crate::token::TokenKind;

use super::ParserState;

impl<'a> ParserState<'a> {
    /// Parse a type annotation: optional `@` resource marker plus a type.
    pub(crate) fn parse_type_annotation(&mut self) -> Result<TypeAnnotation, ParseError> {
        if let Some(at) = self.eat(TokenKind::At) {
            let inner = self.parse_type()?;
            return Ok(TypeAnnotation {
                span: at.span.merge(inner.span),
                is_resource: true,
                syntax: inner.syntax,
            });
        }
        self.parse_type()
    }

    fn parse_type(&mut self) -> Result<TypeAnnotation, ParseError> {
        let base = self.parse_type_base()?;
        self.parse_optional_suffixes(base)
    }

    fn parse_optional_suffixes(
        &mut self,
        mut annotation: TypeAnnotation,
    ) -> Result<TypeAnnotation, ParseError> {
        loop {
            if let Some(question) = self.eat(TokenKind::Question) {
                annotation = wrap_optional(annotation, question.span);
            } else if let Some(double) = self.eat(TokenKind::DoubleQuestion) {
                annotation = wrap_optional(annotation, double.span);
                annotation = wrap_optional(annotation, double.span);
            } else {
                return Ok(annotation);
            }
        }
    }

    fn parse_type_base(&mut self) -> Result<TypeAnnotation, ParseError> {
        match self.kind() {
            TokenKind::KwAuth => {
                let auth = self.advance();
                let mut entitlements = Vec::new();
                let mut auth_end = auth.span;
                if self.eat(TokenKind::LeftParen).is_some() {
                    entitlements.push(self.parse_identifier("entitlement")?);
                    while self.eat(TokenKind::Comma).is_some() {
                        entitlements.push(self.parse_identifier("entitlement")?);
                    }
                    auth_end = self.expect(TokenKind::RightParen, "`)`")?.span;
                }
                self.expect(TokenKind::Ampersand, "`&`")?;
                let referenced = self.parse_type()?;
                Ok(TypeAnnotation {
                    span: auth.span.merge(referenced.span),
                    is_resource: false,
                    syntax: TypeSyntax::Reference {
                        authorization: Some(Authorization {
                            span: auth.span.merge(auth_end),
                            entitlements,
                        }),
                        referenced: Box::new(referenced),
                    },
                })
            }
            TokenKind::Ampersand => {
                let amp = self.advance();
                let referenced = self.parse_type()?;
                Ok(TypeAnnotation {
                    span: amp.span.merge(referenced.span),
                    is_resource: false,
                    syntax: TypeSyntax::Reference {
                        authorization: None,
                        referenced: Box::new(referenced),
                    },
                })
            }
            TokenKind::KwView | TokenKind::KwFun => self.parse_function_type(),
            TokenKind::LeftBracket => self.parse_array_type(),
            TokenKind::LeftBrace => self.parse_braced_type(),
            TokenKind::Identifier => self.parse_named_type(),
            _ => Err(self.error_here(format!(
                "expected type, found `{}`",
                self.token_text(self.current())
            ))),
        }
    }

    fn parse_function_type(&mut self) -> Result<TypeAnnotation, ParseError> {
        let start = self.span();
        let purity = if self.eat(TokenKind::KwView).is_some() {
            Purity::View
        } else {
            Purity::Impure
        };
        self.expect(TokenKind::KwFun, "`fun`")?;
        self.expect(TokenKind::LeftParen, "`(`")?;
        let mut parameters = Vec::new();
        while !self.at(TokenKind::RightParen) {
            parameters.push(self.parse_type_annotation()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightParen, "`)`")?;
        self.expect(TokenKind::Colon, "`:`")?;
        let return_type = self.parse_type_annotation()?;
        Ok(TypeAnnotation {
            span: start.merge(return_type.span),
            is_resource: false,
            syntax: TypeSyntax::Function {
                purity,
                parameters,
                return_type: Box::new(return_type),
            },
        })
    }

    /// `[T]` or `[T; N]`.
    fn parse_array_type(&mut self) -> Result<TypeAnnotation, ParseError> {
        let open = self.expect(TokenKind::LeftBracket, "`[`")?;
        let element = self.parse_type_annotation()?;
        let syntax = if self.eat(TokenKind::Semicolon).is_some() {
            let size_token = self.expect(TokenKind::IntegerLiteral, "array size")?;
            let text = size_token.span.slice(self.source);
            let size = IntegerValue::parse(text).ok_or_else(|| {
                ParseError::new(format!("invalid array size `{text}`"), size_token.span)
            })?;
            TypeSyntax::ConstantArray {
                element: Box::new(element),
                size,
            }
        } else {
            TypeSyntax::VariableArray(Box::new(element))
        };
        let close = self.expect(TokenKind::RightBracket, "`]`")?;
        Ok(TypeAnnotation {
            span: open.span.merge(close.span),
            is_resource: false,
            syntax,
        })
    }

    /// `{K: V}` dictionary or `{I1, I2}` restricted set.
    fn parse_braced_type(&mut self) -> Result<TypeAnnotation, ParseError> {
        let open = self.expect(TokenKind::LeftBrace, "`{`")?;

        if let Some(close) = self.eat(TokenKind::RightBrace) {
            return Ok(TypeAnnotation {
                span: open.span.merge(close.span),
                is_resource: false,
                syntax: TypeSyntax::Restricted {
                    base: None,
                    restrictions: Vec::new(),
                },
            });
        }

        let first = self.parse_type_annotation()?;
        if self.eat(TokenKind::Colon).is_some() {
            let value = self.parse_type_annotation()?;
            let close = self.expect(TokenKind::RightBrace, "`}`")?;
            return Ok(TypeAnnotation {
                span: open.span.merge(close.span),
                is_resource: false,
                syntax: TypeSyntax::Dictionary {
                    key: Box::new(first),
                    value: Box::new(value),
                },
            });
        }

        let mut restrictions = vec![first];
        while self.eat(TokenKind::Comma).is_some() {
            restrictions.push(self.parse_type_annotation()?);
        }
        let close = self.expect(TokenKind::RightBrace, "`}`")?;
        Ok(TypeAnnotation {
            span: open.span.merge(close.span),
            is_resource: false,
            syntax: TypeSyntax::Restricted {
                base: None,
                restrictions,
            },
        })
    }

    fn parse_named_type(&mut self) -> Result<TypeAnnotation, ParseError> {
        let first = self.parse_identifier("type name")?;
        let mut path = vec![first];
        while self.at(TokenKind::Dot) {
            self.advance();
            path.push(self.parse_identifier("type name")?);
        }
        let mut span = path[0].span.merge(path[path.len() - 1].span);

        // `Foo<T1, T2>` instantiation.
        let mut annotation = if self.at(TokenKind::Less) && path.len() == 1 {
            self.advance();
            let mut type_arguments = vec![self.parse_type_annotation()?];
            while self.eat(TokenKind::Comma).is_some() {
                type_arguments.push(self.parse_type_annotation()?);
            }
            let close = self.expect(TokenKind::Greater, "`>`")?;
            span = span.merge(close.span);
            let base = path[0].clone();
            TypeAnnotation {
                span,
                is_resource: false,
                syntax: TypeSyntax::Instantiation {
                    base,
                    type_arguments,
                },
            }
        } else {
            TypeAnnotation {
                span,
                is_resource: false,
                syntax: TypeSyntax::Named(path),
            }
        };

        // `T{I1, I2}` restriction: the brace must be adjacent to the base
        // type, otherwise it belongs to a following block (`fun f(): T {`).
        if self.at(TokenKind::LeftBrace) && self.span().start == annotation.span.end {
            self.advance();
            let mut restrictions = Vec::new();
            if !self.at(TokenKind::RightBrace) {
                restrictions.push(self.parse_type_annotation()?);
                while self.eat(TokenKind::Comma).is_some() {
                    restrictions.push(self.parse_type_annotation()?);
                }
            }
            let close = self.expect(TokenKind::RightBrace, "`}`")?;
            annotation = TypeAnnotation {
                span: annotation.span.merge(close.span),
                is_resource: false,
                syntax: TypeSyntax::Restricted {
                    base: Some(Box::new(annotation)),
                    restrictions,
                },
            };
        }

        Ok(annotation)
    }
}

fn wrap_optional(annotation: TypeAnnotation, question_span: Span) -> TypeAnnotation {
    TypeAnnotation {
        span: annotation.span.merge(question_span),
        is_resource: false,
        syntax: TypeSyntax::Optional(Box::new(annotation)),
    }
}
