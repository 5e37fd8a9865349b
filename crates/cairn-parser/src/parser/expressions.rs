//! Expression parsing: precedence climbing with speculative parsing for
//! generic argument lists.

use cairn_ast::{Argument, BinaryOp, CastOp, Expression, ExpressionKind, Purity, UnaryOp};
use cairn_common::numeric::{FixedPointValue, IntegerValue};
use cairn_common::span::Span;

use crate::error::ParseError;
use crate::token::TokenKind;

use super::ParserState;

impl<'a> ParserState<'a> {
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_ternary()
    }

    fn make(&mut self, span: Span, kind: ExpressionKind) -> Expression {
        Expression {
            id: self.next_id(),
            span,
            kind,
        }
    }

    /// `c ? t : e` (right associative, lowest precedence).
    fn parse_ternary(&mut self) -> Result<Expression, ParseError> {
        let test = self.parse_nil_coalesce()?;
        if self.eat(TokenKind::Question).is_none() {
            return Ok(test);
        }
        let then_expr = self.parse_ternary()?;
        self.expect(TokenKind::Colon, "`:`")?;
        let else_expr = self.parse_ternary()?;
        let span = test.span.merge(else_expr.span);
        Ok(self.make(
            span,
            ExpressionKind::Ternary {
                test: Box::new(test),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
        ))
    }

    /// `a ?? b` (right associative).
    fn parse_nil_coalesce(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_logical_or()?;
        if self.eat(TokenKind::DoubleQuestion).is_none() {
            return Ok(left);
        }
        let right = self.parse_nil_coalesce()?;
        let span = left.span.merge(right.span);
        Ok(self.make(
            span,
            ExpressionKind::Binary {
                op: BinaryOp::NilCoalesce,
                left: Box::new(left),
                right: Box::new(right),
            },
        ))
    }

    fn parse_logical_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.eat(TokenKind::DoubleVerticalBar).is_some() {
            let right = self.parse_logical_and()?;
            let span = left.span.merge(right.span);
            left = self.make(
                span,
                ExpressionKind::Binary {
                    op: BinaryOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_equality()?;
        while self.eat(TokenKind::DoubleAmpersand).is_some() {
            let right = self.parse_equality()?;
            let span = left.span.merge(right.span);
            left = self.make(
                span,
                ExpressionKind::Binary {
                    op: BinaryOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqualEqual => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            let span = left.span.merge(right.span);
            left = self.make(
                span,
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            let span = left.span.merge(right.span);
            left = self.make(
                span,
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Plus,
                TokenKind::Minus => BinaryOp::Minus,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = left.span.merge(right.span);
            left = self.make(
                span,
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_cast()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_cast()?;
            let span = left.span.merge(right.span);
            left = self.make(
                span,
                ExpressionKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
        }
        Ok(left)
    }

    /// `e as T`, `e as? T`, `e as! T`. The `?`/`!` must be adjacent to the
    /// `as` keyword to distinguish `x as? T` from a following ternary.
    fn parse_cast(&mut self) -> Result<Expression, ParseError> {
        let mut value = self.parse_unary()?;
        while self.at(TokenKind::KwAs) {
            let as_token = self.advance();
            let op = if self.at(TokenKind::Question)
                && self.span().start == as_token.span.end
            {
                self.advance();
                CastOp::Failable
            } else if self.at(TokenKind::Exclamation) && self.span().start == as_token.span.end {
                self.advance();
                CastOp::Forced
            } else {
                CastOp::Static
            };
            let type_annotation = self.parse_type_annotation()?;
            let span = value.span.merge(type_annotation.span);
            value = self.make(
                span,
                ExpressionKind::Casting {
                    value: Box::new(value),
                    op,
                    type_annotation,
                },
            );
        }
        Ok(value)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        match self.kind() {
            TokenKind::Minus => {
                let token = self.advance();
                let value = self.parse_unary()?;
                let span = token.span.merge(value.span);
                Ok(self.make(
                    span,
                    ExpressionKind::Unary {
                        op: UnaryOp::Minus,
                        value: Box::new(value),
                    },
                ))
            }
            TokenKind::Exclamation => {
                let token = self.advance();
                let value = self.parse_unary()?;
                let span = token.span.merge(value.span);
                Ok(self.make(
                    span,
                    ExpressionKind::Unary {
                        op: UnaryOp::Not,
                        value: Box::new(value),
                    },
                ))
            }
            TokenKind::LeftArrow => {
                let token = self.advance();
                let value = self.parse_unary()?;
                let span = token.span.merge(value.span);
                Ok(self.make(
                    span,
                    ExpressionKind::Unary {
                        op: UnaryOp::Move,
                        value: Box::new(value),
                    },
                ))
            }
            TokenKind::Ampersand => {
                // `&target as &T` - the cast is part of the reference
                // expression.
                let token = self.advance();
                let value = self.parse_unary()?;
                self.expect(TokenKind::KwAs, "`as`")?;
                let type_annotation = self.parse_type_annotation()?;
                let span = token.span.merge(type_annotation.span);
                Ok(self.make(
                    span,
                    ExpressionKind::Reference {
                        value: Box::new(value),
                        type_annotation,
                    },
                ))
            }
            TokenKind::KwCreate => {
                let token = self.advance();
                let invocation = self.parse_postfix()?;
                let span = token.span.merge(invocation.span);
                Ok(self.make(
                    span,
                    ExpressionKind::Create {
                        invocation: Box::new(invocation),
                    },
                ))
            }
            TokenKind::KwDestroy => {
                let token = self.advance();
                let value = self.parse_unary()?;
                let span = token.span.merge(value.span);
                Ok(self.make(
                    span,
                    ExpressionKind::Destroy {
                        value: Box::new(value),
                    },
                ))
            }
            TokenKind::KwView | TokenKind::KwFun => self.parse_function_expression(),
            _ => self.parse_postfix(),
        }
    }

    fn parse_function_expression(&mut self) -> Result<Expression, ParseError> {
        let start = self.span();
        let purity = if self.eat(TokenKind::KwView).is_some() {
            Purity::View
        } else {
            Purity::Impure
        };
        self.expect(TokenKind::KwFun, "`fun`")?;
        let parameters = self.parse_parameter_list()?;
        let return_type = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(self.make(
            span,
            ExpressionKind::Function {
                purity,
                parameters,
                return_type,
                body,
            },
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_primary()?;
        loop {
            match self.kind() {
                TokenKind::Dot | TokenKind::QuestionDot => {
                    let optional = self.at(TokenKind::QuestionDot);
                    self.advance();
                    let name = self.parse_identifier("member name")?;
                    let span = expression.span.merge(name.span);
                    expression = self.make(
                        span,
                        ExpressionKind::Member {
                            target: Box::new(expression),
                            optional,
                            name,
                        },
                    );
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let close = self.expect(TokenKind::RightBracket, "`]`")?;
                    let span = expression.span.merge(close.span);
                    expression = self.make(
                        span,
                        ExpressionKind::Index {
                            target: Box::new(expression),
                            index: Box::new(index),
                        },
                    );
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    let close_span = self.tokens[self.pos - 1].span;
                    let span = expression.span.merge(close_span);
                    expression = self.make(
                        span,
                        ExpressionKind::Invocation {
                            target: Box::new(expression),
                            type_arguments: Vec::new(),
                            arguments,
                        },
                    );
                }
                TokenKind::Less => {
                    // Speculative: `f<T>(...)` vs comparison. Try a type
                    // argument list followed by `(`; otherwise leave the
                    // `<` for the comparison level.
                    let checkpoint = self.checkpoint();
                    match self.try_parse_type_arguments() {
                        Ok(type_arguments) if self.at(TokenKind::LeftParen) => {
                            let arguments = self.parse_arguments()?;
                            let close_span = self.tokens[self.pos - 1].span;
                            let span = expression.span.merge(close_span);
                            expression = self.make(
                                span,
                                ExpressionKind::Invocation {
                                    target: Box::new(expression),
                                    type_arguments,
                                    arguments,
                                },
                            );
                        }
                        _ => {
                            self.rollback(checkpoint);
                            break;
                        }
                    }
                }
                TokenKind::Exclamation => {
                    let token = self.advance();
                    let span = expression.span.merge(token.span);
                    expression = self.make(
                        span,
                        ExpressionKind::ForceUnwrap {
                            value: Box::new(expression),
                        },
                    );
                }
                _ => break,
            }
        }
        Ok(expression)
    }

    fn try_parse_type_arguments(
        &mut self,
    ) -> Result<Vec<cairn_ast::TypeAnnotation>, ParseError> {
        self.expect(TokenKind::Less, "`<`")?;
        let mut type_arguments = Vec::new();
        if !self.at(TokenKind::Greater) {
            type_arguments.push(self.parse_type_annotation()?);
            while self.eat(TokenKind::Comma).is_some() {
                type_arguments.push(self.parse_type_annotation()?);
            }
        }
        self.expect(TokenKind::Greater, "`>`")?;
        Ok(type_arguments)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Argument>, ParseError> {
        self.expect(TokenKind::LeftParen, "`(`")?;
        let mut arguments = Vec::new();
        while !self.at(TokenKind::RightParen) {
            // `from` is a keyword but a common argument label.
            let label_ahead = (self.at(TokenKind::Identifier) || self.at(TokenKind::KwFrom))
                && self.peek_kind(1) == TokenKind::Colon;
            let label = if label_ahead {
                let token = self.advance();
                let label =
                    cairn_ast::Identifier::new(token.span.slice(self.source), token.span);
                self.expect(TokenKind::Colon, "`:`")?;
                Some(label)
            } else {
                None
            };
            let value = self.parse_expression()?;
            let start = label.as_ref().map_or(value.span, |l| l.span);
            arguments.push(Argument {
                span: start.merge(value.span),
                label,
                value,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightParen, "`)`")?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        match self.kind() {
            TokenKind::Identifier => {
                let identifier = self.parse_identifier("expression")?;
                let span = identifier.span;
                Ok(self.make(span, ExpressionKind::Identifier(identifier)))
            }
            TokenKind::IntegerLiteral => {
                let token = self.advance();
                let text = token.span.slice(self.source);
                let value = IntegerValue::parse(text).ok_or_else(|| {
                    ParseError::new(format!("invalid integer literal `{text}`"), token.span)
                })?;
                Ok(self.make(token.span, ExpressionKind::IntegerLiteral(value)))
            }
            TokenKind::FixedPointLiteral => {
                let token = self.advance();
                let text = token.span.slice(self.source);
                let value = FixedPointValue::parse(text).ok_or_else(|| {
                    ParseError::new(format!("invalid fixed-point literal `{text}`"), token.span)
                })?;
                Ok(self.make(token.span, ExpressionKind::FixedPointLiteral(value)))
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                let value = token.string_value.clone().unwrap_or_default();
                Ok(self.make(token.span, ExpressionKind::StringLiteral(value)))
            }
            TokenKind::KwTrue => {
                let token = self.advance();
                Ok(self.make(token.span, ExpressionKind::BoolLiteral(true)))
            }
            TokenKind::KwFalse => {
                let token = self.advance();
                Ok(self.make(token.span, ExpressionKind::BoolLiteral(false)))
            }
            TokenKind::KwNil => {
                let token = self.advance();
                Ok(self.make(token.span, ExpressionKind::NilLiteral))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "`)`")?;
                Ok(expression)
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_dictionary_literal(),
            TokenKind::Slash => self.parse_path_literal(),
            _ => Err(self.error_here(format!(
                "expected expression, found `{}`",
                self.token_text(self.current())
            ))),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expression, ParseError> {
        let open = self.expect(TokenKind::LeftBracket, "`[`")?;
        let mut elements = Vec::new();
        while !self.at(TokenKind::RightBracket) {
            elements.push(self.parse_expression()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RightBracket, "`]`")?;
        Ok(self.make(
            open.span.merge(close.span),
            ExpressionKind::ArrayLiteral(elements),
        ))
    }

    fn parse_dictionary_literal(&mut self) -> Result<Expression, ParseError> {
        let open = self.expect(TokenKind::LeftBrace, "`{`")?;
        let mut entries = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            let key = self.parse_expression()?;
            self.expect(TokenKind::Colon, "`:`")?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RightBrace, "`}`")?;
        Ok(self.make(
            open.span.merge(close.span),
            ExpressionKind::DictionaryLiteral(entries),
        ))
    }

    fn parse_path_literal(&mut self) -> Result<Expression, ParseError> {
        let slash = self.expect(TokenKind::Slash, "`/`")?;
        let domain = self.parse_identifier("path domain")?;
        self.expect(TokenKind::Slash, "`/`")?;
        let identifier = self.parse_identifier("path identifier")?;
        let span = slash.span.merge(identifier.span);
        Ok(self.make(
            span,
            ExpressionKind::PathLiteral { domain, identifier },
        ))
    }
}
