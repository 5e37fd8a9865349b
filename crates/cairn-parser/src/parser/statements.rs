//! Statement and block parsing.

use cairn_ast::{
    Access, AssignmentStatement, Block, EmitStatement, ForInStatement, IfStatement, IfTest,
    ReturnStatement, Statement, SwapStatement, Transfer, VariableDeclaration, VariableKind,
    WhileStatement,
};

use crate::error::ParseError;
use crate::token::TokenKind;

use super::ParserState;

impl<'a> ParserState<'a> {
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(TokenKind::LeftBrace, "`{`")?;
        let mut statements = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        let close = self.expect(TokenKind::RightBrace, "`}`")?;
        Ok(Block {
            span: open.span.merge(close.span),
            statements,
        })
    }

    pub(crate) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.kind() {
            TokenKind::KwLet | TokenKind::KwVar => {
                let declaration = self.parse_variable_declaration(Access::NotSpecified)?;
                Ok(Statement::Variable(Box::new(declaration)))
            }
            TokenKind::KwIf => self.parse_if_statement(),
            TokenKind::KwWhile => self.parse_while_statement(),
            TokenKind::KwFor => self.parse_for_statement(),
            TokenKind::KwReturn => self.parse_return_statement(),
            TokenKind::KwBreak => {
                let token = self.advance();
                Ok(Statement::Break {
                    id: self.next_id(),
                    span: token.span,
                })
            }
            TokenKind::KwContinue => {
                let token = self.advance();
                Ok(Statement::Continue {
                    id: self.next_id(),
                    span: token.span,
                })
            }
            TokenKind::KwEmit => {
                let keyword = self.advance();
                let id = self.next_id();
                let invocation = self.parse_expression()?;
                Ok(Statement::Emit(EmitStatement {
                    id,
                    span: keyword.span.merge(invocation.span),
                    invocation,
                }))
            }
            _ => self.parse_expression_like_statement(),
        }
    }

    /// `let`/`var` declaration, including the second-value transfer form
    /// `let z <- y <- x`.
    pub(crate) fn parse_variable_declaration(
        &mut self,
        access: Access,
    ) -> Result<VariableDeclaration, ParseError> {
        let kind = if self.at(TokenKind::KwLet) {
            VariableKind::Let
        } else {
            VariableKind::Var
        };
        let keyword = self.advance();
        let id = self.next_id();
        let identifier = self.parse_identifier("variable name")?;

        let type_annotation = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };

        let (transfer, transfer_span) = self.parse_transfer()?;
        let value = self.parse_expression()?;

        let mut second_transfer = None;
        let mut second_transfer_span = None;
        let mut second_value = None;
        if self.at(TokenKind::LeftArrow) || self.at(TokenKind::Equal) {
            let (transfer, span) = self.parse_transfer()?;
            second_transfer = Some(transfer);
            second_transfer_span = Some(span);
            second_value = Some(self.parse_expression()?);
        }

        let end = second_value
            .as_ref()
            .map_or(value.span, |expr| expr.span);

        Ok(VariableDeclaration {
            id,
            span: keyword.span.merge(end),
            access,
            kind,
            identifier,
            type_annotation,
            transfer,
            transfer_span,
            value,
            second_transfer,
            second_transfer_span,
            second_value,
        })
    }

    fn parse_transfer(&mut self) -> Result<(Transfer, cairn_common::span::Span), ParseError> {
        if let Some(token) = self.eat(TokenKind::Equal) {
            Ok((Transfer::Copy, token.span))
        } else if let Some(token) = self.eat(TokenKind::LeftArrow) {
            Ok((Transfer::Move, token.span))
        } else {
            Err(self.error_here("expected `=` or `<-`"))
        }
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::KwIf, "`if`")?;
        let id = self.next_id();

        let test = if self.at(TokenKind::KwLet) || self.at(TokenKind::KwVar) {
            let kind = if self.at(TokenKind::KwLet) {
                VariableKind::Let
            } else {
                VariableKind::Var
            };
            self.advance();
            let identifier = self.parse_identifier("binding name")?;
            let type_annotation = if self.eat(TokenKind::Colon).is_some() {
                Some(self.parse_type_annotation()?)
            } else {
                None
            };
            self.expect(TokenKind::Equal, "`=`")?;
            let value = self.parse_expression()?;
            IfTest::Binding {
                kind,
                identifier,
                type_annotation,
                value,
            }
        } else {
            IfTest::Condition(self.parse_expression()?)
        };

        let then_block = self.parse_block()?;

        let else_block = if self.eat(TokenKind::KwElse).is_some() {
            if self.at(TokenKind::KwIf) {
                // `else if` desugars to an else block holding the nested if.
                let nested = self.parse_if_statement()?;
                let span = nested.span();
                Some(Block {
                    span,
                    statements: vec![nested],
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        let end = else_block
            .as_ref()
            .map_or(then_block.span, |block| block.span);

        Ok(Statement::If(Box::new(IfStatement {
            id,
            span: keyword.span.merge(end),
            test,
            then_block,
            else_block,
        })))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::KwWhile, "`while`")?;
        let id = self.next_id();
        let test = self.parse_expression()?;
        let block = self.parse_block()?;
        Ok(Statement::While(Box::new(WhileStatement {
            id,
            span: keyword.span.merge(block.span),
            test,
            block,
        })))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::KwFor, "`for`")?;
        let id = self.next_id();
        let first = self.parse_identifier("loop variable")?;
        let (index, identifier) = if self.eat(TokenKind::Comma).is_some() {
            let value = self.parse_identifier("loop variable")?;
            (Some(first), value)
        } else {
            (None, first)
        };
        self.expect(TokenKind::KwIn, "`in`")?;
        let iterand = self.parse_expression()?;
        let block = self.parse_block()?;
        Ok(Statement::ForIn(Box::new(ForInStatement {
            id,
            span: keyword.span.merge(block.span),
            index,
            identifier,
            iterand,
            block,
        })))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::KwReturn, "`return`")?;
        let id = self.next_id();
        let expression = if self.can_start_expression() {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let end = expression.as_ref().map_or(keyword.span, |e| e.span);
        Ok(Statement::Return(ReturnStatement {
            id,
            span: keyword.span.merge(end),
            expression,
        }))
    }

    fn can_start_expression(&self) -> bool {
        !matches!(
            self.kind(),
            TokenKind::RightBrace
                | TokenKind::Eof
                | TokenKind::KwLet
                | TokenKind::KwVar
                | TokenKind::KwIf
                | TokenKind::KwWhile
                | TokenKind::KwFor
                | TokenKind::KwReturn
                | TokenKind::KwBreak
                | TokenKind::KwContinue
                | TokenKind::KwEmit
        )
    }

    /// An expression statement, or an assignment/swap if a transfer
    /// operator follows the parsed expression.
    fn parse_expression_like_statement(&mut self) -> Result<Statement, ParseError> {
        let expression = self.parse_expression()?;

        match self.kind() {
            TokenKind::Equal | TokenKind::LeftArrow => {
                let (transfer, transfer_span) = self.parse_transfer()?;
                let id = self.next_id();
                let value = self.parse_expression()?;
                Ok(Statement::Assignment(AssignmentStatement {
                    id,
                    span: expression.span.merge(value.span),
                    target: expression,
                    transfer,
                    transfer_span,
                    value,
                }))
            }
            TokenKind::Swap => {
                self.advance();
                let id = self.next_id();
                let right = self.parse_expression()?;
                Ok(Statement::Swap(SwapStatement {
                    id,
                    span: expression.span.merge(right.span),
                    left: expression,
                    right,
                }))
            }
            _ => Ok(Statement::Expression(expression)),
        }
    }
}
