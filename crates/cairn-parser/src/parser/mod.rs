//! Parser state and declaration parsing.
//!
//! `ParserState` owns the token stream and hands out `NodeId`s. Statement,
//! expression, and type parsing live in sibling modules as further
//! `impl ParserState` blocks.

mod expressions;
mod statements;
mod types;

use cairn_ast::{
    Access, CompositeDeclaration, CompositeKind, Declaration, FieldDeclaration,
    FunctionDeclaration, Identifier, ImportDeclaration, ImportLocation, InterfaceDeclaration,
    Member, NodeId, Parameter, PragmaDeclaration, Program, Purity, SpecialFunctionDeclaration,
    TransactionDeclaration, VariableKind,
};
use cairn_common::span::Span;

use crate::error::ParseError;
use crate::token::{Token, TokenKind};

pub struct ParserState<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    next_node_id: u32,
}

impl<'a> ParserState<'a> {
    #[must_use]
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            next_node_id: 0,
        }
    }

    /// Parse the whole token stream into a program.
    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut declarations = Vec::new();
        while !self.at(TokenKind::Eof) {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            declarations.push(self.parse_declaration()?);
        }
        Ok(Program {
            declarations,
            node_count: self.next_node_id,
        })
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn span(&self) -> Span {
        self.current().span
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected {what}, found `{}`",
                self.token_text(self.current())
            )))
        }
    }

    pub(crate) fn token_text(&self, token: &Token) -> &str {
        if token.kind == TokenKind::Eof {
            "end of file"
        } else {
            token.span.slice(self.source)
        }
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.span())
    }

    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Save/restore point for speculative parsing. Restoring also rewinds
    /// the node id counter so ids stay dense and deterministic.
    pub(crate) fn checkpoint(&self) -> (usize, u32) {
        (self.pos, self.next_node_id)
    }

    pub(crate) fn rollback(&mut self, checkpoint: (usize, u32)) {
        self.pos = checkpoint.0;
        self.next_node_id = checkpoint.1;
    }

    pub(crate) fn parse_identifier(&mut self, what: &str) -> Result<Identifier, ParseError> {
        let token = self.expect(TokenKind::Identifier, what)?;
        Ok(Identifier::new(token.span.slice(self.source), token.span))
    }

    /// Like `parse_identifier`, but also accepts `from`, which is a keyword
    /// but a common parameter/argument label.
    fn parse_identifier_or_from(&mut self, what: &str) -> Result<Identifier, ParseError> {
        if self.at(TokenKind::KwFrom) {
            let token = self.advance();
            return Ok(Identifier::new(token.span.slice(self.source), token.span));
        }
        self.parse_identifier(what)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub(crate) fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        if self.at(TokenKind::Hash) {
            return self.parse_pragma();
        }
        if self.at(TokenKind::KwImport) {
            return self.parse_import();
        }
        if self.at(TokenKind::KwTransaction) {
            return self.parse_transaction();
        }

        let access = self.parse_access_modifier()?;
        let purity = if self.eat(TokenKind::KwView).is_some() {
            Purity::View
        } else {
            Purity::Impure
        };

        match self.kind() {
            TokenKind::KwFun => {
                let function = self.parse_function_declaration(access, purity)?;
                Ok(Declaration::Function(function))
            }
            TokenKind::KwLet | TokenKind::KwVar => {
                let variable = self.parse_variable_declaration(access)?;
                Ok(Declaration::Variable(Box::new(variable)))
            }
            TokenKind::KwContract | TokenKind::KwResource | TokenKind::KwStruct => {
                let kind = self.composite_kind_from_token();
                self.advance();
                if self.eat(TokenKind::KwInterface).is_some() {
                    Ok(Declaration::Interface(
                        self.parse_interface_declaration(access, kind)?,
                    ))
                } else {
                    Ok(Declaration::Composite(
                        self.parse_composite_declaration(access, kind)?,
                    ))
                }
            }
            TokenKind::KwEvent => {
                self.advance();
                Ok(Declaration::Composite(self.parse_event_declaration(access)?))
            }
            TokenKind::KwAttachment => {
                self.advance();
                Ok(Declaration::Composite(
                    self.parse_attachment_declaration(access)?,
                ))
            }
            _ => Err(self.error_here(format!(
                "expected declaration, found `{}`",
                self.token_text(self.current())
            ))),
        }
    }

    fn composite_kind_from_token(&self) -> CompositeKind {
        match self.kind() {
            TokenKind::KwContract => CompositeKind::Contract,
            TokenKind::KwResource => CompositeKind::Resource,
            _ => CompositeKind::Struct,
        }
    }

    pub(crate) fn parse_access_modifier(&mut self) -> Result<Access, ParseError> {
        match self.kind() {
            TokenKind::KwPriv => {
                self.advance();
                Ok(Access::Priv)
            }
            TokenKind::KwPub => {
                self.advance();
                if self.at(TokenKind::LeftParen) {
                    self.advance();
                    let keyword = self.parse_identifier("`set`")?;
                    if keyword.name != "set" {
                        return Err(ParseError::new(
                            format!("expected `set` in access modifier, found `{}`", keyword.name),
                            keyword.span,
                        ));
                    }
                    self.expect(TokenKind::RightParen, "`)`")?;
                    Ok(Access::PubSet)
                } else {
                    Ok(Access::Pub)
                }
            }
            TokenKind::KwAccess => {
                self.advance();
                self.expect(TokenKind::LeftParen, "`(`")?;
                // `contract` is a keyword token; the others lex as
                // identifiers.
                let (keyword_text, keyword_span) = if self.at(TokenKind::KwContract) {
                    let token = self.advance();
                    ("contract".to_string(), token.span)
                } else {
                    let identifier = self.parse_identifier("access keyword")?;
                    (identifier.name, identifier.span)
                };
                let access = match keyword_text.as_str() {
                    "all" => Access::AccessAll,
                    "self" => Access::AccessSelf,
                    "contract" => Access::AccessContract,
                    "account" => Access::AccessAccount,
                    other => {
                        return Err(ParseError::new(
                            format!("invalid access keyword `{other}`"),
                            keyword_span,
                        ));
                    }
                };
                self.expect(TokenKind::RightParen, "`)`")?;
                Ok(access)
            }
            _ => Ok(Access::NotSpecified),
        }
    }

    fn parse_composite_declaration(
        &mut self,
        access: Access,
        kind: CompositeKind,
    ) -> Result<CompositeDeclaration, ParseError> {
        let id = self.next_id();
        let identifier = self.parse_identifier("composite name")?;
        let start = identifier.span;

        let conformances = if self.eat(TokenKind::Colon).is_some() {
            self.parse_conformance_list()?
        } else {
            Vec::new()
        };

        self.expect(TokenKind::LeftBrace, "`{`")?;
        let members = self.parse_members()?;
        let close = self.expect(TokenKind::RightBrace, "`}`")?;

        Ok(CompositeDeclaration {
            id,
            span: start.merge(close.span),
            access,
            kind,
            identifier,
            base_type: None,
            conformances,
            members,
        })
    }

    fn parse_attachment_declaration(
        &mut self,
        access: Access,
    ) -> Result<CompositeDeclaration, ParseError> {
        let id = self.next_id();
        let identifier = self.parse_identifier("attachment name")?;
        let start = identifier.span;
        self.expect(TokenKind::KwFor, "`for`")?;
        let base_type = self.parse_type_annotation()?;

        let conformances = if self.eat(TokenKind::Colon).is_some() {
            self.parse_conformance_list()?
        } else {
            Vec::new()
        };

        self.expect(TokenKind::LeftBrace, "`{`")?;
        let members = self.parse_members()?;
        let close = self.expect(TokenKind::RightBrace, "`}`")?;

        Ok(CompositeDeclaration {
            id,
            span: start.merge(close.span),
            access,
            kind: CompositeKind::Attachment,
            identifier,
            base_type: Some(base_type),
            conformances,
            members,
        })
    }

    /// `event Foo(a: Int, b: String)` - parameters become `let` fields and
    /// a synthetic initializer so the constructor surface is uniform.
    fn parse_event_declaration(
        &mut self,
        access: Access,
    ) -> Result<CompositeDeclaration, ParseError> {
        let id = self.next_id();
        let identifier = self.parse_identifier("event name")?;
        let start = identifier.span;
        let parameters = self.parse_parameter_list()?;
        let end = self.tokens[self.pos - 1].span;

        let mut members = Vec::with_capacity(parameters.len() + 1);
        for param in &parameters {
            members.push(Member::Field(FieldDeclaration {
                id: self.next_id(),
                span: param.span,
                access: Access::NotSpecified,
                kind: VariableKind::Let,
                identifier: param.name.clone(),
                type_annotation: param.type_annotation.clone(),
            }));
        }
        members.push(Member::Initializer(SpecialFunctionDeclaration {
            id: self.next_id(),
            span: start.merge(end),
            purity: Purity::Impure,
            parameters,
            body: None,
        }));

        Ok(CompositeDeclaration {
            id,
            span: start.merge(end),
            access,
            kind: CompositeKind::Event,
            identifier,
            base_type: None,
            conformances: Vec::new(),
            members,
        })
    }

    fn parse_interface_declaration(
        &mut self,
        access: Access,
        kind: CompositeKind,
    ) -> Result<InterfaceDeclaration, ParseError> {
        let id = self.next_id();
        let identifier = self.parse_identifier("interface name")?;
        let start = identifier.span;
        let conformances = if self.eat(TokenKind::Colon).is_some() {
            self.parse_conformance_list()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::LeftBrace, "`{`")?;
        let members = self.parse_members()?;
        let close = self.expect(TokenKind::RightBrace, "`}`")?;

        Ok(InterfaceDeclaration {
            id,
            span: start.merge(close.span),
            access,
            kind,
            identifier,
            conformances,
            members,
        })
    }

    fn parse_conformance_list(&mut self) -> Result<Vec<cairn_ast::TypeAnnotation>, ParseError> {
        let mut conformances = vec![self.parse_type_annotation()?];
        while self.eat(TokenKind::Comma).is_some() {
            conformances.push(self.parse_type_annotation()?);
        }
        Ok(conformances)
    }

    /// Parse composite/interface members until the closing brace.
    fn parse_members(&mut self) -> Result<Vec<Member>, ParseError> {
        let mut members = Vec::new();
        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            members.push(self.parse_member()?);
        }
        Ok(members)
    }

    fn parse_member(&mut self) -> Result<Member, ParseError> {
        let access = self.parse_access_modifier()?;
        let purity = if self.eat(TokenKind::KwView).is_some() {
            Purity::View
        } else {
            Purity::Impure
        };

        match self.kind() {
            TokenKind::KwLet | TokenKind::KwVar => {
                let kind = if self.at(TokenKind::KwLet) {
                    VariableKind::Let
                } else {
                    VariableKind::Var
                };
                self.advance();
                let id = self.next_id();
                let identifier = self.parse_identifier("field name")?;
                let start = identifier.span;
                self.expect(TokenKind::Colon, "`:`")?;
                let type_annotation = self.parse_type_annotation()?;
                Ok(Member::Field(FieldDeclaration {
                    id,
                    span: start.merge(type_annotation.span),
                    access,
                    kind,
                    identifier,
                    type_annotation,
                }))
            }
            TokenKind::KwInit => {
                let token = self.advance();
                let id = self.next_id();
                let parameters = self.parse_parameter_list()?;
                let body = if self.at(TokenKind::LeftBrace) {
                    Some(self.parse_block()?)
                } else {
                    None
                };
                let end = body.as_ref().map_or(token.span, |b| b.span);
                Ok(Member::Initializer(SpecialFunctionDeclaration {
                    id,
                    span: token.span.merge(end),
                    purity,
                    parameters,
                    body,
                }))
            }
            TokenKind::KwFun => Ok(Member::Function(
                self.parse_function_declaration(access, purity)?,
            )),
            TokenKind::KwEvent => {
                self.advance();
                Ok(Member::Composite(self.parse_event_declaration(access)?))
            }
            TokenKind::KwAttachment => {
                self.advance();
                Ok(Member::Composite(self.parse_attachment_declaration(access)?))
            }
            TokenKind::KwContract | TokenKind::KwResource | TokenKind::KwStruct => {
                let kind = self.composite_kind_from_token();
                self.advance();
                if self.eat(TokenKind::KwInterface).is_some() {
                    Ok(Member::Interface(
                        self.parse_interface_declaration(access, kind)?,
                    ))
                } else {
                    Ok(Member::Composite(
                        self.parse_composite_declaration(access, kind)?,
                    ))
                }
            }
            _ => Err(self.error_here(format!(
                "expected member declaration, found `{}`",
                self.token_text(self.current())
            ))),
        }
    }

    pub(crate) fn parse_function_declaration(
        &mut self,
        access: Access,
        purity: Purity,
    ) -> Result<FunctionDeclaration, ParseError> {
        self.expect(TokenKind::KwFun, "`fun`")?;
        let id = self.next_id();
        let identifier = self.parse_identifier("function name")?;
        let start = identifier.span;
        let parameters = self.parse_parameter_list()?;
        let return_type = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type_annotation()?)
        } else {
            None
        };
        let body = if self.at(TokenKind::LeftBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };
        let end = body
            .as_ref()
            .map(|b| b.span)
            .or(return_type.as_ref().map(|t| t.span))
            .unwrap_or(start);

        Ok(FunctionDeclaration {
            id,
            span: start.merge(end),
            access,
            purity,
            identifier,
            parameters,
            return_type,
            body,
        })
    }

    /// `( label name: Type, ... )`
    pub(crate) fn parse_parameter_list(&mut self) -> Result<Vec<Parameter>, ParseError> {
        self.expect(TokenKind::LeftParen, "`(`")?;
        let mut parameters = Vec::new();
        while !self.at(TokenKind::RightParen) {
            let first = self.parse_identifier_or_from("parameter name")?;
            let (label, name) = if self.at(TokenKind::Identifier) || self.at(TokenKind::KwFrom) {
                let name = self.parse_identifier_or_from("parameter name")?;
                (Some(first), name)
            } else {
                (None, first)
            };
            self.expect(TokenKind::Colon, "`:`")?;
            let type_annotation = self.parse_type_annotation()?;
            let start = label.as_ref().map_or(name.span, |l| l.span);
            parameters.push(Parameter {
                span: start.merge(type_annotation.span),
                label,
                name,
                type_annotation,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightParen, "`)`")?;
        Ok(parameters)
    }

    fn parse_transaction(&mut self) -> Result<Declaration, ParseError> {
        let keyword = self.expect(TokenKind::KwTransaction, "`transaction`")?;
        let id = self.next_id();

        // Optional transaction parameters are parsed and ignored by the
        // grammar; the checker binds them.
        if self.at(TokenKind::LeftParen) {
            self.parse_parameter_list()?;
        }

        self.expect(TokenKind::LeftBrace, "`{`")?;
        let mut fields = Vec::new();
        let mut prepare = None;
        let mut execute = None;
        let mut unknown_blocks = Vec::new();

        while !self.at(TokenKind::RightBrace) && !self.at(TokenKind::Eof) {
            match self.kind() {
                TokenKind::KwPrepare => {
                    let token = self.advance();
                    let prepare_id = self.next_id();
                    let parameters = self.parse_parameter_list()?;
                    let body = self.parse_block()?;
                    prepare = Some(SpecialFunctionDeclaration {
                        id: prepare_id,
                        span: token.span.merge(body.span),
                        purity: Purity::Impure,
                        parameters,
                        body: Some(body),
                    });
                }
                TokenKind::KwExecute => {
                    self.advance();
                    execute = Some(self.parse_block()?);
                }
                TokenKind::Identifier if self.peek_kind(1) == TokenKind::LeftBrace => {
                    let name = self.parse_identifier("block name")?;
                    let block = self.parse_block()?;
                    unknown_blocks.push((name, block));
                }
                _ => {
                    let access = self.parse_access_modifier()?;
                    let kind = match self.kind() {
                        TokenKind::KwLet => VariableKind::Let,
                        TokenKind::KwVar => VariableKind::Var,
                        _ => {
                            return Err(self.error_here(format!(
                                "expected transaction member, found `{}`",
                                self.token_text(self.current())
                            )));
                        }
                    };
                    self.advance();
                    let field_id = self.next_id();
                    let identifier = self.parse_identifier("field name")?;
                    let start = identifier.span;
                    self.expect(TokenKind::Colon, "`:`")?;
                    let type_annotation = self.parse_type_annotation()?;
                    fields.push(FieldDeclaration {
                        id: field_id,
                        span: start.merge(type_annotation.span),
                        access,
                        kind,
                        identifier,
                        type_annotation,
                    });
                }
            }
        }
        let close = self.expect(TokenKind::RightBrace, "`}`")?;

        Ok(Declaration::Transaction(TransactionDeclaration {
            id,
            span: keyword.span.merge(close.span),
            fields,
            prepare,
            execute,
            unknown_blocks,
        }))
    }

    fn parse_import(&mut self) -> Result<Declaration, ParseError> {
        let keyword = self.expect(TokenKind::KwImport, "`import`")?;
        let id = self.next_id();
        let mut identifiers = vec![self.parse_identifier("imported name")?];
        while self.eat(TokenKind::Comma).is_some() {
            identifiers.push(self.parse_identifier("imported name")?);
        }
        self.expect(TokenKind::KwFrom, "`from`")?;

        let (location, end) = if self.at(TokenKind::IntegerLiteral) {
            let token = self.advance();
            let text = token.span.slice(self.source).to_string();
            (ImportLocation::Address(text), token.span)
        } else {
            let name = self.parse_identifier("import location")?;
            let span = name.span;
            (ImportLocation::Named(name), span)
        };

        Ok(Declaration::Import(ImportDeclaration {
            id,
            span: keyword.span.merge(end),
            identifiers,
            location,
        }))
    }

    fn parse_pragma(&mut self) -> Result<Declaration, ParseError> {
        let hash = self.expect(TokenKind::Hash, "`#`")?;
        let id = self.next_id();
        let expression = self.parse_expression()?;
        let span = hash.span.merge(expression.span);
        Ok(Declaration::Pragma(PragmaDeclaration {
            id,
            span,
            expression,
        }))
    }
}
