// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The [`Reader`] structure.
//!
//! See the [`zone_file` module-level documentation](`super`) for
//! implementation details about how the [`Reader`] is used.

use super::{Error, ErrorKind, Result};

////////////////////////////////////////////////////////////////////////
// STRUCTURES                                                         //
////////////////////////////////////////////////////////////////////////

/// Splits a record definition into fields.
///
/// The [`Reader`] takes care of moving between fields and lines in a
/// record definition. This includes processing comments and
/// parentheses for line extension, and keeping quoted
/// `<character-string>`s together. Escape sequences are *not*
/// processed here (they only keep a field from ending early), since
/// their meaning depends on what the field is.
#[derive(Clone)]
pub(super) struct Reader<'a> {
    text: &'a str,
    index: usize,
    in_parens: bool,
    position: Position,
}

/// Records the current human-readable position (line and column) in a
/// record definition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A field read by [`Reader::next_field`]. For quoted fields, `text`
/// excludes the quotation marks.
#[derive(Clone, Copy, Debug)]
pub(super) struct Field<'a> {
    pub text: &'a str,
    pub quoted: bool,
    pub position: Position,
}

////////////////////////////////////////////////////////////////////////
// READER IMPLEMENTATION                                              //
////////////////////////////////////////////////////////////////////////

impl<'a> Reader<'a> {
    /// Constructs a new [`Reader`] over `text`.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            index: 0,
            in_parens: false,
            position: Position { line: 1, column: 1 },
        }
    }

    /// Returns the current [`Position`] of the reader.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns whether the text begins with whitespace, which in the
    /// zone file format means that the owner was omitted.
    pub fn starts_with_blank(&self) -> bool {
        self.text.as_bytes().first().map_or(false, |b| is_whitespace(*b))
    }

    /// Reads the next field of the current logical line. Returns `None`
    /// at the end of the line (which is not consumed) or of the text.
    pub fn next_field(&mut self) -> Result<Option<Field<'a>>> {
        loop {
            self.skip_whitespace();
            match self.peek_octet() {
                None => {
                    if self.in_parens {
                        return Err(self.error(ErrorKind::UnbalancedParens));
                    } else {
                        return Ok(None);
                    }
                }
                Some(b';') => self.skip_to_eol(),
                Some(b'\n') | Some(b'\r') => {
                    if self.in_parens {
                        self.skip_eol();
                    } else {
                        return Ok(None);
                    }
                }
                Some(b'(') => {
                    if self.in_parens {
                        return Err(self.error(ErrorKind::NestedParens));
                    }
                    self.in_parens = true;
                    self.advance();
                }
                Some(b')') => {
                    if !self.in_parens {
                        return Err(self.error(ErrorKind::UnbalancedParens));
                    }
                    self.in_parens = false;
                    self.advance();
                }
                Some(b'"') => return self.read_quoted().map(Some),
                Some(_) => return self.read_unquoted().map(Some),
            }
        }
    }

    /// Consumes the next field if it is exactly `text` and unquoted,
    /// returning whether it was. Otherwise the reader is left where it
    /// was.
    pub fn next_field_is(&mut self, text: &str) -> Result<bool> {
        let saved = self.clone();
        match self.next_field()? {
            Some(field) if !field.quoted && field.text == text => Ok(true),
            _ => {
                *self = saved;
                Ok(false)
            }
        }
    }

    /// Ensures that nothing but blank lines and comments follows the
    /// current logical line.
    pub fn finish(&mut self) -> Result<()> {
        loop {
            if let Some(field) = self.next_field()? {
                return Err(Error::new(field.position, ErrorKind::ExpectedEol));
            } else if self.peek_octet().is_none() {
                return Ok(());
            }
            self.skip_eol();
        }
    }

    /// Constructs an [`Error`] at the current position.
    pub fn error(&self, kind: ErrorKind) -> Error {
        Error::new(self.position, kind)
    }

    ////////////////////////////////////////////////////////////////////
    // FIELD READING                                                  //
    ////////////////////////////////////////////////////////////////////

    /// Reads a quoted field. The reader must be positioned at the
    /// opening quotation mark.
    fn read_quoted(&mut self) -> Result<Field<'a>> {
        let position = self.position;
        self.advance();
        let start = self.index;
        loop {
            match self.peek_octet() {
                None => {
                    return Err(Error::new(
                        position,
                        ErrorKind::EndInQuotedCharacterString,
                    ))
                }
                Some(b'"') => break,
                Some(b'\\') => {
                    self.advance();
                    if self.peek_octet().is_none() {
                        return Err(self.error(ErrorKind::EndInEscape));
                    }
                    self.advance();
                }
                Some(_) => self.advance(),
            }
        }
        let text = &self.text[start..self.index];
        self.advance();
        Ok(Field {
            text,
            quoted: true,
            position,
        })
    }

    /// Reads an unquoted field, which ends at whitespace, a line
    /// ending, or one of the special characters `;`, `(`, `)`, and `"`.
    fn read_unquoted(&mut self) -> Result<Field<'a>> {
        let position = self.position;
        let start = self.index;
        while let Some(octet) = self.peek_octet() {
            if ends_field(octet) {
                break;
            } else if octet == b'\\' {
                self.advance();
                if self.peek_octet().is_none() {
                    return Err(self.error(ErrorKind::EndInEscape));
                }
            }
            self.advance();
        }
        Ok(Field {
            text: &self.text[start..self.index],
            quoted: false,
            position,
        })
    }

    ////////////////////////////////////////////////////////////////////
    // NAVIGATION                                                     //
    ////////////////////////////////////////////////////////////////////

    fn peek_octet(&self) -> Option<u8> {
        self.text.as_bytes().get(self.index).copied()
    }

    /// Consumes one octet, updating the position.
    fn advance(&mut self) {
        if self.peek_octet() == Some(b'\n') {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        self.index += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.peek_octet().map_or(false, is_whitespace) {
            self.advance();
        }
    }

    /// Consumes data up to, but not including, the next line ending.
    fn skip_to_eol(&mut self) {
        while !matches!(self.peek_octet(), None | Some(b'\n') | Some(b'\r')) {
            self.advance();
        }
    }

    /// Consumes a line ending (`\n` or `\r\n`), if present. A lone
    /// `\r` is consumed as well.
    fn skip_eol(&mut self) {
        if self.peek_octet() == Some(b'\r') {
            self.index += 1;
        }
        if self.peek_octet() == Some(b'\n') {
            self.advance();
        }
    }
}

/// Returns whether `octet` is zone-file whitespace (a space or a tab).
fn is_whitespace(octet: u8) -> bool {
    octet == b' ' || octet == b'\t'
}

/// Returns whether `octet` ends an unquoted field.
fn ends_field(octet: u8) -> bool {
    is_whitespace(octet) || matches!(octet, b'\n' | b'\r' | b';' | b'(' | b')' | b'"')
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
