// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parser for the mapping literals carried by result protocol lines.
//!
//! Test executables print mappings such as `{'result': 'pass', 'note': "slow"}`. The grammar is
//! deliberately small:
//!
//! ```text
//! mapping   := '{' [ entry (',' entry)* [','] ] '}'
//! entry     := string ':' value
//! value     := primitive | flat-mapping
//! primitive := string | number | 'True' | 'False' | 'None'
//! string    := '\'' chars '\'' | '"' chars '"'
//! ```
//!
//! Whitespace is allowed around every token. Mappings nest at most one level deep, which is all
//! the protocol needs (for `{'subtest': {'name': 'pass'}}`).

use crate::errors::ProtocolParseError;
use winnow::{
    ModalResult, Parser,
    ascii::multispace0,
    combinator::{alt, delimited, opt, preceded, repeat, separated, separated_pair, terminated},
    token::{any, take_till, take_while},
};

/// A value in a mapping literal.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
    Mapping(Vec<(String, Literal)>),
}

impl Literal {
    /// A short description of the kind of value, for error messages.
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Self::Str(_) => "a string",
            Self::Int(_) => "an integer",
            Self::Float(_) => "a float",
            Self::Bool(_) => "a boolean",
            Self::None => "None",
            Self::Mapping(_) => "a mapping",
        }
    }
}

type Entries = Vec<(String, Literal)>;

/// Parses a complete mapping literal. Trailing whitespace is permitted.
pub(crate) fn parse_mapping(payload: &str) -> Result<Entries, ProtocolParseError> {
    preceded(multispace0, terminated(mapping, multispace0))
        .parse(payload)
        .map_err(|error| ProtocolParseError::InvalidLiteral {
            payload: payload.to_owned(),
            offset: error.offset(),
        })
}

fn mapping(input: &mut &str) -> ModalResult<Entries> {
    mapping_of(input, entry)
}

fn flat_mapping(input: &mut &str) -> ModalResult<Entries> {
    mapping_of(input, flat_entry)
}

fn mapping_of(
    input: &mut &str,
    entry: fn(&mut &str) -> ModalResult<(String, Literal)>,
) -> ModalResult<Entries> {
    ('{', multispace0).void().parse_next(input)?;
    let entries: Entries =
        separated(0.., entry, (multispace0, ',', multispace0)).parse_next(input)?;
    if !entries.is_empty() {
        // A trailing comma is only valid after at least one entry.
        opt((multispace0, ',')).void().parse_next(input)?;
    }
    (multispace0, '}').void().parse_next(input)?;
    Ok(entries)
}

fn entry(input: &mut &str) -> ModalResult<(String, Literal)> {
    separated_pair(
        string,
        (multispace0, ':', multispace0),
        alt((flat_mapping.map(Literal::Mapping), primitive)),
    )
    .parse_next(input)
}

fn flat_entry(input: &mut &str) -> ModalResult<(String, Literal)> {
    separated_pair(string, (multispace0, ':', multispace0), primitive).parse_next(input)
}

fn primitive(input: &mut &str) -> ModalResult<Literal> {
    alt((string.map(Literal::Str), keyword, number)).parse_next(input)
}

fn keyword(input: &mut &str) -> ModalResult<Literal> {
    alt((
        "True".value(Literal::Bool(true)),
        "False".value(Literal::Bool(false)),
        "None".value(Literal::None),
    ))
    .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<Literal> {
    take_while(1.., |c: char| {
        c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')
    })
    .verify_map(parse_number)
    .parse_next(input)
}

fn parse_number(s: &str) -> Option<Literal> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(Literal::Int(n));
    }
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Literal::Float)
}

fn string(input: &mut &str) -> ModalResult<String> {
    alt((quoted::<'\''>, quoted::<'"'>)).parse_next(input)
}

#[derive(Clone, Copy, Debug)]
enum StringFragment<'a> {
    Literal(&'a str),
    Escaped(char),
    // An escape that isn't recognized is kept verbatim, backslash included.
    Unknown(char),
}

fn quoted<const QUOTE: char>(input: &mut &str) -> ModalResult<String> {
    delimited(
        QUOTE,
        repeat(0.., string_fragment::<QUOTE>).fold(String::new, |mut acc, fragment| {
            match fragment {
                StringFragment::Literal(s) => acc.push_str(s),
                StringFragment::Escaped(c) => acc.push(c),
                StringFragment::Unknown(c) => {
                    acc.push('\\');
                    acc.push(c);
                }
            }
            acc
        }),
        QUOTE,
    )
    .parse_next(input)
}

fn string_fragment<'i, const QUOTE: char>(input: &mut &'i str) -> ModalResult<StringFragment<'i>> {
    alt((
        take_till(1.., ['\\', QUOTE]).map(StringFragment::Literal),
        preceded('\\', any).map(|c: char| match c {
            'n' => StringFragment::Escaped('\n'),
            't' => StringFragment::Escaped('\t'),
            'r' => StringFragment::Escaped('\r'),
            '0' => StringFragment::Escaped('\0'),
            '\\' | '\'' | '"' => StringFragment::Escaped(c),
            other => StringFragment::Unknown(other),
        }),
    ))
    .parse_next(input)
}
