//! Preprocessor.
//!
//! Expands object-like macros, evaluates the conditional directives shaders
//! commonly use and harvests `#version` and `#extension` for the target
//! descriptor. Every directive line turns into a blank line so parse errors
//! keep their line numbers.

use alloc::{
    collections::BTreeMap,
    format,
    string::{String, ToString},
    vec::Vec,
};

use glopt_ir::{is_es_version, Extension, Target};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, char, digit1, satisfy, space0, space1},
    combinator::{map, map_res, opt, recognize, rest, value},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::{GlslError, GlslResult};

/// `#version N [profile]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionDirective {
    pub number: u32,
    pub es: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionBehavior {
    Require,
    Enable,
    Warn,
    Disable,
}

impl ExtensionBehavior {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "require" => Some(ExtensionBehavior::Require),
            "enable" => Some(ExtensionBehavior::Enable),
            "warn" => Some(ExtensionBehavior::Warn),
            "disable" => Some(ExtensionBehavior::Disable),
            _ => None,
        }
    }
}

/// `#extension name : behavior`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDirective {
    pub name: String,
    pub behavior: ExtensionBehavior,
}

/// Preprocessor output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessed {
    /// Source handed to the parser
    pub text: String,
    pub version: Option<VersionDirective>,
    pub extensions: Vec<ExtensionDirective>,
}

impl Preprocessed {
    /// Apply the harvested `#version` and `#extension` directives.
    pub fn apply(&self, target: &mut Target) {
        if let Some(v) = self.version {
            target.version = v.number;
            target.es = v.es || is_es_version(v.number);
        }
        for ext in &self.extensions {
            match Extension::from_name(&ext.name) {
                Some(e) if ext.behavior == ExtensionBehavior::Disable => target.extensions.disable(e),
                Some(e) => target.extensions.enable(e),
                None => log::debug!("extension {} is not tracked", ext.name),
            }
        }
    }
}

/// Run the preprocessor over `source`.
pub fn preprocess(source: &str) -> GlslResult<Preprocessed> {
    let mut pp = Preprocessor::new(true);
    for (i, line) in source.lines().enumerate() {
        pp.line(i + 1, line)?;
    }
    pp.finish(source)
}

/// Harvest `#version` and `#extension` without touching the text.
pub fn scan_directives(source: &str) -> GlslResult<Preprocessed> {
    let mut pp = Preprocessor::new(false);
    for (i, line) in source.lines().enumerate() {
        pp.line(i + 1, line)?;
    }
    pp.finish(source)
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    active: bool,
    taken: bool,
    seen_else: bool,
}

struct Preprocessor {
    /// Expand macros and evaluate conditionals
    expand: bool,
    out: String,
    defines: BTreeMap<String, String>,
    frames: Vec<Frame>,
    in_comment: bool,
    version: Option<VersionDirective>,
    extensions: Vec<ExtensionDirective>,
}

impl Preprocessor {
    fn new(expand: bool) -> Self {
        Self {
            expand,
            out: String::new(),
            defines: BTreeMap::new(),
            frames: Vec::new(),
            in_comment: false,
            version: None,
            extensions: Vec::new(),
        }
    }

    fn is_active(&self) -> bool {
        self.frames.iter().all(|f| f.active)
    }

    fn line(&mut self, number: usize, line: &str) -> GlslResult<()> {
        if !self.in_comment {
            if let Some(body) = line.trim_start().strip_prefix('#') {
                self.directive(number, body.trim_start())?;
                self.out.push('\n');
                return Ok(());
            }
        }
        let expanded = self.expand_line(line);
        if self.expand && self.is_active() {
            self.out.push_str(&expanded);
        }
        self.out.push('\n');
        Ok(())
    }

    fn finish(self, source: &str) -> GlslResult<Preprocessed> {
        if self.expand && !self.frames.is_empty() {
            return Err(GlslError::preprocess("unterminated #if"));
        }
        Ok(Preprocessed {
            text: if self.expand {
                self.out
            } else {
                source.to_string()
            },
            version: self.version,
            extensions: self.extensions,
        })
    }

    fn directive(&mut self, number: usize, body: &str) -> GlslResult<()> {
        let (remaining, d) = directive(body).map_err(|e| {
            GlslError::preprocess(format!("line {}: malformed directive: {:?}", number, e))
        })?;
        let active = self.is_active();

        match d {
            Directive::Version(n, profile) if active => {
                let es = match profile {
                    None => n == 100,
                    Some("es") => true,
                    Some("core") | Some("compatibility") => false,
                    Some(other) => {
                        return Err(GlslError::preprocess(format!(
                            "line {}: unknown profile '{}'",
                            number, other
                        )))
                    }
                };
                self.version = Some(VersionDirective { number: n, es });
                if self.expand {
                    self.defines.insert("__VERSION__".to_string(), n.to_string());
                    if es {
                        self.defines.insert("GL_ES".to_string(), "1".to_string());
                    }
                }
            }
            Directive::Extension(name, behavior) if active => {
                let behavior = ExtensionBehavior::from_name(behavior).ok_or_else(|| {
                    GlslError::preprocess(format!(
                        "line {}: unknown extension behavior '{}'",
                        number, behavior
                    ))
                })?;
                self.extensions.push(ExtensionDirective {
                    name: name.to_string(),
                    behavior,
                });
            }
            _ if !self.expand => {}
            Directive::Define(name, body) if active => {
                self.defines.insert(name.to_string(), body.to_string());
            }
            Directive::DefineFunction(name) if active => {
                return Err(GlslError::unsupported(format!(
                    "line {}: function-like macro '{}'",
                    number, name
                )));
            }
            Directive::Undef(name) if active => {
                self.defines.remove(name);
            }
            Directive::IfDef(name) => self.open(self.defines.contains_key(name)),
            Directive::IfNDef(name) => self.open(!self.defines.contains_key(name)),
            Directive::If(cond) => {
                check_condition_end(number, remaining)?;
                let taken = self.eval(&cond);
                self.open(taken);
            }
            Directive::Elif(cond) => {
                check_condition_end(number, remaining)?;
                let taken = self.eval(&cond);
                let frame = self.top(number, "#elif")?;
                frame.active = !frame.taken && taken;
                frame.taken |= taken;
            }
            Directive::Else => {
                let frame = self.top(number, "#else")?;
                frame.active = !frame.taken;
                frame.taken = true;
                frame.seen_else = true;
            }
            Directive::EndIf => {
                if self.frames.pop().is_none() {
                    return Err(GlslError::preprocess(format!(
                        "line {}: #endif without #if",
                        number
                    )));
                }
            }
            Directive::Error(msg) if active => {
                return Err(GlslError::preprocess(format!("line {}: #error {}", number, msg)));
            }
            _ => {}
        }
        Ok(())
    }

    fn open(&mut self, taken: bool) {
        self.frames.push(Frame {
            active: taken,
            taken,
            seen_else: false,
        });
    }

    fn top(&mut self, number: usize, what: &str) -> GlslResult<&mut Frame> {
        match self.frames.last_mut() {
            Some(f) if !f.seen_else => Ok(f),
            Some(_) => Err(GlslError::preprocess(format!(
                "line {}: {} after #else",
                number, what
            ))),
            None => Err(GlslError::preprocess(format!(
                "line {}: {} without #if",
                number, what
            ))),
        }
    }

    fn eval(&self, cond: &Condition) -> bool {
        match cond {
            Condition::Defined(name, negate) => self.defines.contains_key(*name) != *negate,
            Condition::Literal(n) => *n != 0,
            Condition::Macro(name) => self
                .defines
                .get(*name)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .map_or(false, |n| n != 0),
        }
    }

    /// Expand the code parts of a line, leaving comments alone.
    fn expand_line(&mut self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut rest = line;
        while !rest.is_empty() {
            if self.in_comment {
                match rest.find("*/") {
                    Some(end) => {
                        out.push_str(&rest[..end + 2]);
                        rest = &rest[end + 2..];
                        self.in_comment = false;
                    }
                    None => {
                        out.push_str(rest);
                        break;
                    }
                }
                continue;
            }
            let line_comment = rest.find("//");
            let block_comment = rest.find("/*");
            match (line_comment, block_comment) {
                (Some(l), Some(b)) if b < l => {
                    out.push_str(&self.expand_code(&rest[..b], &mut Vec::new()));
                    out.push_str("/*");
                    rest = &rest[b + 2..];
                    self.in_comment = true;
                }
                (None, Some(b)) => {
                    out.push_str(&self.expand_code(&rest[..b], &mut Vec::new()));
                    out.push_str("/*");
                    rest = &rest[b + 2..];
                    self.in_comment = true;
                }
                (Some(l), _) => {
                    out.push_str(&self.expand_code(&rest[..l], &mut Vec::new()));
                    out.push_str(&rest[l..]);
                    break;
                }
                (None, None) => {
                    out.push_str(&self.expand_code(rest, &mut Vec::new()));
                    break;
                }
            }
        }
        out
    }

    /// Replace macro names in `code`. Names in `hidden` are being expanded
    /// and stay as written.
    fn expand_code(&self, code: &str, hidden: &mut Vec<String>) -> String {
        if !self.expand || self.defines.is_empty() {
            return code.to_string();
        }
        let b = code.as_bytes();
        let mut out = String::with_capacity(code.len());
        let mut i = 0;
        while i < b.len() {
            let c = b[i];
            if c.is_ascii_digit() || (c == b'.' && b.get(i + 1).map_or(false, u8::is_ascii_digit)) {
                let start = i;
                i += 1;
                while i < b.len()
                    && (b[i].is_ascii_alphanumeric()
                        || b[i] == b'.'
                        || (matches!(b[i], b'+' | b'-') && matches!(b[i - 1], b'e' | b'E')))
                {
                    i += 1;
                }
                out.push_str(&code[start..i]);
            } else if c.is_ascii_alphabetic() || c == b'_' {
                let start = i;
                while i < b.len() && (b[i].is_ascii_alphanumeric() || b[i] == b'_') {
                    i += 1;
                }
                let name = &code[start..i];
                match self.defines.get(name) {
                    Some(body) if !hidden.iter().any(|h| h == name) => {
                        hidden.push(name.to_string());
                        out.push_str(&self.expand_code(body, hidden));
                        hidden.pop();
                    }
                    _ => out.push_str(name),
                }
            } else {
                let ch = code[i..].chars().next().unwrap_or(' ');
                out.push(ch);
                i += ch.len_utf8();
            }
        }
        out
    }
}

fn check_condition_end(number: usize, remaining: &str) -> GlslResult<()> {
    let tail = remaining.split("//").next().unwrap_or("").trim();
    if tail.is_empty() {
        Ok(())
    } else {
        Err(GlslError::unsupported(format!(
            "line {}: #if expression '{}'",
            number, tail
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Condition<'a> {
    /// `defined(X)`, negated for `!defined(X)`
    Defined(&'a str, bool),
    Literal(i64),
    Macro(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
enum Directive<'a> {
    Version(u32, Option<&'a str>),
    Extension(&'a str, &'a str),
    Define(&'a str, &'a str),
    DefineFunction(&'a str),
    Undef(&'a str),
    IfDef(&'a str),
    IfNDef(&'a str),
    If(Condition<'a>),
    Elif(Condition<'a>),
    Else,
    EndIf,
    Error(&'a str),
    /// `#pragma`, `#line` and anything else, dropped
    Other,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

fn version(input: &str) -> IResult<&str, Directive<'_>> {
    map(
        tuple((tag("version"), space1, number, opt(preceded(space1, alpha1)))),
        |(_, _, n, profile)| Directive::Version(n, profile),
    )(input)
}

fn extension(input: &str) -> IResult<&str, Directive<'_>> {
    map(
        tuple((
            tag("extension"),
            space1,
            identifier,
            space0,
            char(':'),
            space0,
            alpha1,
        )),
        |(_, _, name, _, _, _, behavior)| Directive::Extension(name, behavior),
    )(input)
}

fn define(input: &str) -> IResult<&str, Directive<'_>> {
    let (input, (_, _, name)) = tuple((tag("define"), space1, identifier))(input)?;
    if input.starts_with('(') {
        return Ok(("", Directive::DefineFunction(name)));
    }
    let (input, body) = rest(input)?;
    let body = body.split("//").next().unwrap_or("").trim();
    Ok((input, Directive::Define(name, body)))
}

fn defined(input: &str) -> IResult<&str, &str> {
    preceded(
        pair(tag("defined"), space0),
        alt((
            delimited(pair(char('('), space0), identifier, pair(space0, char(')'))),
            identifier,
        )),
    )(input)
}

fn condition(input: &str) -> IResult<&str, Condition<'_>> {
    alt((
        map(preceded(pair(char('!'), space0), defined), |n| {
            Condition::Defined(n, true)
        }),
        map(defined, |n| Condition::Defined(n, false)),
        map(map_res(digit1, str::parse::<i64>), Condition::Literal),
        map(identifier, Condition::Macro),
    ))(input)
}

fn directive(input: &str) -> IResult<&str, Directive<'_>> {
    alt((
        version,
        extension,
        define,
        map(preceded(pair(tag("undef"), space1), identifier), Directive::Undef),
        map(preceded(pair(tag("ifdef"), space1), identifier), Directive::IfDef),
        map(preceded(pair(tag("ifndef"), space1), identifier), Directive::IfNDef),
        map(preceded(pair(tag("if"), space1), condition), Directive::If),
        map(preceded(pair(tag("elif"), space1), condition), Directive::Elif),
        value(Directive::Else, tag("else")),
        value(Directive::EndIf, tag("endif")),
        map(preceded(pair(tag("error"), space0), rest), |m: &str| {
            Directive::Error(m.trim())
        }),
        value(Directive::Other, rest),
    ))(input)
}
