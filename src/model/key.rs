//! Type expressions, keys and scopes.
//!
//! Types are written the way they appear in source, e.g.
//! `java.util.Map<String, javax.inject.Provider<Foo>>` or `? extends Foo`.
//! Framework wrappers (`Provider`, `Producer`, `Lazy`) and collection types
//! are recognised by simple name so that qualified and unqualified spellings
//! behave the same.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeNameError;

pub const PROVIDER: &str = "Provider";
pub const PRODUCER: &str = "Producer";
pub const LAZY: &str = "Lazy";
pub const MAP: &str = "Map";
pub const SET: &str = "Set";

const FRAMEWORK_TYPES: [&str; 4] = [PROVIDER, PRODUCER, LAZY, "Produced"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WildcardBound {
    Extends(Box<TypeName>),
    Super(Box<TypeName>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeName {
    Declared { name: String, args: Vec<TypeName> },
    Wildcard { bound: Option<WildcardBound> },
}

impl TypeName {
    pub fn declared(name: impl Into<String>, args: Vec<TypeName>) -> Self {
        TypeName::Declared {
            name: name.into(),
            args,
        }
    }

    /// The erased name, e.g. `java.util.Map` for `java.util.Map<K, V>`.
    pub fn raw_name(&self) -> &str {
        match self {
            TypeName::Declared { name, .. } => name,
            TypeName::Wildcard { .. } => "?",
        }
    }

    /// The last dotted segment of the erased name.
    pub fn simple_name(&self) -> &str {
        let raw = self.raw_name();
        raw.rsplit('.').next().unwrap_or(raw)
    }

    pub fn args(&self) -> &[TypeName] {
        match self {
            TypeName::Declared { args, .. } => args,
            TypeName::Wildcard { .. } => &[],
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeName::Wildcard { .. })
    }

    /// True if this type or any of its type arguments is a wildcard.
    pub fn contains_wildcard(&self) -> bool {
        match self {
            TypeName::Wildcard { .. } => true,
            TypeName::Declared { args, .. } => args.iter().any(TypeName::contains_wildcard),
        }
    }

    /// True if the erased simple name is `simple_name`.
    pub fn is_type_of(&self, simple_name: &str) -> bool {
        !self.is_wildcard() && self.simple_name() == simple_name
    }

    pub fn is_framework_type(&self) -> bool {
        FRAMEWORK_TYPES.iter().any(|f| self.is_type_of(f))
    }

    /// Key and value types of a `Map<K, V>`.
    pub fn map_types(&self) -> Option<(&TypeName, &TypeName)> {
        match self.args() {
            [key, value] if self.is_type_of(MAP) => Some((key, value)),
            _ => None,
        }
    }

    /// Whether this is a map whose values are wrapped in a framework type.
    pub fn map_values_are_framework_type(&self) -> bool {
        self.map_types()
            .is_some_and(|(_, value)| value.is_framework_type())
    }

    pub fn map_values_are_type_of(&self, wrapper: &str) -> bool {
        self.map_types()
            .is_some_and(|(_, value)| value.is_type_of(wrapper))
    }

    /// `Map<K, W<V>>` → `Map<K, V>` when `W` is `wrapper`.
    pub fn unwrap_map_value(&self, wrapper: &str) -> Option<TypeName> {
        let (key, value) = self.map_types()?;
        match value.args() {
            [inner] if value.is_type_of(wrapper) => Some(TypeName::declared(
                self.raw_name(),
                vec![key.clone(), inner.clone()],
            )),
            _ => None,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Declared { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeName::Wildcard { bound: None } => write!(f, "?"),
            TypeName::Wildcard {
                bound: Some(WildcardBound::Extends(bound)),
            } => write!(f, "? extends {bound}"),
            TypeName::Wildcard {
                bound: Some(WildcardBound::Super(bound)),
            } => write!(f, "? super {bound}"),
        }
    }
}

impl FromStr for TypeName {
    type Err = TypeNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { src: s, pos: 0 };
        let parsed = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(parsed)
    }
}

impl TryFrom<String> for TypeName {
    type Error = TypeNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.to_string()
    }
}

struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '[' | ']') {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        (self.pos > start).then(|| &self.src[start..self.pos])
    }

    fn error(&self, reason: &'static str) -> TypeNameError {
        TypeNameError {
            input: self.src.to_string(),
            reason,
            offset: self.pos,
        }
    }

    fn parse_type(&mut self) -> Result<TypeName, TypeNameError> {
        if self.eat('?') {
            let before_bound = self.pos;
            return match self.ident() {
                Some("extends") => Ok(TypeName::Wildcard {
                    bound: Some(WildcardBound::Extends(Box::new(self.parse_type()?))),
                }),
                Some("super") => Ok(TypeName::Wildcard {
                    bound: Some(WildcardBound::Super(Box::new(self.parse_type()?))),
                }),
                Some(_) => Err(self.error("expected 'extends' or 'super' after '?'")),
                None => {
                    self.pos = before_bound;
                    Ok(TypeName::Wildcard { bound: None })
                }
            };
        }

        let name = self
            .ident()
            .ok_or_else(|| self.error("expected a type name"))?
            .to_string();
        let mut args = Vec::new();
        if self.eat('<') {
            loop {
                args.push(self.parse_type()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }
        Ok(TypeName::Declared { name, args })
    }
}

/// Identifies what can be injected: an optional qualifier plus a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    #[serde(rename = "type")]
    pub type_name: TypeName,
    /// Distinguishes one multibinding contribution from another. Not displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multibinding_contribution: Option<String>,
}

impl Key {
    pub fn new(type_name: TypeName) -> Self {
        Key {
            qualifier: None,
            type_name,
            multibinding_contribution: None,
        }
    }

    pub fn qualified(qualifier: impl Into<String>, type_name: TypeName) -> Self {
        Key {
            qualifier: Some(qualifier.into()),
            ..Key::new(type_name)
        }
    }

    pub fn with_contribution(mut self, contribution: impl Into<String>) -> Self {
        self.multibinding_contribution = Some(contribution.into());
        self
    }

    /// For `Map<K, W<V>>` keys, the equivalent `Map<K, V>` key.
    pub fn unwrap_map_value(&self, wrapper: &str) -> Option<Key> {
        Some(Key {
            type_name: self.type_name.unwrap_map_value(wrapper)?,
            ..self.clone()
        })
    }

    /// Whether an `@Inject` constructor could satisfy this key.
    pub fn is_valid_implicit_provision_key(&self) -> bool {
        self.qualifier.is_none()
            && !self.type_name.contains_wildcard()
            && !self.type_name.is_framework_type()
            && !self.type_name.is_type_of(MAP)
            && !self.type_name.is_type_of(SET)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{qualifier} {}", self.type_name),
            None => write!(f, "{}", self.type_name),
        }
    }
}

/// A scope annotation, by qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(pub String);

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Scope(name.into())
    }

    /// `@Reusable` bindings may be used from any component.
    pub fn is_reusable(&self) -> bool {
        self.simple_name() == "Reusable"
    }

    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Source-like form, e.g. `@Singleton`.
    pub fn readable(&self) -> String {
        format!("@{}", self.simple_name())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.readable())
    }
}
