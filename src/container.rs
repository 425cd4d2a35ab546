// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Rc;

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    #[error("invalid container name '{0}'")]
    InvalidName(String),
    #[error("alias must be a simple, non-empty identifier, got '{0}'")]
    InvalidAlias(String),
    #[error("alias '{alias}' must refer to a qualified name, got '{qualified}'")]
    UnqualifiedTarget { alias: String, qualified: String },
    #[error("alias '{alias}' collides with existing reference to '{existing}'")]
    AliasCollision { alias: String, existing: String },
    #[error("alias '{0}' collides with the container name")]
    ContainerCollision(String),
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_qualified(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_ident)
}

/// The namespace an expression is evaluated in, together with the aliases
/// and abbreviations used to shorten qualified names. Containers are
/// immutable; the `with_*` methods return an extended copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    name: Rc<str>,
    aliases: Rc<BTreeMap<String, String>>,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            name: "".into(),
            aliases: Rc::default(),
        }
    }
}

impl Container {
    pub fn new(name: &str) -> Result<Self, ContainerError> {
        let name = name.strip_prefix('.').unwrap_or(name);
        if !name.is_empty() && !is_qualified(name) {
            return Err(ContainerError::InvalidName(name.to_string()));
        }
        Ok(Self {
            name: name.into(),
            ..Self::default()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_alias(&self, alias: &str, qualified: &str) -> Result<Self, ContainerError> {
        if !is_ident(alias) {
            return Err(ContainerError::InvalidAlias(alias.to_string()));
        }
        if qualified.starts_with('.') || !qualified.contains('.') || !is_qualified(qualified) {
            return Err(ContainerError::UnqualifiedTarget {
                alias: alias.to_string(),
                qualified: qualified.to_string(),
            });
        }
        if let Some(existing) = self.aliases.get(alias) {
            return Err(ContainerError::AliasCollision {
                alias: alias.to_string(),
                existing: existing.clone(),
            });
        }
        if &*self.name == alias || self.name.starts_with(&format!("{alias}.")) {
            return Err(ContainerError::ContainerCollision(alias.to_string()));
        }
        let mut aliases = (*self.aliases).clone();
        aliases.insert(alias.to_string(), qualified.to_string());
        Ok(Self {
            name: self.name.clone(),
            aliases: Rc::new(aliases),
        })
    }

    /// Aliases the last segment of a qualified name to the full name.
    pub fn with_abbreviation(&self, qualified: &str) -> Result<Self, ContainerError> {
        let qualified = qualified.trim();
        let alias = qualified.rsplit('.').next().unwrap_or_default();
        self.with_alias(alias, qualified)
    }

    fn find_alias(&self, name: &str) -> Option<String> {
        let (simple, rest) = match name.split_once('.') {
            Some((s, r)) => (s, Some(r)),
            None => (name, None),
        };
        let target = self.aliases.get(simple)?;
        Some(match rest {
            Some(r) => format!("{target}.{r}"),
            None => target.clone(),
        })
    }

    /// Candidate fully qualified names for `name`, most specific first.
    ///
    /// With container `a.b`, the name `c` yields `a.b.c`, `a.c` and `c`. A
    /// leading `.` addresses the root namespace only. Aliases win over
    /// container scoping.
    pub fn resolve_candidate_names(&self, name: &str) -> Vec<String> {
        if let Some(root) = name.strip_prefix('.') {
            return vec![self.find_alias(root).unwrap_or_else(|| root.to_string())];
        }
        if let Some(aliased) = self.find_alias(name) {
            return vec![aliased];
        }
        if self.name.is_empty() {
            return vec![name.to_string()];
        }

        let mut candidates = vec![];
        let mut prefix: &str = &self.name;
        loop {
            candidates.push(format!("{prefix}.{name}"));
            match prefix.rfind('.') {
                Some(idx) => prefix = &prefix[..idx],
                None => break,
            }
        }
        candidates.push(name.to_string());
        candidates
    }
}
