// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::directory::{AirportDirectory, AirportRecord};
use std::collections::HashSet;

/// What a user-supplied airport name matched in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AirportNameKind {
    Code,
    City,
    State,
    /// Nothing in the directory matches.
    NoMatch,
}

impl AirportNameKind {
    fn field<'a>(&self, record: &'a AirportRecord) -> Option<&'a str> {
        match self {
            AirportNameKind::Code => Some(&record.code),
            AirportNameKind::City => Some(&record.city),
            AirportNameKind::State => Some(&record.state),
            AirportNameKind::NoMatch => None,
        }
    }
}

impl std::fmt::Display for AirportNameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AirportNameKind::Code => "code",
            AirportNameKind::City => "city",
            AirportNameKind::State => "state",
            AirportNameKind::NoMatch => "none",
        };
        f.write_str(s)
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Classifies `name` against every record. A code match anywhere beats a
/// city match, which beats a state match. Names compare whole, ignoring
/// case only.
pub fn classify(directory: &AirportDirectory, name: &str) -> AirportNameKind {
    if name.is_empty() {
        return AirportNameKind::NoMatch;
    }

    [
        AirportNameKind::Code,
        AirportNameKind::City,
        AirportNameKind::State,
    ]
    .into_iter()
    .find(|kind| {
        directory
            .records()
            .iter()
            .any(|r| kind.field(r).is_some_and(|v| same_name(v, name)))
    })
    .unwrap_or(AirportNameKind::NoMatch)
}

/// Returns every airport code whose `kind` field equals `name`, ignoring
/// case. Order follows the directory; repeated codes appear once.
pub fn resolve(directory: &AirportDirectory, name: &str, kind: AirportNameKind) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    directory
        .records()
        .iter()
        .filter(|r| kind.field(r).is_some_and(|v| same_name(v, name)))
        .filter_map(|r| seen.insert(r.code.clone()).then(|| r.code.clone()))
        .collect()
}

/// Classifies and resolves in one step. `None` when the name matches nothing.
pub fn resolve_name(
    directory: &AirportDirectory,
    name: &str,
) -> Option<(AirportNameKind, Vec<String>)> {
    match classify(directory, name) {
        AirportNameKind::NoMatch => None,
        kind => {
            let codes = resolve(directory, name, kind);
            log::debug!(
                "[Resolver] '{}' matched {} — codes={:?}",
                name,
                kind,
                codes
            );
            Some((kind, codes))
        }
    }
}
