//! Cartridge list template extension.
//!
//! The template is a properties file holding two whitespace-separated lists of
//! module names, `cartridges` and `cartridges.dbinit`, usually spread over
//! backslash-continued lines. Every other line is carried through verbatim.

use crate::classify::{Classification, Classifier};
use crate::codec::write_atomic;
use crate::CoreError;
use cartage_schema::{ModuleReference, Style, Tier};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CARTRIDGES_PROPERTY: &str = "cartridges";
pub const DBINIT_PROPERTY: &str = "cartridges.dbinit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateLine {
    /// Comments, blank lines, and unrelated properties, with their original
    /// continuation lines.
    Raw(String),
    List {
        key: String,
        values: BTreeSet<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeListTemplate {
    lines: Vec<TemplateLine>,
}

impl CartridgeListTemplate {
    /// Parse template text; `path` is only used to name the template in errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self, CoreError> {
        let mut lines = Vec::new();
        let mut physical = text.lines();
        while let Some(first) = physical.next() {
            let trimmed = first.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                lines.push(TemplateLine::Raw(first.to_owned()));
                continue;
            }

            let mut raw = vec![first];
            let mut current = first;
            while is_continued(current) {
                let Some(next) = physical.next() else { break };
                raw.push(next);
                current = next;
            }

            let (key, value) = split_property(&join_logical(&raw));
            if key == CARTRIDGES_PROPERTY || key == DBINIT_PROPERTY {
                lines.push(TemplateLine::List {
                    key,
                    values: value.split_whitespace().map(str::to_owned).collect(),
                });
            } else {
                lines.push(TemplateLine::Raw(raw.join("\n")));
            }
        }

        let template = Self { lines };
        for property in [CARTRIDGES_PROPERTY, DBINIT_PROPERTY] {
            if template.values(property).is_none() {
                return Err(CoreError::MissingTemplateProperty {
                    property,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(template)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    pub fn values(&self, property: &str) -> Option<&BTreeSet<String>> {
        self.lines.iter().find_map(|line| match line {
            TemplateLine::List { key, values } if key == property => Some(values),
            _ => None,
        })
    }

    /// Add `name` to `property`. Returns whether it was not already listed.
    pub fn add(&mut self, property: &str, name: &str) -> bool {
        self.lines
            .iter_mut()
            .find_map(|line| match line {
                TemplateLine::List { key, values } if key == property => Some(values),
                _ => None,
            })
            .is_some_and(|values| values.insert(name.to_owned()))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                TemplateLine::Raw(text) => out.push_str(text),
                TemplateLine::List { key, values } => {
                    out.push_str(key);
                    out.push_str(" =");
                    for (i, value) in values.iter().enumerate() {
                        out.push_str(if i == 0 { " " } else { " \\\n\t" });
                        out.push_str(value);
                    }
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<(), CoreError> {
        write_atomic(path, self.render().as_bytes())?;
        Ok(())
    }
}

/// An odd number of trailing backslashes continues the line.
fn is_continued(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn join_logical(raw: &[&str]) -> String {
    raw.iter()
        .enumerate()
        .map(|(i, &line)| {
            let line = if i == 0 { line } else { line.trim_start() };
            if is_continued(line) {
                &line[..line.len() - 1]
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_property(line: &str) -> (String, String) {
    let line = line.trim_start();
    let end = line
        .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
        .unwrap_or(line.len());
    let (key, rest) = line.split_at(end);
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(|c: char| c == '=' || c == ':')
        .unwrap_or(rest);
    (key.to_owned(), rest.trim().to_owned())
}

/// Names added to the template and references skipped for one target tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionReport {
    pub tier: Tier,
    pub cartridges: Vec<String>,
    pub dbinit: Vec<String>,
    pub skipped: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Add every first-party module of `include` and `dbinit` that `tier` deploys
/// to the matching template property.
pub fn extend(
    template: &mut CartridgeListTemplate,
    tier: Tier,
    include: &BTreeSet<ModuleReference>,
    dbinit: &BTreeSet<ModuleReference>,
    classifier: &mut Classifier<'_>,
) -> ExtensionReport {
    let mut skipped = BTreeSet::new();
    let cartridges = extend_property(
        template,
        CARTRIDGES_PROPERTY,
        tier,
        include,
        classifier,
        &mut skipped,
    );
    let dbinit = extend_property(template, DBINIT_PROPERTY, tier, dbinit, classifier, &mut skipped);
    ExtensionReport {
        tier,
        cartridges,
        dbinit,
        skipped,
        output: None,
    }
}

fn extend_property(
    template: &mut CartridgeListTemplate,
    property: &str,
    tier: Tier,
    references: &BTreeSet<ModuleReference>,
    classifier: &mut Classifier<'_>,
    skipped: &mut BTreeSet<String>,
) -> Vec<String> {
    let mut added = Vec::new();
    for reference in references {
        let classification = classifier.classify(reference);
        match &classification {
            Classification::FirstParty { name, .. } if classification.accepted_by(tier) => {
                if template.add(property, name) {
                    added.push(name.to_string());
                }
            }
            Classification::FirstParty { style, .. } => {
                let style = style.map_or("unknown", Style::as_str);
                debug!("{property}: skipping {reference}, style {style} is not deployed in {tier}");
                skipped.insert(reference.to_string());
            }
            Classification::Library => {
                debug!("{property}: skipping {reference}, not a cartridge");
                skipped.insert(reference.to_string());
            }
        }
    }
    added
}
