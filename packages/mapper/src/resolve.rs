//! Field-name resolution.
//!
//! Turns a record's field declarations into a [`FieldMap`]: every property
//! name the record accepts, mapped to the path of field indices that reaches
//! it. Embedded records are promoted into the parent namespace; every other
//! nested record contributes both its own name and dotted `name.sub` entries,
//! which is how flattened properties find their leaves.
//!
//! # Design Notes
//!
//! - Expansion stops at recursive types, at types with a custom loader (the
//!   entry is marked opaque and handed a regrouped entity), and below a
//!   second sequence level.
//! - Resolution failures are structural: the record type is unusable and the
//!   error is cached with it.

use std::any::TypeId;
use std::collections::HashMap;

use propmap_core::StructuralError;

use crate::capability::Capabilities;
use crate::schema::{FieldInfo, Shape};
use crate::tag::{parse_tag, FieldOptions};

/// How a step moves from one record to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    Direct,
    /// Through an `Option`, allocating it if absent.
    Pointer,
    /// Across a sequence: values are distributed over its elements.
    Slice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub index: usize,
    pub kind: StepKind,
}

/// Where a property name lands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub steps: Vec<Step>,
    /// Saved unindexed by default.
    pub no_index: bool,
    /// The path crosses a sequence.
    pub is_slice: bool,
    /// The target record has a custom loader: dotted names below it are
    /// regrouped into one entity.
    pub opaque: bool,
}

/// A top-level field after tag parsing.
#[derive(Clone, Debug)]
pub struct ResolvedField {
    /// Effective property name.
    pub name: String,
    pub options: FieldOptions,
    /// Embedded and flattened into the parent namespace.
    pub promoted: bool,
    pub shape: Shape,
}

/// The resolved naming of one record type.
#[derive(Debug)]
pub struct FieldMap {
    type_name: &'static str,
    fields: Vec<ResolvedField>,
    targets: HashMap<String, Target>,
    key_field: Option<usize>,
    capabilities: Capabilities,
}

impl FieldMap {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// All accepted property names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Index of the `__key__` field.
    pub fn key_field(&self) -> Option<usize> {
        self.key_field
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// For a name with no direct target: the longest prefix that addresses
    /// an opaque field, and the remainder.
    pub(crate) fn opaque_prefix<'n>(&self, name: &'n str) -> Option<(&'n str, &'n str)> {
        let mut end = name.len();
        while let Some(dot) = name[..end].rfind('.') {
            let prefix = &name[..dot];
            if self.targets.get(prefix).is_some_and(|t| t.opaque) {
                return Some((prefix, &name[dot + 1..]));
            }
            end = dot;
        }
        None
    }
}

struct Scope {
    prefix: String,
    steps: Vec<Step>,
    crossed_slice: bool,
    no_index: bool,
    top: bool,
}

struct Resolver {
    type_name: &'static str,
    targets: HashMap<String, Target>,
    key_field: Option<usize>,
    stack: Vec<TypeId>,
}

pub(crate) fn resolve(
    type_name: &'static str,
    type_id: TypeId,
    infos: &[FieldInfo],
    capabilities: Capabilities,
) -> Result<FieldMap, StructuralError> {
    let mut resolver = Resolver {
        type_name,
        targets: HashMap::new(),
        key_field: None,
        stack: vec![type_id],
    };
    let scope = Scope {
        prefix: String::new(),
        steps: Vec::new(),
        crossed_slice: false,
        no_index: false,
        top: true,
    };
    let fields = resolver.walk(infos, &scope)?;
    Ok(FieldMap {
        type_name,
        fields,
        targets: resolver.targets,
        key_field: resolver.key_field,
        capabilities,
    })
}

impl Resolver {
    fn error(&self, message: impl Into<String>) -> StructuralError {
        StructuralError::new(self.type_name, message)
    }

    fn walk(
        &mut self,
        infos: &[FieldInfo],
        scope: &Scope,
    ) -> Result<Vec<ResolvedField>, StructuralError> {
        let mut resolved = Vec::with_capacity(infos.len());
        for (index, info) in infos.iter().enumerate() {
            let options = parse_tag(info.tag)
                .map_err(|message| self.error(format!("field {:?}: {}", info.name, message)))?;
            let promoted = info.embedded && !options.skip && !options.key && self.promotable(info)?;
            let name = options
                .name
                .clone()
                .unwrap_or_else(|| info.name.to_string());
            resolved.push(ResolvedField {
                name: name.clone(),
                options: options.clone(),
                promoted,
                shape: info.shape.clone(),
            });

            if options.skip {
                continue;
            }
            if options.key {
                if scope.top {
                    self.set_key_field(index, info)?;
                }
                continue;
            }
            if info.shape.is_nested_slice() {
                return Err(self.error(format!(
                    "field {:?}: sequences of sequences are not supported",
                    info.name
                )));
            }
            if options.flatten && info.shape.element_record().is_none() {
                return Err(self.error(format!(
                    "field {:?}: flatten requires a record field",
                    info.name
                )));
            }

            let mut steps = scope.steps.clone();
            steps.push(Step {
                index,
                kind: step_kind(&info.shape),
            });
            let no_index = scope.no_index || options.no_index;
            let crossed_slice = scope.crossed_slice || info.shape.is_slice();

            if promoted {
                if let Some(record) = info.shape.record() {
                    let inner = Scope {
                        prefix: scope.prefix.clone(),
                        steps,
                        crossed_slice,
                        no_index,
                        top: false,
                    };
                    self.stack.push(record.type_id());
                    self.walk(&record.fields(), &inner)?;
                    self.stack.pop();
                }
                continue;
            }

            let full_name = format!("{}{}", scope.prefix, name);
            let element = info.shape.element_record();
            let opaque = element.is_some_and(|record| record.capabilities().load);
            self.insert(
                &full_name,
                Target {
                    steps: steps.clone(),
                    no_index,
                    is_slice: crossed_slice,
                    opaque,
                },
            )?;

            if let Some(record) = element {
                let second_slice = scope.crossed_slice && info.shape.is_slice();
                if opaque || second_slice || self.stack.contains(&record.type_id()) {
                    continue;
                }
                let inner = Scope {
                    prefix: format!("{}.", full_name),
                    steps,
                    crossed_slice,
                    no_index,
                    top: false,
                };
                self.stack.push(record.type_id());
                self.walk(&record.fields(), &inner)?;
                self.stack.pop();
            }
        }
        Ok(resolved)
    }

    /// Whether an embedded field is promoted, or addressed by its own name.
    fn promotable(&self, info: &FieldInfo) -> Result<bool, StructuralError> {
        let record = info.shape.record().ok_or_else(|| {
            self.error(format!(
                "embedded field {:?} must be a record or an optional record",
                info.name
            ))
        })?;
        if record.capabilities().is_opaque() {
            return Ok(false);
        }
        if self.stack.contains(&record.type_id()) {
            return Err(self.error(format!(
                "embedded field {:?}: recursive embedding of {}",
                info.name,
                record.name()
            )));
        }
        Ok(true)
    }

    fn set_key_field(&mut self, index: usize, info: &FieldInfo) -> Result<(), StructuralError> {
        if !info.shape.is_key() {
            return Err(self.error(format!(
                "key field {:?} must be a Key or Option<Key>, not {}",
                info.name, info.shape
            )));
        }
        if self.key_field.is_some() {
            return Err(self.error("multiple key fields"));
        }
        self.key_field = Some(index);
        Ok(())
    }

    fn insert(&mut self, name: &str, target: Target) -> Result<(), StructuralError> {
        if self.targets.contains_key(name) {
            return Err(self.error(format!("duplicate property name {:?}", name)));
        }
        self.targets.insert(name.to_string(), target);
        Ok(())
    }
}

fn step_kind(shape: &Shape) -> StepKind {
    match shape {
        Shape::Slice(_) => StepKind::Slice,
        Shape::Optional(_) => StepKind::Pointer,
        _ => StepKind::Direct,
    }
}
