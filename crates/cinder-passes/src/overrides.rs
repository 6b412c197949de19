//! `-s name=value` config-var overrides.
//!
//! Overrides are checked at compile time against the program's config vars
//! and become the variables' initializers. Enum values go through the same
//! exact, first-match name comparison as the generated string-to-enum
//! routine.

use cinder_ast::{NodeIndex, NodeKind};
use cinder_common::diagnostics::{format_message, messages};
use cinder_common::{Diagnostic, InternalResult, Span, SymbolId, TypeId};
use cinder_types::{PrimitiveKind, TypeKind};
use tracing::debug;

use crate::error::DiagnosticSink;
use crate::program::Program;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOverride {
    pub name: String,
    pub value: String,
}

/// Parse `name=value`. A missing or empty value means `true`.
pub fn parse_override(text: &str) -> ConfigOverride {
    let (name, value) = match text.split_once('=') {
        Some((name, value)) => (name, value),
        None => (text, ""),
    };
    let value = if value.is_empty() { "true" } else { value };
    ConfigOverride {
        name: name.trim().to_string(),
        value: value.to_string(),
    }
}

/// Install every override from the program options, reporting unknown names
/// and invalid values to `sink`.
pub(crate) fn apply_overrides(program: &mut Program, sink: &mut DiagnosticSink) -> InternalResult<()> {
    if program.options.config_overrides.is_empty() {
        return Ok(());
    }
    let config_vars: Vec<SymbolId> = program
        .globals()?
        .into_iter()
        .map(|(_, var)| var)
        .filter(|&var| program.u.symbols.get(var).is_some_and(|s| s.is_config()))
        .collect();
    let overrides: Vec<(String, String)> = program
        .options
        .config_overrides
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for (name, value) in overrides {
        let Some(var) = config_vars
            .iter()
            .copied()
            .find(|&v| program.u.symbols.name(v) == name)
        else {
            sink.push(Diagnostic::error(
                Span::SYNTHETIC,
                format_message(messages::UNRECOGNIZED_CONFIG_PARAM, &[&name]),
            ));
            continue;
        };
        let Some(symbol) = program.u.symbols.get(var) else {
            continue;
        };
        let (span, def) = (symbol.span, symbol.def);
        let Some(ty) = symbol.ty else {
            // Untyped config vars take the type of the override's literal.
            let init = literal_for(program, None, &value, span)?;
            if let Some(init) = init {
                program.u.nodes.set_def_init(def, init)?;
            }
            continue;
        };
        match literal_for(program, Some(ty), &value, span)? {
            Some(init) => {
                program.u.nodes.set_def_init(def, init)?;
                debug!(var = %name, value = %value, "applied config override");
            }
            None => {
                let module = program
                    .declaring_module(var)
                    .map_or("", |m| program.u.symbols.name(m));
                sink.push(Diagnostic::error(
                    span,
                    format_message(
                        messages::INVALID_CONFIG_VALUE,
                        &[&value, &name, module, program.u.type_name(ty)],
                    ),
                ))
            }
        }
    }
    Ok(())
}

/// A detached initializer node for `value` as a `ty`, or `None` when the
/// text is not a valid value of that type.
fn literal_for(
    program: &mut Program,
    ty: Option<TypeId>,
    value: &str,
    span: Span,
) -> InternalResult<Option<NodeIndex>> {
    let u = &mut program.u;
    let Some(ty) = ty else {
        let mut b = u.nodes.builder(span);
        return Ok(Some(match (value, value.parse::<i64>()) {
            ("true", _) => b.boolean(true)?,
            ("false", _) => b.boolean(false)?,
            (_, Ok(n)) => b.int(n)?,
            (_, Err(_)) => b.str(value)?,
        }));
    };
    let kind = u.types.ty(ty)?.kind.clone();
    let node = match kind {
        TypeKind::Enum(_) => {
            let constant = u
                .enum_constants(ty)?
                .into_iter()
                .find(|&c| u.symbols.name(c) == value);
            match constant {
                Some(c) => Some(u.nodes.add(NodeKind::SymRef(c), span)?),
                None => None,
            }
        }
        TypeKind::Primitive(PrimitiveKind::Bool) => match value {
            "true" => Some(u.nodes.builder(span).boolean(true)?),
            "false" => Some(u.nodes.builder(span).boolean(false)?),
            _ => None,
        },
        TypeKind::Primitive(PrimitiveKind::Int(_) | PrimitiveKind::UInt(_)) => match value.parse::<i64>() {
            Ok(n) => Some(u.nodes.builder(span).int(n)?),
            Err(_) => None,
        },
        TypeKind::Primitive(PrimitiveKind::String) => Some(u.nodes.builder(span).str(value)?),
        _ => None,
    };
    Ok(node)
}
