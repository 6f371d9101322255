use syn::meta::ParseNestedMeta;
use syn::{Attribute, Field, Ident, LitStr, Path, Token};

use crate::RESOURCE_ATTRIBUTE_NAME;

/// Annotation kinds in the order of `ow_writer::info::AnnotationKind`.
pub(crate) const ANNOTATION_KINDS: [(&str, &str); 3] =
    [("count", "Count"), ("next_link", "NextLink"), ("etag", "ETag")];

/// One `count = path` or `count_writer = path` entry.
pub(crate) struct AnnotationAttr {
    pub kind: Ident,
    pub accessor: Path,
    pub is_writer: bool,
}

fn parse_annotation(meta: &ParseNestedMeta, out: &mut Vec<AnnotationAttr>) -> syn::Result<bool> {
    for (key, variant) in ANNOTATION_KINDS {
        let is_writer = if meta.path.is_ident(key) {
            false
        } else if meta.path.is_ident(&format!("{key}_writer")) {
            true
        } else {
            continue;
        };

        let kind = Ident::new(variant, meta.path.segments[0].ident.span());
        if out.iter().any(|attr| attr.kind == kind) {
            return Err(meta.error(format!("annotation `{key}` is declared twice")));
        }
        let accessor = meta.value()?.parse::<Path>()?;
        out.push(AnnotationAttr {
            kind,
            accessor,
            is_writer,
        });
        return Ok(true);
    }
    Ok(false)
}

fn parse_path_value(meta: &ParseNestedMeta, slot: &mut Option<Path>) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(meta.value()?.parse()?);
    Ok(())
}

fn parse_str_value(meta: &ParseNestedMeta, slot: &mut Option<LitStr>) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    let lit = meta.value()?.parse::<LitStr>()?;
    if lit.value().is_empty() {
        return Err(syn::Error::new(lit.span(), "name must not be empty"));
    }
    *slot = Some(lit);
    Ok(())
}

// -----------------------------------------------------------------------------
// Type attributes

#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub name: Option<LitStr>,
    pub annotations: Vec<AnnotationAttr>,
    pub before_serialize: Option<Path>,
    pub after_serialize: Option<Path>,
    pub auto_register: Option<proc_macro2::Span>,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs {
            if !attr.path().is_ident(RESOURCE_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if parse_annotation(&meta, &mut this.annotations)? {
                    Ok(())
                } else if meta.path.is_ident("name") {
                    parse_str_value(&meta, &mut this.name)
                } else if meta.path.is_ident("before_serialize") {
                    parse_path_value(&meta, &mut this.before_serialize)
                } else if meta.path.is_ident("after_serialize") {
                    parse_path_value(&meta, &mut this.after_serialize)
                } else if meta.path.is_ident("auto_register") {
                    this.auto_register = Some(meta.path.segments[0].ident.span());
                    Ok(())
                } else {
                    Err(meta.error("unsupported resource attribute"))
                }
            })?;
        }
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// Field attributes

/// What a field contributes to the resource.
pub(crate) enum FieldRole {
    Property,
    Skipped,
    DynamicProperties,
    CustomAnnotations,
}

pub(crate) enum SkipCondition {
    Never,
    If(Path),
    Default,
}

pub(crate) enum Position {
    Auto,
    Pre,
    Post,
}

pub(crate) struct FieldAttributes {
    pub role: FieldRole,
    pub rename: Option<LitStr>,
    pub skip: SkipCondition,
    pub position: Position,
    pub annotations: Vec<AnnotationAttr>,
}

impl FieldAttributes {
    pub fn parse_field(field: &Field) -> syn::Result<Self> {
        let mut this = Self {
            role: FieldRole::Property,
            rename: None,
            skip: SkipCondition::Never,
            position: Position::Auto,
            annotations: Vec::new(),
        };

        for attr in &field.attrs {
            if !attr.path().is_ident(RESOURCE_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if parse_annotation(&meta, &mut this.annotations)? {
                    return Ok(());
                }
                if meta.path.is_ident("rename") {
                    parse_str_value(&meta, &mut this.rename)
                } else if meta.path.is_ident("skip") {
                    this.set_role(&meta, FieldRole::Skipped)
                } else if meta.path.is_ident("dynamic") {
                    this.set_role(&meta, FieldRole::DynamicProperties)
                } else if meta.path.is_ident("annotations") {
                    this.set_role(&meta, FieldRole::CustomAnnotations)
                } else if meta.path.is_ident("skip_if") {
                    this.skip = SkipCondition::If(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("skip_if_default") {
                    this.skip = SkipCondition::Default;
                    Ok(())
                } else if meta.path.is_ident("position") {
                    let lit = meta.value()?.parse::<LitStr>()?;
                    this.position = match lit.value().as_str() {
                        "pre" => Position::Pre,
                        "post" => Position::Post,
                        _ => return Err(syn::Error::new(lit.span(), "expected \"pre\" or \"post\"")),
                    };
                    Ok(())
                } else {
                    Err(meta.error("unsupported resource attribute"))
                }
            })?;
        }

        if !matches!(this.role, FieldRole::Property)
            && (this.rename.is_some() || !this.annotations.is_empty())
        {
            return Err(syn::Error::new_spanned(
                field,
                "`skip`, `dynamic` and `annotations` fields are not properties",
            ));
        }
        Ok(this)
    }

    fn set_role(&mut self, meta: &ParseNestedMeta, role: FieldRole) -> syn::Result<()> {
        if !matches!(self.role, FieldRole::Property) {
            return Err(meta.error("a field can only have one of `skip`, `dynamic`, `annotations`"));
        }
        if meta.input.peek(Token![=]) {
            return Err(meta.error("expected a flag without value"));
        }
        self.role = role;
        Ok(())
    }
}
