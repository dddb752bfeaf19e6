//! Type inspection helpers for code generation
//!
//! The derive needs two facts about a field type: whether it is `Option<T>`
//! (and what `T` is), and a readable string form for the metadata table.

use syn::{GenericArgument, PathArguments, Type};

/// Extract the inner type from `Option<T>`
///
/// Returns `None` if the type is not `Option<T>`.
pub fn extract_option_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Option" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(inner_type)) = args.args.first() {
                        return Some(inner_type);
                    }
                }
            }
        }
    }
    None
}

/// Convert a Rust type to its string representation
///
/// Handles simple types (`i32`), paths (`chrono::DateTime<Utc>` keeps every
/// segment) and generic arguments (`Option<String>`). Lifetimes and const
/// generics are dropped.
pub fn type_to_string(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => {
            let segments: Vec<String> = type_path
                .path
                .segments
                .iter()
                .map(|seg| {
                    let mut result = seg.ident.to_string();
                    if let PathArguments::AngleBracketed(args) = &seg.arguments {
                        let generic_args: Vec<String> = args
                            .args
                            .iter()
                            .filter_map(|arg| match arg {
                                GenericArgument::Type(inner_ty) => Some(type_to_string(inner_ty)),
                                _ => None,
                            })
                            .collect();
                        if !generic_args.is_empty() {
                            result.push('<');
                            result.push_str(&generic_args.join(", "));
                            result.push('>');
                        }
                    }
                    result
                })
                .collect();
            segments.join("::")
        }
        Type::Tuple(tuple) => {
            let elems: Vec<String> = tuple.elems.iter().map(type_to_string).collect();
            format!("({})", elems.join(", "))
        }
        Type::Array(_) => "array".to_string(),
        Type::Slice(_) => "slice".to_string(),
        Type::Reference(_) => "reference".to_string(),
        _ => "unknown".to_string(),
    }
}
