//! Identity key construction from fully-qualified container chains.
//!
//! Keys are plain strings so they can be compared, hashed and serialized
//! without reference to the module that produced them:
//!
//! - type: `Ns.Outer.Name`, generic arity as a backtick suffix (`List`1`)
//! - member: `<type key>.<local signature>`, e.g. `Ns.T.Add(System.Int32,System.String@)`
//! - parameter: `<member key>#<name>`

/// Trait for facts that know their namespace and enclosing type chain.
pub trait QualifiedPathBuilder {
    /// Dotted namespace, empty for the global namespace.
    fn namespace(&self) -> &str;

    /// Enclosing type chain, outermost first, each entry in key form.
    fn containers(&self) -> &[String];

    /// Key of the innermost enclosing type, if any.
    fn container_key(&self) -> Option<String> {
        let (last, outer) = self.containers().split_last()?;
        Some(type_key(self.namespace(), outer, last))
    }

    /// Key of a type named `name` inside this path.
    fn build_type_key(&self, name: &str) -> String {
        type_key(self.namespace(), self.containers(), name)
    }
}

/// Builds a type key from its namespace, enclosing types and own name.
pub fn type_key(namespace: &str, containers: &[String], name: &str) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(containers.len() + 2);
    if !namespace.is_empty() {
        parts.push(namespace);
    }
    parts.extend(containers.iter().map(String::as_str));
    parts.push(name);
    parts.join(".")
}

/// Appends the generic arity suffix to a type or method name.
///
/// Names already carrying a suffix are returned unchanged.
pub fn name_with_arity(name: &str, arity: usize, marker: &str) -> String {
    if arity == 0 || name.contains('`') {
        name.to_string()
    } else {
        format!("{}{}{}", name, marker, arity)
    }
}

/// Builds the owner-independent part of a member key.
///
/// `params` is `None` for members without a parameter list (fields, events,
/// non-indexed properties). Each parameter is `(type name, is by-reference)`.
pub fn member_local_key<'a>(
    name: &str,
    generic_arity: usize,
    params: Option<impl IntoIterator<Item = (&'a str, bool)>>,
) -> String {
    let mut local = name_with_arity(name, generic_arity, "``");
    if let Some(params) = params {
        let list: Vec<String> = params
            .into_iter()
            .map(|(ty, by_ref)| if by_ref { format!("{}@", ty) } else { ty.to_string() })
            .collect();
        local.push('(');
        local.push_str(&list.join(","));
        local.push(')');
    }
    local
}

/// Joins a type key and a local member signature.
pub fn member_key(type_key: &str, local: &str) -> String {
    format!("{}.{}", type_key, local)
}

/// Builds a parameter key.
pub fn parameter_key(member_key: &str, name: &str) -> String {
    format!("{}#{}", member_key, name)
}

/// Recovers the local signature of a member key given its owning type key.
pub fn local_part<'a>(member_key: &'a str, type_key: &str) -> &'a str {
    member_key
        .strip_prefix(type_key)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(member_key)
}

/// Derives a type's short name (with enclosing types) from its key and namespace.
pub fn type_name_from_key<'a>(key: &'a str, namespace: &str) -> &'a str {
    if namespace.is_empty() {
        return key;
    }
    key.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(key)
}

/// Normalizes a cross-reference target (`T:Ns.Type`) into a bare key.
pub fn normalize_cref(cref: &str) -> String {
    let trimmed = cref.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() > 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        trimmed[2..].to_string()
    } else {
        trimmed.to_string()
    }
}
