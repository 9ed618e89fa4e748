// names.rs — Naming transforms shared by the generators
//
// Model entities carry human-readable spaced names ("Line Monitoring");
// targets want canonical tokens. Hyphens collapse to underscores before
// camel-casing so "Read Param - Meta" style names stay one token.

/// "Group Name" → "GroupName". First letter of each word upper-cased, the
/// rest kept as authored.
pub fn spaced_to_upper_camel(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// "Parameter A" → "parameterA". Field and variable spelling.
pub fn camel(name: &str) -> String {
    let upper = spaced_to_upper_camel(name);
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => upper,
    }
}

/// Symbol-file token spelling: hyphens become underscores, then upper camel.
pub fn dehumanize(name: &str) -> String {
    spaced_to_upper_camel(&name.replace('-', "_"))
}
