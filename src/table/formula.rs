// Filter formulas are evaluated by the remote service, so every literal
// spliced into one has to be escaped here.

/// Doubles single quotes so a value can sit inside a `'...'` formula literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// `{field} = 'value'`
pub fn field_equals(field: &str, value: &str) -> String {
    format!("{{{}}} = '{}'", field, escape_literal(value))
}
