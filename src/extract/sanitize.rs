/// Collapses every whitespace run (newlines and tabs included) into one space
///
/// Leading and trailing whitespace is removed.
pub fn sanitize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
