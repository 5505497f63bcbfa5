/// Coerce a textual CSV flag into a boolean.
///
/// Only the exact literal `"False"` is false. Everything else, including
/// `"True"`, `"false"`, an empty cell, or a missing column, is true.
pub fn coerce_flag(raw: Option<&str>) -> bool {
    raw != Some("False")
}
