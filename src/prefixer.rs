use crate::normalize::{basename, strip_prefix_ignore_case};
use crate::types::File;

/// Compute the name `file` should carry inside the folder named `folder_name`.
///
/// The canonical form is `<folder basename>_<rest>`. A leading folder name
/// separated by a space, a hyphen or nothing at all is rewritten to use `_`;
/// otherwise the folder name is prepended. Names that already carry the
/// prefix are returned untouched, which makes the function idempotent.
pub fn compute_canonical_name(file: &File, folder_name: &str) -> String {
    let file_base = basename(&file.name);
    let folder_base = basename(folder_name);

    if strip_prefix_ignore_case(file_base, &format!("{folder_base}_")).is_some() {
        return file.name.clone();
    }

    // Separated forms first, otherwise "Taxes 2023" would become "Taxes_ 2023"
    let separated = [format!("{folder_base} "), format!("{folder_base}-")];
    let leading = separated
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(folder_base));

    for pattern in leading {
        if let Some(rest) = strip_prefix_ignore_case(file_base, pattern) {
            return format!("{folder_base}_{rest}");
        }
    }

    format!("{folder_base}_{file_base}")
}
