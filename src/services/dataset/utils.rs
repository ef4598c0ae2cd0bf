use std::collections::HashSet;

const EMPTY_HEADER: &str = "__EMPTY";

/// Returns a unique column name for a raw header cell. Blank headers become
/// `__EMPTY`, repeats get a numeric suffix (`name_1`, `name_2`, ...).
pub fn unique_header_name(raw: &str, existing_names: &mut HashSet<String>) -> String {
    let trimmed = raw.trim();
    let base_name = if trimmed.is_empty() { EMPTY_HEADER } else { trimmed };

    let mut name = base_name.to_string();
    let mut counter = 1;
    while !existing_names.insert(name.clone()) {
        name = format!("{}_{}", base_name, counter);
        counter += 1;
    }

    name
}

/// Builds the header list for a row of raw header cells.
pub fn header_names<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut existing_names = HashSet::new();
    raw.into_iter()
        .map(|cell| unique_header_name(cell.as_ref(), &mut existing_names))
        .collect()
}

/// Strips a UTF-8 byte-order mark some spreadsheet tools prepend to CSVs.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}
