use super::entry::Entry;

/// Order entries so that carriers are substituted before everything else.
///
/// Stable partition: entries whose value contains placeholder syntax come first, and
/// relative order inside both groups is kept. Substituting a carrier first lets the
/// following single pass resolve one level of placeholders it introduced.
pub fn plan_entries(entries: Vec<Entry>) -> Vec<Entry> {
    let (mut ordered, rest): (Vec<Entry>, Vec<Entry>) = entries
        .into_iter()
        .partition(|entry| entry.has_nested_placeholder);
    ordered.extend(rest);
    ordered
}
