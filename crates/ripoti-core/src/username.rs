//! Username derivation.
//!
//! Users never choose a username. It is the given name and the family name
//! run together, lowercased, and restricted to ASCII word characters. When
//! that base is taken, the store tries `base2`, `base3`, … until one is free.

/// The base username for `jina` + `ukoo`, or `None` if nothing usable is
/// left after filtering.
pub fn base_username(jina: &str, ukoo: &str) -> Option<String> {
  let base: String = jina
    .chars()
    .chain(ukoo.chars())
    .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
    .map(|c| c.to_ascii_lowercase())
    .collect();

  (!base.is_empty()).then_some(base)
}

/// The `n`th candidate for `base`: the bare base first, then numbered from 2.
pub fn candidate(base: &str, n: u32) -> String {
  if n <= 1 { base.to_owned() } else { format!("{base}{n}") }
}
