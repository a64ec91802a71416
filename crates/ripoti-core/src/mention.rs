//! `@username` mentions in comment text.
//!
//! A mention is `@` followed by one or more ASCII word characters. Usernames
//! are generated from the same character class, so every username can be
//! mentioned.

use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

static MENTION: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"@(\w+)").expect("mention pattern is valid"));

/// Every mentioned name, lowercased, without duplicates, in the order of first
/// appearance.
pub fn extract_mentions(text: &str) -> Vec<String> {
  let mut names: Vec<String> = Vec::new();
  for caps in MENTION.captures_iter(text) {
    let name = caps[1].to_lowercase();
    if !names.contains(&name) {
      names.push(name);
    }
  }
  names
}

/// Escape `text` for HTML and turn each `@name` into a link to that profile.
pub fn link_mentions(text: &str) -> String {
  let escaped = escape_html(text);
  MENTION
    .replace_all(&escaped, |caps: &Captures<'_>| {
      let name = &caps[1];
      format!("<a href=\"/user/{name}\" class=\"mention\">@{name}</a>")
    })
    .into_owned()
}

fn escape_html(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_names_in_order() {
    assert_eq!(
      extract_mentions("@juma na @Amina tafadhali angalieni"),
      vec!["juma", "amina"]
    );
  }

  #[test]
  fn deduplicates_case_insensitively() {
    assert_eq!(extract_mentions("@Juma @juma @JUMA"), vec!["juma"]);
  }

  #[test]
  fn stops_at_non_word_characters() {
    assert_eq!(extract_mentions("(@juma_2), @baraka!"), vec!["juma_2", "baraka"]);
  }

  #[test]
  fn bare_at_sign_is_not_a_mention() {
    assert!(extract_mentions("email me @ the clinic").is_empty());
    assert!(extract_mentions("").is_empty());
  }

  #[test]
  fn email_addresses_yield_the_domain_word() {
    // Same behaviour as the mention pattern applied to any text.
    assert_eq!(extract_mentions("juma@kliniki.org"), vec!["kliniki"]);
  }

  #[test]
  fn link_escapes_markup_before_linking() {
    assert_eq!(
      link_mentions("<b>@juma</b>"),
      "&lt;b&gt;<a href=\"/user/juma\" class=\"mention\">@juma</a>&lt;/b&gt;"
    );
  }

  #[test]
  fn link_leaves_plain_text_untouched() {
    assert_eq!(link_mentions("hakuna mtu"), "hakuna mtu");
  }
}
