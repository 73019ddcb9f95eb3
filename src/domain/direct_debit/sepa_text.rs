//! Free text restricted to the SEPA Latin character set.

/// Maximum lengths from the `pain.008.001.02` schema.
pub const MAX_NAME_LENGTH: usize = 70;
pub const MAX_ID_LENGTH: usize = 35;
pub const MAX_REMITTANCE_LENGTH: usize = 140;

fn is_sepa_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '?' | ':' | '(' | ')' | '.' | ',' | '\'' | '+' | ' ')
}

fn transliterate(c: char) -> Option<&'static str> {
  let s = match c {
    'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
    'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
    'ç' => "c",
    'Ç' => "C",
    'è' | 'é' | 'ê' | 'ë' => "e",
    'È' | 'É' | 'Ê' | 'Ë' => "E",
    'ì' | 'í' | 'î' | 'ï' => "i",
    'Ì' | 'Í' | 'Î' | 'Ï' => "I",
    'ñ' => "n",
    'Ñ' => "N",
    'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
    'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "O",
    'ù' | 'ú' | 'û' | 'ü' => "u",
    'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
    'ý' | 'ÿ' => "y",
    'Ý' | 'Ÿ' => "Y",
    'æ' => "ae",
    'Æ' => "AE",
    'œ' => "oe",
    'Œ' => "OE",
    'ß' => "ss",
    '&' => "+",
    '’' | '‘' => "'",
    '_' | '–' | '—' => "-",
    _ => return None,
  };
  Some(s)
}

/// Replaces characters banks reject, collapses whitespace and truncates to
/// `max_len` characters.
pub fn sanitize(text: &str, max_len: usize) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if is_sepa_char(c) {
      out.push(c);
    } else if let Some(replacement) = transliterate(c) {
      out.push_str(replacement);
    } else {
      out.push(' ');
    }
  }

  let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
  collapsed.chars().take(max_len).collect::<String>().trim_end().to_string()
}

/// Identifier variant: no spaces allowed.
pub fn sanitize_id(text: &str) -> String {
  sanitize(text, usize::MAX)
    .replace(' ', "-")
    .chars()
    .take(MAX_ID_LENGTH)
    .collect()
}
