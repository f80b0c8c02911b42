const MAX_HOSTNAME_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 63;

/// Hostname syntax check used to gate the caller-declared `server` value.
///
/// At most 255 characters; every `.`-separated label is 1..=63 ASCII
/// alphanumerics or `-` and neither starts nor ends with `-`.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.chars().count() > MAX_HOSTNAME_LEN {
        return false;
    }
    hostname.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
