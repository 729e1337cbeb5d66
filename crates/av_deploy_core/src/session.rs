pub const SESSION_NAME_PREFIX: &str = "deploy";
pub const MAX_SESSION_NAME_LEN: usize = 64;

const REF_PREFIXES: [&str; 3] = ["refs/heads/", "refs/tags/", "refs/pull/"];

/// Strips the `refs/...` prefix from a git reference, leaving the branch or tag name.
pub fn branch_name(branch_ref: &str) -> &str {
    let trimmed = branch_ref.trim();
    REF_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed)
}

/// Builds a role session name from the branch reference.
///
/// STS accepts `[A-Za-z0-9+=,.@_-]{2,64}`; anything else becomes `-`.
pub fn role_session_name(branch_ref: &str) -> String {
    let branch = branch_name(branch_ref);
    if branch.is_empty() {
        return SESSION_NAME_PREFIX.to_string();
    }

    let sanitized: String = branch
        .chars()
        .map(|ch| if is_session_char(ch) { ch } else { '-' })
        .collect();

    let mut name = format!("{SESSION_NAME_PREFIX}-{sanitized}");
    // ascii only after sanitizing, so byte truncation is safe
    name.truncate(MAX_SESSION_NAME_LEN);
    name
}

fn is_session_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '+' | '=' | ',' | '.' | '@' | '_' | '-')
}
