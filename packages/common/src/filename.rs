/// Result of validating a declared upload filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is a bare `..`.
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
    /// Nothing usable was left after stripping unsafe characters.
    EmptyAfterSanitizing,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "No file selected or filename missing",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::EmptyAfterSanitizing => "Invalid filename (became empty after sanitizing)",
        }
    }
}

/// Reduces a client-supplied filename to a safe flat name.
///
/// Names carrying directory components are rejected outright rather than
/// flattened. Whitespace runs become `_`, every character outside
/// `[A-Za-z0-9._-]` is dropped, and leading/trailing `.`/`_` are trimmed so the
/// result can never be hidden or empty-stemmed.
pub fn sanitize_filename(filename: &str) -> Result<String, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Reject ASCII control characters to prevent
    // HTTP header injection (e.g. CRLF in Content-Disposition).
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    let joined = trimmed.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = kept.trim_matches(|c| c == '.' || c == '_');

    if cleaned.is_empty() {
        return Err(FilenameError::EmptyAfterSanitizing);
    }

    Ok(cleaned.to_string())
}

/// Lowercased extension of a filename including the leading dot (`.xml`).
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// Checks if a path string contains path traversal patterns.
pub fn contains_path_traversal(path: &str) -> bool {
    path == ".."
        || path.starts_with("../")
        || path.contains("/../")
        || path.ends_with("/..")
        || path.starts_with("..\\")
        || path.contains("\\..\\")
        || path.ends_with("\\..")
}

/// Validates a relative path below the upload root, as used by downloads and
/// by per-slot attachment destinations.
pub fn validate_relative_path(path: &str) -> Result<String, &'static str> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err("Path cannot be empty");
    }

    if trimmed.len() > 512 {
        return Err("Path exceeds maximum length of 512 characters");
    }

    if trimmed.contains('\0') {
        return Err("Path must not contain null bytes");
    }

    if trimmed.contains('\\') {
        return Err("Path must not contain backslashes");
    }

    if trimmed.starts_with('/') {
        return Err("Path must not start with '/'");
    }

    if contains_path_traversal(trimmed) {
        return Err("Path must not contain '..' traversal");
    }

    for segment in trimmed.split('/') {
        if segment.is_empty() {
            return Err("Path must not contain empty segments");
        }
        if segment == "." || segment == ".." {
            return Err("Path must not contain '.' or '..' segments");
        }
        if segment.starts_with('.') {
            return Err("Path segments must not start with '.'");
        }
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return Err("Path contains invalid characters (allowed: a-zA-Z0-9, /, -, _, .)");
    }

    Ok(trimmed.to_string())
}
