//! Path pattern matching

/// Match a path against a routing pattern
///
/// Patterns without `*` or `:` markers must match exactly. Matching is
/// segment-wise on `/` boundaries.
pub fn path_matches(pattern: &str, path: &str) -> bool {
    if !pattern.contains('*') && !pattern.contains(':') {
        return pattern == path;
    }
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    match_segments(&pattern_segments, &path_segments)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    let Some((head, rest_pattern)) = pattern.split_first() else {
        return path.is_empty();
    };

    if head.starts_with('*') {
        if rest_pattern.is_empty() {
            // Trailing wildcard: consumes the non-empty remainder
            return !path.is_empty() && !(path.len() == 1 && path[0].is_empty());
        }
        // Mid-pattern wildcard: consume one or more segments until the
        // remainder of the pattern matches
        return (1..=path.len()).any(|taken| match_segments(rest_pattern, &path[taken..]));
    }

    if head.starts_with(':') {
        return match path.split_first() {
            Some((segment, rest_path)) if !segment.is_empty() => {
                match_segments(rest_pattern, rest_path)
            }
            _ => false,
        };
    }

    match path.split_first() {
        Some((segment, rest_path)) if segment == head => match_segments(rest_pattern, rest_path),
        _ => false,
    }
}
