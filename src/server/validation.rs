use crate::server::response::ApiError;

const MAX_USERNAME_LEN: usize = 64;
const MAX_SPACE_NAME_LEN: usize = 63;
const MAX_CODEBASE_URL_LEN: usize = 2048;
const MAX_STACK_ID_LEN: usize = 255;
const MAX_CODEBASE_KIND_LEN: usize = 32;

const URL_SCHEMES: &[&str] = &["http", "https", "git", "ssh"];

fn validate_name(
    name: &str,
    entity: &str,
    max_len: usize,
    allow_space: bool,
) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{entity} name cannot be empty"));
    }
    if name.len() > max_len {
        return Err(format!("{entity} name cannot exceed {max_len} characters"));
    }
    let valid_char =
        |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || (allow_space && c == ' ');
    if !name.chars().all(valid_char) {
        let mut allowed = "alphanumeric characters, hyphens, and underscores".to_string();
        if allow_space {
            allowed.push_str(", and spaces");
        }
        return Err(format!("{entity} name can only contain {allowed}"));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(format!("{entity} name must start with a letter or digit"));
    }
    Ok(())
}

pub fn validate_username(name: &str) -> Result<(), ApiError> {
    validate_name(name, "Identity", MAX_USERNAME_LEN, false).map_err(ApiError::bad_request)
}

pub fn validate_space_name(name: &str) -> Result<(), ApiError> {
    validate_name(name, "Space", MAX_SPACE_NAME_LEN, true).map_err(ApiError::bad_request)
}

/// Checks a repository location. Accepts `scheme://host/...` for the
/// supported schemes and scp-like `user@host:path`. Returns the trimmed URL.
pub fn validate_codebase_url(url: &str) -> Result<String, ApiError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ApiError::bad_request("Codebase url is required"));
    }
    if url.len() > MAX_CODEBASE_URL_LEN {
        return Err(ApiError::bad_request(format!(
            "Codebase url cannot exceed {MAX_CODEBASE_URL_LEN} characters"
        )));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(ApiError::bad_request("Codebase url cannot contain whitespace"));
    }

    let well_formed = match url.split_once("://") {
        Some((scheme, rest)) => {
            URL_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
                && rest.split('/').next().is_some_and(|host| !host.is_empty())
        }
        None => is_scp_like(url),
    };

    if !well_formed {
        return Err(ApiError::bad_request(
            "Codebase url must be an http(s), git or ssh URL, or user@host:path",
        ));
    }

    Ok(url.to_string())
}

fn is_scp_like(url: &str) -> bool {
    let Some((user_host, path)) = url.split_once(':') else {
        return false;
    };
    let Some((user, host)) = user_host.split_once('@') else {
        return false;
    };
    !user.is_empty() && !host.is_empty() && !path.is_empty()
}

pub fn validate_stack_id(stack_id: &str) -> Result<(), ApiError> {
    if stack_id.trim().is_empty() {
        return Err(ApiError::bad_request("stackId cannot be empty when provided"));
    }
    if stack_id.len() > MAX_STACK_ID_LEN {
        return Err(ApiError::bad_request(format!(
            "stackId cannot exceed {MAX_STACK_ID_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_codebase_kind(kind: &str) -> Result<(), ApiError> {
    if kind.is_empty()
        || kind.len() > MAX_CODEBASE_KIND_LEN
        || !kind
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(ApiError::bad_request(
            "Codebase type must be lowercase alphanumeric, at most 32 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codebase_urls() {
        for ok in [
            "https://github.com/fabric8-services/fabric8-wit.git",
            "http://example.com/repo",
            "git://example.com/repo.git",
            "ssh://git@example.com/repo.git",
            "git@github.com:fabric8io/fabric8-planner.git",
            "  https://github.com/trim/me.git  ",
        ] {
            assert!(validate_codebase_url(ok).is_ok(), "{ok}");
        }

        for bad in [
            "",
            "   ",
            "ftp://example.com/repo",
            "https:///nohost",
            "https://github.com/with space.git",
            "just-a-name",
            "@host:path",
        ] {
            assert!(validate_codebase_url(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_codebase_url_is_trimmed() {
        let url = validate_codebase_url(" https://github.com/a/b.git ").unwrap();
        assert_eq!(url, "https://github.com/a/b.git");
    }

    #[test]
    fn test_space_names() {
        assert!(validate_space_name("TestSpaceCodebase 1").is_ok());
        assert!(validate_space_name(" leading").is_err());
        assert!(validate_space_name("-dash").is_err());
        assert!(validate_space_name(&"x".repeat(64)).is_err());
    }

    #[test]
    fn test_usernames() {
        assert!(validate_username("dev-1").is_ok());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username("first.last").is_err());
        assert!(validate_username("jürgen").is_err());
        assert!(validate_username(&"a".repeat(64)).is_ok());
        assert!(validate_username(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_kind_and_stack() {
        assert!(validate_codebase_kind("git").is_ok());
        assert!(validate_codebase_kind("Git").is_err());
        assert!(validate_stack_id("java-centos").is_ok());
        assert!(validate_stack_id(" ").is_err());
    }
}
