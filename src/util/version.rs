pub const APP_NAME: &str = "UEX Trader";
pub const APP_AUTHOR: &str = "SetScallywag";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

/// Release tag when built from a tagged checkout, package version otherwise.
pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}

pub fn banner() -> String {
    format!("{APP_NAME} {} by {APP_AUTHOR}", version_label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_never_empty() {
        let label = version_label();
        assert!(!label.is_empty());
        assert!(banner().starts_with(APP_NAME));
    }
}
