pub type GlissadeResult<T> = Result<T, GlissadeError>;

#[derive(thiserror::Error, Debug)]
pub enum GlissadeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("animation error: {0}")]
    Animation(String),

    #[error("dependency error: {0}")]
    Dependency(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlissadeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        Self::Dependency(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_matching_variants() {
        assert!(matches!(
            GlissadeError::validation("bad extent"),
            GlissadeError::Validation(_)
        ));
        assert!(matches!(
            GlissadeError::animation("channel gone"),
            GlissadeError::Animation(_)
        ));
        assert!(matches!(
            GlissadeError::dependency("engine missing"),
            GlissadeError::Dependency(_)
        ));
        assert!(matches!(
            GlissadeError::serde("truncated script"),
            GlissadeError::Serde(_)
        ));
    }

    #[test]
    fn boot_failure_message_is_diagnosable() {
        // The shape the orchestrator emits for unusable engine tuning.
        let err = GlissadeError::dependency(
            "animation engines unavailable: validation error: Tps num must be > 0",
        );
        let msg = err.to_string();
        assert!(msg.starts_with("dependency error:"), "{msg}");
        assert!(msg.contains("Tps num"), "{msg}");
    }

    #[test]
    fn anyhow_flows_in_through_question_mark() {
        fn read_tuning(raw: &str) -> GlissadeResult<u64> {
            let n = raw
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!(e).context("parse tuning"))?;
            Ok(n)
        }
        assert_eq!(read_tuning("60").unwrap(), 60);
        let err = read_tuning("sixty").unwrap_err();
        assert!(matches!(err, GlissadeError::Other(_)));
        assert!(err.to_string().contains("parse tuning"));
    }
}
