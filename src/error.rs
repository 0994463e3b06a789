pub type InkflowResult<T> = Result<T, InkflowError>;

#[derive(thiserror::Error, Debug)]
pub enum InkflowError {
    #[error("config error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("sequence error: {0}")]
    Sequence(String),

    #[error("export error: {0}")]
    Export(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InkflowError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn sequence(msg: impl Into<String>) -> Self {
        Self::Sequence(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            InkflowError::config("x")
                .to_string()
                .contains("config error:")
        );
        assert!(InkflowError::parse("x").to_string().contains("parse error:"));
        assert!(
            InkflowError::geometry("x")
                .to_string()
                .contains("geometry error:")
        );
        assert!(
            InkflowError::sequence("x")
                .to_string()
                .contains("sequence error:")
        );
        assert!(
            InkflowError::export("x")
                .to_string()
                .contains("export error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = InkflowError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
